mod common;

use anyhow::Result;
use moto_shop_portal::auth::Session;
use moto_shop_portal::functions::{EmailRequest, SmsRequest};
use moto_shop_portal::notify::{templates, NotificationClient};
use moto_shop_portal::models::Job;
use uuid::Uuid;

fn client(base_url: &str) -> NotificationClient {
    let token = common::token_for(Uuid::new_v4());
    let session = Session::from_token_with_secret(&token, common::JWT_SECRET).expect("valid token");
    NotificationClient::new(base_url).with_session(&session)
}

#[tokio::test]
async fn job_status_sms_is_delivered() -> Result<()> {
    let server = common::ensure_server().await?;
    let mut job = Job::new("SHOP-1", "Jo", "chain and sprockets");
    job.customer_phone = Some("+44 20 7946 0958".to_string());

    let sms = templates::job_status_sms(&job, "Redline Moto", "https://moto.example.com").expect("phone on file");
    let report = client(&server.base_url).send_sms(&sms).await;

    assert!(report.success, "{:?}", report);
    assert_eq!(report.recipient.as_deref(), Some("+442079460958"));
    Ok(())
}

#[tokio::test]
async fn rejected_notification_is_a_failure_report() -> Result<()> {
    let server = common::ensure_server().await?;
    let report = client(&server.base_url)
        .send_email(&EmailRequest { to: "nobody".into(), subject: "Hi".into(), body: Some("x".into()), html: None })
        .await;

    assert!(!report.success);
    assert!(report.error.unwrap_or_default().contains("to"));
    Ok(())
}

#[tokio::test]
async fn missing_token_is_a_failure_report() -> Result<()> {
    let server = common::ensure_server().await?;
    let report = NotificationClient::new(&server.base_url)
        .send_sms(&SmsRequest { to: "+15550102030".into(), message: "hi".into(), job_id: None })
        .await;

    assert!(!report.success);
    assert!(report.error.is_some());
    Ok(())
}
