mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn delivers_email() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(format!("{}/functions/v1/send-email", server.base_url))
        .bearer_auth(common::token_for(Uuid::new_v4()))
        .json(&json!({ "to": "rider@example.com", "subject": "Invitation", "html": "<p>Join us</p>" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["recipient"], "rider@example.com");
    assert!(body["messageId"].as_str().unwrap_or_default().starts_with("email_"));
    Ok(())
}

#[tokio::test]
async fn missing_subject_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(format!("{}/functions/v1/send-email", server.base_url))
        .bearer_auth(common::token_for(Uuid::new_v4()))
        .json(&json!({ "to": "rider@example.com", "body": "hello" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn forged_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let claims = moto_shop_portal::auth::Claims::new(Uuid::new_v4(), None);
    let forged = moto_shop_portal::auth::generate_jwt_with_secret(&claims, "some-other-secret")?;

    let res = reqwest::Client::new()
        .post(format!("{}/functions/v1/send-email", server.base_url))
        .bearer_auth(forged)
        .json(&json!({ "to": "rider@example.com", "subject": "x", "body": "y" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
