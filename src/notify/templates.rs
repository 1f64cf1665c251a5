use uuid::Uuid;

use super::links;
use crate::functions::{EmailRequest, SmsRequest};
use crate::models::{Job, JobStatus};

fn status_phrase(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "has been received",
        JobStatus::InProgress => "is being worked on",
        JobStatus::WaitingParts => "is waiting for parts",
        JobStatus::Completed => "is ready for pickup",
        JobStatus::Delivered => "has been delivered",
        JobStatus::Cancelled => "has been cancelled",
    }
}

/// SMS to the customer when their job changes status.
/// `None` when the job has no phone number on file.
pub fn job_status_sms(job: &Job, shop_name: &str, site_url: &str) -> Option<SmsRequest> {
    let to = job.customer_phone.as_deref()?.trim();
    if to.is_empty() {
        return None;
    }

    let mut message = format!(
        "Hi {}, your {} {} at {}.",
        job.customer_name,
        job.motorcycle,
        status_phrase(job.status),
        shop_name
    );
    match links::tracking_link(site_url, job.id) {
        Ok(link) => message.push_str(&format!(" Track it here: {}", link)),
        Err(e) => tracing::warn!("No tracking link for job {}: {}", job.id, e),
    }

    Some(SmsRequest {
        to: to.to_string(),
        message,
        job_id: Some(job.id),
    })
}

/// Invitation email for a mechanic joining a shop
pub fn shop_invitation_email(
    email: &str,
    shop_name: &str,
    invitation_code: &str,
    site_url: &str,
) -> Result<EmailRequest, url::ParseError> {
    let link = links::signup_link(site_url, invitation_code)?;
    Ok(EmailRequest {
        to: email.to_string(),
        subject: format!("You're invited to join {}", shop_name),
        body: Some(format!(
            "{} has invited you to their workshop portal.\n\nCreate your account: {}\n\nInvitation code: {}",
            shop_name, link, invitation_code
        )),
        html: None,
    })
}

/// Email to a ticket creator once support picks up their ticket
pub fn ticket_accepted_email(email: &str, ticket_id: Uuid, subject: &str, agent_name: &str) -> EmailRequest {
    EmailRequest {
        to: email.to_string(),
        subject: format!("Re: {}", subject),
        body: Some(format!(
            "{} is now handling your support ticket \"{}\" (ref {}).",
            agent_name, subject, ticket_id
        )),
        html: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Motorcycle;

    #[test]
    fn status_sms_includes_tracking_link() {
        let mut job = Job::new("SHOP-1", "Jo", "service");
        job.customer_phone = Some("+15550102030".to_string());
        job.status = JobStatus::Completed;
        job.motorcycle = Motorcycle { make: "Honda".into(), model: "CB500".into(), year: None };

        let sms = job_status_sms(&job, "Redline Moto", "https://moto.example.com").unwrap();
        assert_eq!(sms.job_id, Some(job.id));
        assert!(sms.message.contains("Honda CB500 is ready for pickup at Redline Moto"));
        assert!(sms.message.contains(&format!("https://moto.example.com/track/{}", job.id)));
    }

    #[test]
    fn no_sms_without_phone() {
        let job = Job::new("SHOP-1", "Jo", "service");
        assert!(job_status_sms(&job, "Shop", "https://moto.example.com").is_none());
    }

    #[test]
    fn invitation_email_carries_signup_link() {
        let email = shop_invitation_email("new@example.com", "Redline Moto", "INV-0000ABCD", "https://moto.example.com")
            .unwrap();
        assert!(email.body.unwrap().contains("https://moto.example.com/signup?invite=INV-0000ABCD"));
        assert!(shop_invitation_email("x@example.com", "S", "INV-1", "nope").is_err());
    }
}
