use axum::extract::rejection::JsonRejection;
use axum::Json;

use super::types::{DeliveryResponse, EmailRequest};
use crate::error::ApiError;

/// POST /functions/v1/send-email - simulated email delivery
pub async fn send_email(payload: Result<Json<EmailRequest>, JsonRejection>) -> Result<Json<DeliveryResponse>, ApiError> {
    let Json(request) = payload?;

    let recipient = request.to.trim();
    if recipient.is_empty() {
        return Err(ApiError::field("to", "is required"));
    }
    if !is_plausible_email(recipient) {
        return Err(ApiError::field("to", "is not a valid email address"));
    }
    if request.subject.trim().is_empty() {
        return Err(ApiError::field("subject", "is required"));
    }

    let has_body = |s: &Option<String>| s.as_deref().map(|b| !b.trim().is_empty()).unwrap_or(false);
    if !has_body(&request.body) && !has_body(&request.html) {
        return Err(ApiError::field("body", "body or html is required"));
    }

    let response = DeliveryResponse::delivered("email", recipient.to_ascii_lowercase());
    tracing::info!(
        message_id = %response.message_id,
        recipient = %response.recipient,
        "Simulated email delivery: {}",
        request.subject.trim()
    );

    Ok(Json(response))
}

fn is_plausible_email(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !address.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn email_shape_check() {
        assert!(is_plausible_email("rider@example.com"));
        assert!(!is_plausible_email("rider@localhost"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("a@b@example.com"));
        assert!(!is_plausible_email("ri der@example.com"));
    }

    async fn call(body: &str) -> (StatusCode, serde_json::Value) {
        let app = axum::Router::new().route("/", axum::routing::post(send_email));
        let response = app
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn delivers_valid_email() {
        let (status, body) = call(r#"{"to": "Rider@Example.com", "subject": "Ready", "body": "Pick up"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["recipient"], "rider@example.com");
        assert!(body["messageId"].as_str().unwrap().starts_with("email_"));
    }

    #[tokio::test]
    async fn malformed_json_is_structured_failure() {
        let (status, body) = call("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn missing_body_is_rejected() {
        let (status, body) = call(r#"{"to": "rider@example.com", "subject": "Ready"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
