//! Notification relay functions.
//!
//! Both endpoints validate the request, log the delivery and answer with
//! `{success, messageId, recipient}`. No SMS or email provider is called.

pub mod send_email;
pub mod send_sms;
pub mod types;

use axum::{middleware, routing::post, Router};

pub use types::{DeliveryResponse, EmailRequest, SmsRequest};

pub const SEND_SMS_PATH: &str = "/functions/v1/send-sms";
pub const SEND_EMAIL_PATH: &str = "/functions/v1/send-email";

/// Function routes, guarded by the bearer token check when auth is required
pub fn router() -> Router {
    Router::new()
        .route(SEND_SMS_PATH, post(send_sms::send_sms))
        .route(SEND_EMAIL_PATH, post(send_email::send_email))
        .layer(middleware::from_fn(crate::middleware::jwt_auth_middleware))
}
