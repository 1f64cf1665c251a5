use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::auth::Session;
use crate::config;
use crate::functions::{EmailRequest, SmsRequest, SEND_EMAIL_PATH, SEND_SMS_PATH};

/// Outcome of a notification call. Failures are data, never errors:
/// notifications are best effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            recipient: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response ({status}): {source}")]
    UnexpectedResponse { status: u16, source: reqwest::Error },
}

/// HTTP client for the send-sms and send-email functions
#[derive(Debug, Clone)]
pub struct NotificationClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl NotificationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    /// Client for the configured functions base URL
    pub fn from_config() -> Self {
        Self::new(config::config().functions.base_url.clone())
    }

    pub fn with_session(mut self, session: &Session) -> Self {
        self.access_token = Some(session.access_token.clone());
        self
    }

    pub async fn send_sms(&self, request: &SmsRequest) -> DeliveryReport {
        self.post(SEND_SMS_PATH, request).await
    }

    pub async fn send_email(&self, request: &EmailRequest) -> DeliveryReport {
        self.post(SEND_EMAIL_PATH, request).await
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> DeliveryReport {
        match self.try_post(path, body).await {
            Ok(report) => {
                if !report.success {
                    tracing::warn!(
                        "Notification rejected by {}: {}",
                        path,
                        report.error.as_deref().unwrap_or("unknown error")
                    );
                }
                report
            }
            Err(e) => {
                tracing::warn!("Notification call to {} failed: {}", path, e);
                DeliveryReport::failed(e.to_string())
            }
        }
    }

    async fn try_post<T: Serialize>(&self, path: &str, body: &T) -> Result<DeliveryReport, NotifyError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        response
            .json::<DeliveryReport>()
            .await
            .map_err(|source| NotifyError::UnexpectedResponse { status: status.as_u16(), source })
    }
}
