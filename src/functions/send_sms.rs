use axum::extract::rejection::JsonRejection;
use axum::Json;

use super::types::{DeliveryResponse, SmsRequest};
use crate::error::ApiError;

const MAX_SMS_LENGTH: usize = 1600;

/// POST /functions/v1/send-sms - simulated SMS delivery
pub async fn send_sms(payload: Result<Json<SmsRequest>, JsonRejection>) -> Result<Json<DeliveryResponse>, ApiError> {
    let Json(request) = payload?;

    let recipient = normalize_phone(&request.to)?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::field("message", "is required"));
    }
    if message.chars().count() > MAX_SMS_LENGTH {
        return Err(ApiError::field("message", format!("must be at most {} characters", MAX_SMS_LENGTH)));
    }

    let response = DeliveryResponse::delivered("sms", recipient);
    tracing::info!(
        message_id = %response.message_id,
        recipient = %response.recipient,
        job_id = ?request.job_id,
        "Simulated SMS delivery: {}",
        message
    );

    Ok(Json(response))
}

/// Strip formatting from a phone number; keeps a leading `+`
pub fn normalize_phone(raw: &str) -> Result<String, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::field("to", "is required"));
    }

    let (plus, rest) = match raw.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", raw),
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(ApiError::field("to", "is not a valid phone number")),
        }
    }

    if !(7..=15).contains(&digits.len()) {
        return Err(ApiError::field("to", "is not a valid phone number"));
    }

    Ok(format!("{}{}", plus, digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_formatted_numbers() {
        assert_eq!(normalize_phone("+1 (555) 010-2030").unwrap(), "+15550102030");
        assert_eq!(normalize_phone(" 555.010.2030 ").unwrap(), "5550102030");
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(normalize_phone("").is_err());
        assert!(normalize_phone("call me").is_err());
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("+1234567890123456").is_err());
    }
}
