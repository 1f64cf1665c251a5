use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Claims carried by the hosted auth's access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_token_role")]
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

fn default_token_role() -> String {
    "authenticated".to_string()
}

impl Claims {
    pub fn new(user_id: Uuid, email: Option<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email,
            role: default_token_role(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

/// The authenticated viewer, passed explicitly to every collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
}

impl Session {
    /// Validate an access token with the configured secret
    pub fn from_token(token: &str) -> Result<Self, SessionError> {
        Self::from_token_with_secret(token, &config::config().security.jwt_secret)
    }

    pub fn from_token_with_secret(token: &str, secret: &str) -> Result<Self, SessionError> {
        let claims = validate_jwt(token, secret)?;
        Ok(Self {
            user_id: claims.sub,
            email: claims.email,
            access_token: token.to_string(),
        })
    }
}

pub fn generate_jwt(claims: &Claims) -> Result<String, SessionError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| SessionError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| SessionError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trips_through_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Some("mech@example.com".to_string()));
        let token = generate_jwt_with_secret(&claims, "s3cret").unwrap();

        let session = Session::from_token_with_secret(&token, "s3cret").unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.email.as_deref(), Some("mech@example.com"));
        assert_eq!(session.access_token, token);
    }

    #[test]
    fn rejects_wrong_secret_and_empty_secret() {
        let token = generate_jwt_with_secret(&Claims::new(Uuid::new_v4(), None), "right").unwrap();
        assert!(matches!(
            Session::from_token_with_secret(&token, "wrong"),
            Err(SessionError::InvalidToken(_))
        ));
        assert!(matches!(
            Session::from_token_with_secret(&token, ""),
            Err(SessionError::InvalidSecret)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let mut claims = Claims::new(Uuid::new_v4(), None);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt_with_secret(&claims, "k").unwrap();
        assert!(Session::from_token_with_secret(&token, "k").is_err());
    }
}
