//! Decoding of the backend's JWT access tokens.
//!
//! Only the payload is read; the signature is the backend's business.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::Id;

use super::Role;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token does not have three segments")]
    Malformed,

    #[error("Token payload is not valid base64: {0}")]
    Encoding(String),

    #[error("Token payload is not valid JSON: {0}")]
    Payload(String),
}

/// Claims carried in the access token payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(default, deserialize_with = "string_or_number")]
    pub sub: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub gym_id: Option<Id>,
    pub member_id: Option<Id>,
    pub trainer_id: Option<Id>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
}

impl Claims {
    /// Most privileged role named in `role` or `roles`
    pub fn role(&self) -> Option<Role> {
        Role::highest(self.role.iter().chain(self.roles.iter()).map(String::as_str))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|iat| DateTime::from_timestamp(iat, 0))
    }
}

/// `sub` is a string in some tokens and a number in others
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Sub {
        Text(String),
        Number(i64),
    }
    Ok(Option::<Sub>::deserialize(deserializer)?.map(|s| match s {
        Sub::Text(t) => t,
        Sub::Number(n) => n.to_string(),
    }))
}

/// Decode the claims of a compact JWT without verifying it.
pub fn decode_claims(token: &str) -> Result<Claims, JwtError> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(JwtError::Malformed),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| JwtError::Encoding(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| JwtError::Payload(e.to_string()))
}
