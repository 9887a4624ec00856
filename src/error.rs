use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::registry::DEMO_FREE_KEY;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown tier '{0}' (expected free, starter, pro or enterprise)")]
pub struct ParseTierError(pub String);

// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid key spec '{0}', expected KEY=TIER")]
    InvalidKeySpec(String),

    #[error(transparent)]
    InvalidTier(#[from] ParseTierError),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Request rejections produced in front of the handlers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("API key required")]
    MissingKey,

    #[error("invalid API key")]
    UnknownKey,

    #[error("rate limit exceeded, retry after {retry_after_seconds}s")]
    RateExceeded { retry_after_seconds: u64 },
}

impl AuthError {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingKey => "missing_key",
            AuthError::UnknownKey => "unknown_key",
            AuthError::RateExceeded { .. } => "rate_exceeded",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingKey | AuthError::UnknownKey => StatusCode::UNAUTHORIZED,
            AuthError::RateExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "error": self.to_string(),
            "reason": self.reason(),
            "status": status.as_u16(),
        });

        match &self {
            AuthError::MissingKey => {
                body["hint"] = json!(format!("send header X-API-Key, e.g. demo key {}", DEMO_FREE_KEY));
            }
            AuthError::RateExceeded { retry_after_seconds } => {
                body["retry_after_seconds"] = json!(retry_after_seconds);
            }
            AuthError::UnknownKey => {}
        }

        let mut response = (status, Json(body)).into_response();
        if let AuthError::RateExceeded { retry_after_seconds } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_seconds));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_exceeded_maps_to_429_with_retry_after() {
        let response = AuthError::RateExceeded {
            retry_after_seconds: 17,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "17");
    }

    #[test]
    fn unknown_key_maps_to_401_without_retry_after() {
        let response = AuthError::UnknownKey.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn reasons() {
        assert_eq!(AuthError::MissingKey.reason(), "missing_key");
        assert_eq!(AuthError::UnknownKey.reason(), "unknown_key");
        assert_eq!(
            AuthError::RateExceeded {
                retry_after_seconds: 0
            }
            .reason(),
            "rate_exceeded"
        );
    }
}
