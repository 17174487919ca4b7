// src/error.rs
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Why a device request was turned away before reaching the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("malformed request body: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("signature mismatch (expected {expected}, got {actual})")]
    Authentication { expected: String, actual: String },

    #[error("unknown device id {0:?}")]
    UnknownDevice(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Malformed(_) => StatusCode::BAD_REQUEST.into_response(),
            GatewayError::Authentication { .. } => {
                (StatusCode::FORBIDDEN, "signature verification failed").into_response()
            }
            GatewayError::UnknownDevice(_) => {
                (StatusCode::BAD_REQUEST, "unknown device id").into_response()
            }
        }
    }
}

/// Failure of the single outbound verification call.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("verification backend unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("verification backend sent an undecodable reply: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("verify_url must not be empty")]
    MissingVerifyUrl,

    #[error("device id {0:?} is listed more than once")]
    DuplicateDevice(String),

    #[error("invalid listen address {0:?}")]
    ListenAddr(String),

    #[error(
        "verify_timeout_ms ({verify_ms}) must be non-zero and shorter than request_timeout_secs ({request_secs}s)"
    )]
    Timeouts { verify_ms: u64, request_secs: u64 },

    #[error("log_max_files must be at least 1")]
    LogMaxFiles,

    #[error("utc_offset_hours {0} is out of range")]
    UtcOffset(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_status_codes() {
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            GatewayError::Malformed(malformed).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        let auth = GatewayError::Authentication {
            expected: "a".into(),
            actual: "b".into(),
        };
        assert_eq!(auth.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            GatewayError::UnknownDevice("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
