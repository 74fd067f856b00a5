use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthService;

pub type Result<T> = std::result::Result<T, AppError>;

/// Where a browser is sent once its session is gone.
pub const LOGIN_PATH: &str = "/login";

#[derive(Error, Debug)]
pub enum AppError {
    /// Backend unreachable or the connection dropped mid-request.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Session expired")]
    SessionExpired,

    /// Credentials rejected at login. Unlike `SessionExpired` there is no
    /// session to tear down.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request already in progress: {0}")]
    InFlight(String),

    #[error("Backend returned {status}: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable tag for the frontend.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Network(_) => "network",
            AppError::SessionExpired => "session_expired",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::InFlight(_) => "in_flight",
            AppError::Upstream { .. } => "upstream",
            AppError::Internal(_) => "internal",
        }
    }

    /// Whether the caller should offer a retry rather than an explanation.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) => true,
            AppError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SessionExpired => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InFlight(_) => StatusCode::CONFLICT,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Network(msg) => {
                tracing::warn!("Backend unreachable: {}", msg);
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            AppError::SessionExpired => "Session expired".to_string(),
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::InFlight(msg) => msg.clone(),
            AppError::Upstream { status, detail } => {
                tracing::error!("Backend error {}: {}", status, detail);
                detail.clone()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.public_message(),
            "kind": self.kind(),
            "retryable": self.is_retryable(),
        }));

        if let AppError::SessionExpired = self {
            let clear = AuthService::create_logout_cookie().to_string();
            return (
                status,
                [
                    (header::SET_COOKIE, clear),
                    (header::HeaderName::from_static("hx-redirect"), LOGIN_PATH.to_string()),
                ],
                body,
            )
                .into_response();
        }

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Upstream {
                status: err.status().map(|s| s.as_u16()).unwrap_or(502),
                detail: format!("Malformed backend response: {}", err),
            }
        } else if err.is_builder() {
            AppError::Internal(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_distinct_from_network() {
        let denied = AppError::Forbidden("nope".into());
        let offline = AppError::Network("connection refused".into());

        assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);
        assert!(!denied.is_retryable());
        assert_eq!(offline.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(offline.is_retryable());
        assert_ne!(denied.kind(), offline.kind());
    }

    #[test]
    fn test_upstream_retryable_only_for_server_errors() {
        let gateway = AppError::Upstream { status: 503, detail: "down".into() };
        let conflict = AppError::Upstream { status: 409, detail: "dup".into() };
        assert!(gateway.is_retryable());
        assert!(!conflict.is_retryable());
    }

    #[test]
    fn test_session_expired_response_clears_cookie() {
        let response = AppError::SessionExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(cookie.starts_with("zc_token="));
        assert!(cookie.contains("Max-Age=0"));
        assert_eq!(
            response.headers().get("hx-redirect").and_then(|v| v.to_str().ok()),
            Some(LOGIN_PATH)
        );
    }
}
