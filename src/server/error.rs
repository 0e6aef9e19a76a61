//! HTTP error responses

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Message returned for any failed join
///
/// Shared by unknown channels and wrong passwords so the two are
/// indistinguishable to clients.
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid channel ID or password";

/// Error type for HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    /// Request body could not be parsed
    BadRequest(String),
    /// Unknown channel or wrong password
    Unauthorized,
    /// Session limit reached
    Unavailable,
    /// Request was not a valid WebSocket upgrade
    NotUpgradable(WebSocketUpgradeRejection),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(reason) => write!(f, "Invalid request: {}", reason),
            ApiError::Unauthorized => f.write_str(UNAUTHORIZED_MESSAGE),
            ApiError::Unavailable => write!(f, "Too many connections"),
            ApiError::NotUpgradable(rejection) => write!(f, "{}", rejection),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotUpgradable(rejection) => return rejection.into_response(),
        };

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
