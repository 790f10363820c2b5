use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::types::ErrorResponse;

/// Failures reported by the automation engine.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The engine answered but refused the call. Carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Session never reached a connected state.
    #[error("session '{session}' did not connect: {reason}")]
    SessionStart { session: String, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("phone and message are required")]
    Validation,

    #[error("WhatsApp client not connected")]
    NotConnected,

    #[error(transparent)]
    Upstream(#[from] ClientError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
