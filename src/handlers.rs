use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use log::{error, info};
use uuid::Uuid;

use crate::connection::ConnectionManager;
use crate::error::AppError;
use crate::session::recipient_id;
use crate::types::{HealthResponse, SendRequest, SendResponse, StatusResponse};

pub struct AppState {
    pub connection: Arc<ConnectionManager>,
    pub api_key: Option<String>,
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let (phone, message) = SendRequest::from_body(&body)
        .required_fields()
        .ok_or(AppError::Validation)?;

    let client = state.connection.client().ok_or(AppError::NotConnected)?;

    let to = recipient_id(&phone);
    let request_id = Uuid::new_v4();
    info!("[{}] Sending message to {} (formatted: {})", request_id, phone, to);

    if let Err(e) = client.send_text(&to, &message).await {
        error!("[{}] Error sending message: {}", request_id, e);
        return Err(e.into());
    }
    info!("[{}] Message sent to {}", request_id, to);

    Ok((
        StatusCode::OK,
        Json(SendResponse {
            success: true,
            message: "Message sent successfully",
            phone,
            sent_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    ))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.connection.client().is_some() {
        (StatusCode::OK, Json(HealthResponse { status: "connected" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "disconnected",
            }),
        )
    }
}

pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        state: state.connection.status(),
        session: state.connection.session().to_string(),
    })
}
