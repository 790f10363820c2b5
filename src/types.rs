use serde::{Deserialize, Serialize};

use crate::connection::ConnectionStatus;

#[derive(Deserialize, Default)]
pub struct SendRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SendRequest {
    /// Lenient body parsing: anything that isn't a JSON object with string
    /// fields is treated as an empty request. A non-string `phone` or
    /// `message` (e.g. a number) makes the whole body count as missing.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Returns `(phone, message)` when both are present and non-empty.
    pub fn required_fields(self) -> Option<(String, String)> {
        match (self.phone, self.message) {
            (Some(phone), Some(message)) if !phone.is_empty() && !message.is_empty() => {
                Some((phone, message))
            }
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message: &'static str,
    pub phone: String,
    pub sent_at: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub state: ConnectionStatus,
    pub session: String,
}
