//! HTTP backend for a WPPConnect automation bridge.
//!
//! The bridge hosts the browser session; this module only starts it, waits
//! for pairing, and forwards text sends and the final close.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::error::ClientError;
use crate::session::{SessionConfig, SessionFactory, WhatsAppClient, GROUP_SUFFIX};

/// Statuses after which the bridge will never reach `CONNECTED` on its own.
const TERMINAL_STATUSES: &[&str] = &[
    "CLOSED",
    "browserClose",
    "qrReadFail",
    "autocloseCalled",
    "desconnectedMobile",
    "deleteToken",
];

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub pairing_timeout: Duration,
    pub poll_interval: Duration,
}

#[derive(Deserialize)]
struct SessionStatus {
    status: Option<String>,
}

#[derive(Clone)]
struct BridgeHttp {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BridgeHttp {
    fn url(&self, session: &str, action: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.base_url.trim_end_matches('/'),
            session,
            action
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn post(&self, session: &str, action: &str, body: Value) -> Result<Value, ClientError> {
        let req = self.http.post(self.url(session, action)).json(&body);
        let resp = self.authorize(req).send().await?;
        read_json(resp).await
    }

    async fn get(&self, session: &str, action: &str) -> Result<Value, ClientError> {
        let req = self.http.get(self.url(session, action));
        let resp = self.authorize(req).send().await?;
        read_json(resp).await
    }
}

async fn read_json(resp: reqwest::Response) -> Result<Value, ClientError> {
    let status = resp.status();
    let text = resp.text().await?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(body);
    }

    let message = ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| status.to_string());
    Err(ClientError::Rejected(message))
}

pub struct BridgeFactory {
    http: BridgeHttp,
    pairing_timeout: Duration,
    poll_interval: Duration,
}

impl BridgeFactory {
    pub fn new(config: BridgeConfig) -> Result<Self, ClientError> {
        // Sends may legitimately take as long as the browser round trip, so
        // only the socket connect is bounded.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http: BridgeHttp {
                http,
                base_url: config.base_url,
                token: config.token,
            },
            pairing_timeout: config.pairing_timeout,
            poll_interval: config.poll_interval,
        })
    }

    async fn wait_until_connected(&self, session: &str) -> Result<(), ClientError> {
        let deadline = Instant::now() + self.pairing_timeout;
        let mut announced_qr = false;

        loop {
            let body: SessionStatus =
                serde_json::from_value(self.http.get(session, "status-session").await?)
                    .unwrap_or(SessionStatus { status: None });
            let status = body.status.unwrap_or_default();
            debug!("Session '{}' status: {}", session, status);

            match status.as_str() {
                "CONNECTED" => return Ok(()),
                "QRCODE" if !announced_qr => {
                    info!("Waiting for QR pairing of session '{}'...", session);
                    announced_qr = true;
                }
                s if TERMINAL_STATUSES.contains(&s) => {
                    return Err(ClientError::SessionStart {
                        session: session.to_string(),
                        reason: s.to_string(),
                    });
                }
                _ => {}
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(ClientError::SessionStart {
                    session: session.to_string(),
                    reason: format!(
                        "not paired within {}s (last status: {})",
                        self.pairing_timeout.as_secs(),
                        if status.is_empty() { "unknown" } else { status.as_str() }
                    ),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl SessionFactory for BridgeFactory {
    async fn create(&self, config: &SessionConfig) -> Result<Arc<dyn WhatsAppClient>, ClientError> {
        let session = config.session.as_str();
        info!(
            "Requesting session '{}' from bridge {}",
            session, self.http.base_url
        );
        self.http
            .post(
                session,
                "start-session",
                json!({
                    "headless": config.headless,
                    "devtools": config.devtools,
                    "useChrome": config.use_chrome,
                    "waitQrCode": false,
                }),
            )
            .await?;

        self.wait_until_connected(session).await?;

        Ok(Arc::new(BridgeClient {
            http: self.http.clone(),
            session: session.to_string(),
        }))
    }
}

pub struct BridgeClient {
    http: BridgeHttp,
    session: String,
}

#[async_trait]
impl WhatsAppClient for BridgeClient {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ClientError> {
        // The bridge rewrites the id to an individual chat unless told it is a group.
        let is_group = recipient.ends_with(GROUP_SUFFIX);
        self.http
            .post(
                &self.session,
                "send-message",
                json!({ "phone": recipient, "message": text, "isGroup": is_group }),
            )
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        if let Err(e) = self.http.post(&self.session, "close-session", json!({})).await {
            warn!("Bridge refused to close session '{}': {}", self.session, e);
            return Err(e);
        }
        Ok(())
    }
}
