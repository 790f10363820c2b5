use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::session::{SessionConfig, SessionFactory, WhatsAppClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Uninitialized,
    Connecting,
    Connected,
    Failed,
    Closed,
}

#[derive(Clone)]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Connected(Arc<dyn WhatsAppClient>),
    Failed(String),
    Closed,
}

impl ConnectionState {
    pub fn status(&self) -> ConnectionStatus {
        match self {
            Self::Uninitialized => ConnectionStatus::Uninitialized,
            Self::Connecting => ConnectionStatus::Connecting,
            Self::Connected(_) => ConnectionStatus::Connected,
            Self::Failed(_) => ConnectionStatus::Failed,
            Self::Closed => ConnectionStatus::Closed,
        }
    }
}

/// Owns the single client handle of the process and its lifecycle.
///
/// Bootstrap is a single attempt: once it leaves `Uninitialized` the manager
/// never tries again, so a failed session stays failed until restart.
pub struct ConnectionManager {
    factory: Arc<dyn SessionFactory>,
    config: SessionConfig,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(factory: Arc<dyn SessionFactory>, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Uninitialized);
        Self {
            factory,
            config,
            state,
        }
    }

    pub fn session(&self) -> &str {
        &self.config.session
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.borrow().status()
    }

    /// The client handle, only once bootstrap has succeeded.
    pub fn client(&self) -> Option<Arc<dyn WhatsAppClient>> {
        match &*self.state.borrow() {
            ConnectionState::Connected(client) => Some(client.clone()),
            _ => None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub async fn connect(&self) -> ConnectionStatus {
        let started = self.state.send_if_modified(|state| {
            if matches!(state, ConnectionState::Uninitialized) {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if !started {
            let status = self.status();
            warn!("Ignoring connect request, session is already {:?}", status);
            return status;
        }

        info!("Starting WhatsApp session '{}'...", self.config.session);
        match self.factory.create(&self.config).await {
            Ok(client) => {
                let stored = self.state.send_if_modified(|state| {
                    if matches!(state, ConnectionState::Connecting) {
                        *state = ConnectionState::Connected(client.clone());
                        true
                    } else {
                        false
                    }
                });
                if stored {
                    info!("✓ WhatsApp connected!");
                    info!("Ready to send messages...");
                } else {
                    warn!("Session connected after shutdown began, closing it");
                    if let Err(e) = client.close().await {
                        warn!("Failed to close late session: {}", e);
                    }
                }
            }
            Err(e) => {
                error!("✗ Failed to connect WhatsApp: {}", e);
                self.state.send_if_modified(|state| {
                    if matches!(state, ConnectionState::Connecting) {
                        *state = ConnectionState::Failed(e.to_string());
                        true
                    } else {
                        false
                    }
                });
            }
        }
        self.status()
    }

    /// Fire-and-forget bootstrap.
    pub fn spawn_connect(self: &Arc<Self>) -> JoinHandle<ConnectionStatus> {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.connect().await })
    }

    /// Best-effort close. Errors are logged and swallowed.
    pub async fn close(&self) {
        let previous = self.state.send_replace(ConnectionState::Closed);
        if let ConnectionState::Connected(client) = previous {
            info!("Closing WhatsApp session '{}'", self.config.session);
            if let Err(e) = client.close().await {
                warn!("Failed to close WhatsApp session: {}", e);
            }
        }
    }
}
