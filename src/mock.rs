//! In-memory automation engine for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::ClientError;
use crate::session::{SessionConfig, SessionFactory, WhatsAppClient};

#[derive(Clone, Default)]
pub struct MockClient {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    send_error: Option<String>,
    close_error: Option<String>,
    closed: Arc<Mutex<bool>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `send_text` fails with `message`.
    pub fn failing_send(mut self, message: &str) -> Self {
        self.send_error = Some(message.to_string());
        self
    }

    pub fn failing_close(mut self, message: &str) -> Self {
        self.close_error = Some(message.to_string());
        self
    }

    /// `(recipient, text)` pairs seen by `send_text`, in call order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl WhatsAppClient for MockClient {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ClientError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        match &self.send_error {
            Some(message) => Err(ClientError::Rejected(message.clone())),
            None => Ok(()),
        }
    }

    async fn close(&self) -> Result<(), ClientError> {
        *self.closed.lock().unwrap() = true;
        match &self.close_error {
            Some(message) => Err(ClientError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

pub struct MockFactory {
    outcome: Result<MockClient, String>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: Arc<Mutex<Vec<SessionConfig>>>,
}

impl MockFactory {
    pub fn connected(client: MockClient) -> Self {
        Self {
            outcome: Ok(client),
            gate: Mutex::new(None),
            calls: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            gate: Mutex::new(None),
            calls: Arc::default(),
        }
    }

    /// `create` blocks until the returned sender fires.
    pub fn gated(client: MockClient) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let factory = Self {
            outcome: Ok(client),
            gate: Mutex::new(Some(rx)),
            calls: Arc::default(),
        };
        (factory, tx)
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<SessionConfig>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    async fn create(&self, config: &SessionConfig) -> Result<Arc<dyn WhatsAppClient>, ClientError> {
        self.calls.lock().unwrap().push(config.clone());
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match &self.outcome {
            Ok(client) => Ok(Arc::new(client.clone())),
            Err(message) => Err(ClientError::Rejected(message.clone())),
        }
    }
}
