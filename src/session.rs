use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ClientError;

/// Suffix WhatsApp uses to address an individual chat.
pub const USER_SUFFIX: &str = "@c.us";

/// Suffix of group chat ids.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Options handed to the automation engine when a session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub session: String,
    pub headless: bool,
    pub devtools: bool,
    pub use_chrome: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session: "bot".to_string(),
            headless: true,
            devtools: false,
            use_chrome: true,
        }
    }
}

/// A connected automation session.
#[async_trait]
pub trait WhatsAppClient: Send + Sync {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ClientError>;

    async fn close(&self) -> Result<(), ClientError>;
}

/// Entry point of the automation engine. `create` resolves once the session
/// is paired and usable, which can take as long as a QR scan.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self, config: &SessionConfig) -> Result<Arc<dyn WhatsAppClient>, ClientError>;
}

/// Turn a phone number into a recipient id. Anything that already carries a
/// domain (`@c.us`, `@g.us`, ...) is passed through.
pub fn recipient_id(phone: &str) -> String {
    if phone.contains('@') {
        phone.to_string()
    } else {
        format!("{}{}", phone, USER_SUFFIX)
    }
}
