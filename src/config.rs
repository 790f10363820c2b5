use std::time::Duration;

use crate::bridge::BridgeConfig;
use crate::session::SessionConfig;

pub const DEFAULT_PORT: u16 = 21465;
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:21466";

pub struct Config {
    pub port: u16,
    /// When set, `/api/*` requires `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    /// Always the fixed headless Chrome session `bot`.
    pub session: SessionConfig,
    pub bridge: BridgeConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str, default: u64| {
            non_empty(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let port = non_empty("WHATSAPP_API_PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            api_key: non_empty("WHATSAPP_API_KEY"),
            session: SessionConfig::default(),
            bridge: BridgeConfig {
                base_url: non_empty("WPP_BRIDGE_URL")
                    .unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string()),
                token: non_empty("WPP_BRIDGE_TOKEN"),
                pairing_timeout: Duration::from_secs(number("WPP_PAIRING_TIMEOUT_SECS", 60)),
                poll_interval: Duration::from_millis(number("WPP_POLL_INTERVAL_MS", 1000)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_fixed_service() {
        let config = config(&[]);
        assert_eq!(config.port, 21465);
        assert_eq!(config.api_key, None);
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.bridge.base_url, DEFAULT_BRIDGE_URL);
        assert_eq!(config.bridge.token, None);
        assert_eq!(config.bridge.pairing_timeout, Duration::from_secs(60));
        assert_eq!(config.bridge.poll_interval, Duration::from_millis(1000));
    }

    #[test]
    fn overrides_are_applied() {
        let config = config(&[
            ("WHATSAPP_API_PORT", "8080"),
            ("WHATSAPP_API_KEY", "k"),
            ("WPP_BRIDGE_URL", "http://bridge:21466"),
            ("WPP_BRIDGE_TOKEN", "t"),
            ("WPP_PAIRING_TIMEOUT_SECS", "120"),
            ("WPP_POLL_INTERVAL_MS", "250"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.bridge.base_url, "http://bridge:21466");
        assert_eq!(config.bridge.token.as_deref(), Some("t"));
        assert_eq!(config.bridge.pairing_timeout, Duration::from_secs(120));
        assert_eq!(config.bridge.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn session_name_is_not_configurable() {
        let config = config(&[("WPP_SESSION", "sales")]);
        assert_eq!(config.session.session, "bot");
    }

    #[test]
    fn bad_numbers_and_blanks_fall_back() {
        let config = config(&[
            ("WHATSAPP_API_PORT", "not-a-port"),
            ("WHATSAPP_API_KEY", "  "),
            ("WPP_PAIRING_TIMEOUT_SECS", "-1"),
        ]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.api_key, None);
        assert_eq!(config.bridge.pairing_timeout, Duration::from_secs(60));
    }
}
