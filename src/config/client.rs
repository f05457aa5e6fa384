//! Chat client configuration loaded from TOML files
//!
//! The terminal client needs to know where the deployed gateway lives and
//! the per-session limits it enforces locally.
//!
//! ```toml
//! [gateway]
//! url = "https://your-project.vercel.app/api/proxy"
//! timeout_secs = 60
//!
//! [session]
//! daily_message_limit = 30
//! memory_capacity = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::DEFAULT_DAILY_LIMIT;
use crate::plugins::memory::DEFAULT_CAPACITY;

/// Root client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.daily_message_limit == 0 {
            return Err(ConfigError::Validation(
                "session.daily_message_limit must be at least 1".into(),
            ));
        }
        if self.session.memory_capacity == 0 {
            return Err(ConfigError::Validation(
                "session.memory_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Where the gateway is deployed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Full proxy endpoint URL; no discovery is performed
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in seconds; expiry counts as an upstream failure
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Limits enforced by the client for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_daily_message_limit")]
    pub daily_message_limit: u32,

    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

fn default_daily_message_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}

fn default_memory_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            daily_message_limit: default_daily_message_limit(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[gateway]
url = "https://memory-assistant.vercel.app/api/proxy"
timeout_secs = 20

[session]
daily_message_limit = 5
memory_capacity = 3
"#;

    #[test]
    fn test_parse_config() {
        let config = ClientConfig::from_str(SAMPLE_CONFIG).unwrap();

        assert_eq!(
            config.gateway.url.as_deref(),
            Some("https://memory-assistant.vercel.app/api/proxy")
        );
        assert_eq!(config.gateway.timeout_secs, 20);
        assert_eq!(config.session.daily_message_limit, 5);
        assert_eq!(config.session.memory_capacity, 3);
    }

    #[test]
    fn test_minimal_config() {
        let config = ClientConfig::from_str("").unwrap();
        assert!(config.gateway.url.is_none());
        assert_eq!(config.gateway.timeout_secs, 60);
        assert_eq!(config.session.daily_message_limit, 30);
        assert_eq!(config.session.memory_capacity, 10);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = ClientConfig::from_str("[session]\ndaily_message_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ClientConfig::from_str("[session]\nmemory_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("memory_capacity")));
    }
}
