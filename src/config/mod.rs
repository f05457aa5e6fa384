//! Application configuration

pub mod client;
pub mod prompts;

use std::env;

use serde::{Deserialize, Serialize};

pub use client::ClientConfig;
pub use prompts::builtin as prompts_builtin;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Gateway process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Upstream credential. The gateway still starts without one.
    pub api_key: Option<String>,
    pub model: String,
    pub gemini_url: String,
    pub upstream_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            api_key: env::var("API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            gemini_url: env::var("GEMINI_URL").unwrap_or_else(|_| DEFAULT_GEMINI_URL.into()),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(60),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            api_key: None,
            model: DEFAULT_MODEL.into(),
            gemini_url: DEFAULT_GEMINI_URL.into(),
            upstream_timeout_secs: 60,
        }
    }
}
