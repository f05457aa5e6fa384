//! Client side of the gateway contract

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::conversation::{Content, Part, ProxyReply};

/// Failure talking to the gateway. The display text is the most specific
/// cause available and is wrapped into the user-visible error.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{0}")]
    Status(String),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response from proxy: {0}")]
    Decode(String),
}

/// The one network seam of the orchestrator
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send `contents`, optionally with function results riding alongside
    /// them (not appended into them).
    async fn send(
        &self,
        contents: &[Content],
        function_responses: Option<&[Part]>,
    ) -> Result<ProxyReply, ProxyError>;
}

#[derive(Debug, Serialize)]
struct ProxyBody<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    function_responses: Option<&'a [Part]>,
}

/// Gateway deployed behind a fixed URL
pub struct HttpGateway {
    client: Client,
    url: String,
}

impl HttpGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProxyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

/// Pick the message of a non-success gateway answer: `details`, then
/// `error`, then the bare status
fn status_message(status: reqwest::StatusCode, body: &str) -> String {
    let data: Value = serde_json::from_str(body)
        .unwrap_or_else(|_| serde_json::json!({ "error": "Invalid JSON response from server" }));

    let pick = |field: &str| {
        data.get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    pick("details").or_else(|| pick("error")).unwrap_or_else(|| {
        format!(
            "Failed to fetch from proxy with status: {}",
            status.as_u16()
        )
    })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn send(
        &self,
        contents: &[Content],
        function_responses: Option<&[Part]>,
    ) -> Result<ProxyReply, ProxyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ProxyBody {
                contents,
                function_responses,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "Error from proxy server");
            return Err(ProxyError::Status(status_message(status, &body)));
        }

        serde_json::from_str(&body).map_err(|e| ProxyError::Decode(e.to_string()))
    }
}
