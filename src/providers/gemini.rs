//! Gemini `generateContent` provider
//!
//! Sends the full content sequence on every call together with the fixed
//! function declarations, and reduces the first candidate to the two things
//! the gateway relays: its text and its requested function calls.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::conversation::{Content, FunctionCall};
use crate::plugins::ToolDefinition;

use super::ProviderError;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool<'a>>,
}

#[derive(Debug, Serialize)]
struct Tool<'a> {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<FunctionDeclaration<'a>>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

impl<'a> From<&'a ToolDefinition> for FunctionDeclaration<'a> {
    fn from(tool: &'a ToolDefinition) -> Self {
        Self {
            name: &tool.name,
            description: &tool.description,
            parameters: &tool.parameters,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

/// Upstream parts may carry extra fields (`thought`, `thoughtSignature`),
/// so they are read leniently rather than as a [`crate::conversation::Part`].
#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
    #[serde(rename = "functionCall", default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// What one upstream call produced. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: Option<String>,
    pub function_calls: Option<Vec<FunctionCall>>,
}

impl From<GenerateContentResponse> for Generation {
    fn from(response: GenerateContentResponse) -> Self {
        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut texts = Vec::new();
        let mut calls = Vec::new();
        for part in parts {
            if let Some(call) = part.function_call {
                calls.push(call);
            } else if let Some(text) = part.text {
                if part.thought != Some(true) {
                    texts.push(text);
                }
            }
        }

        Self {
            text: (!texts.is_empty()).then(|| texts.concat()),
            function_calls: (!calls.is_empty()).then_some(calls),
        }
    }
}

/// Gemini provider configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL, e.g. https://generativelanguage.googleapis.com
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeminiConfig {
    /// Build from the gateway config; fails when no credential is set
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::NotConfigured("API_KEY".to_string()))?;

        Ok(Self {
            base_url: config.gemini_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// `client` carries the timeout; it is shared across requests
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    pub async fn generate(
        &self,
        contents: &[Content],
        tools: &[ToolDefinition],
    ) -> Result<Generation, ProviderError> {
        let request = GenerateContentRequest {
            contents,
            tools: if tools.is_empty() {
                vec![]
            } else {
                vec![Tool {
                    function_declarations: tools.iter().map(FunctionDeclaration::from).collect(),
                }]
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(ProviderError::InvalidResponse(format!(
                    "API error: {}",
                    error_resp.error.message
                )));
            }
            return Err(ProviderError::InvalidResponse(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let completion: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        Ok(completion.into())
    }
}
