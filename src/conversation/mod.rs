//! Conversation types shared by the gateway and the chat client
//!
//! `Content`/`Part` are the protocol turns exchanged with the model.
//! `Message` is the display projection the terminal renders.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered, append-only sequence of turns for one session
pub type ChatHistory = Vec<Content>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    Function,
}

/// One role-tagged turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Model turn echoing a function call it issued
    pub fn model_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::FunctionCall(call)],
        }
    }

    pub fn function(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Function,
            parts,
        }
    }

    /// Concatenated text of all text parts
    #[cfg(test)]
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Atomic unit of a turn. Serializes as `{"text": ..}`, `{"functionCall": ..}`
/// or `{"functionResponse": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

/// A model-issued request to invoke a named local capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl FunctionCall {
    #[cfg(test)]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    #[cfg(test)]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Read an argument as a string; scalar non-string values are stringified
    pub fn arg(&self, key: &str) -> Option<String> {
        match self.args.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: FunctionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub result: String,
}

impl FunctionResponse {
    pub fn new(name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: FunctionResult {
                result: result.into(),
            },
        }
    }
}

/// Body accepted by the gateway's proxy endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub contents: ChatHistory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_responses: Option<Vec<Part>>,
}

/// Body returned by the gateway on success
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "functionCalls",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub function_calls: Option<Vec<FunctionCall>>,
}

impl ProxyReply {
    /// First requested call, if any. Further calls are not honored.
    pub fn first_call(&self) -> Option<&FunctionCall> {
        self.function_calls.as_ref().and_then(|calls| calls.first())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

/// Display item rendered by the chat front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Speaker,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::Model,
            content: content.into(),
        }
    }
}
