//! Local capabilities the model can call
//!
//! The capability set is closed: every function the gateway declares to the
//! model has a variant in [`memory::MemoryFunction`], and a call naming
//! anything else is rejected with [`PluginError::UnknownFunction`].
//!
//! # Built-in Plugins
//!
//! - `memory` - save, get and list key-value facts about the user

pub mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while resolving a function call.
///
/// The display text is handed back to the model as the function result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("عذراً، الدالة غير معروفة: {0}")]
    UnknownFunction(String),

    #[error("عذراً، معاملات غير صالحة للدالة {function}: المعامل \"{parameter}\" مفقود")]
    MissingParameter { function: String, parameter: String },
}

/// Definition of a function the model may call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model uses in its function call
    pub name: String,

    /// Human-readable description guiding the model's usage
    pub description: String,

    /// JSON Schema defining the expected parameters
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    /// Set the parameters schema for this tool
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Names listed as required in the parameters schema
    #[cfg(test)]
    pub fn required(&self) -> Vec<&str> {
        self.parameters["required"]
            .as_array()
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new("my_tool", "Does something");
        assert_eq!(tool.name, "my_tool");
        assert_eq!(tool.description, "Does something");
        assert!(tool.required().is_empty());
    }

    #[test]
    fn test_required_parameters() {
        let tool = ToolDefinition::new("t", "d").with_parameters(json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "required": ["a"]
        }));
        assert_eq!(tool.required(), vec!["a"]);
    }
}
