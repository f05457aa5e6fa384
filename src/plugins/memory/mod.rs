//! Memory plugin: key-value facts about the user
//!
//! Holds at most `capacity` distinct keys for the lifetime of a session.
//! Every operation returns display-ready text; failures are encoded in that
//! text so the model can narrate them.
//!
//! # Tools
//!
//! - `saveUserData` - upsert one fact (refused when full and the key is new)
//! - `getUserData` - look up one fact by key
//! - `getAllUserData` - the whole memory as a flat JSON object

use serde_json::json;
use std::collections::BTreeMap;

use crate::conversation::FunctionCall;
use crate::plugins::{PluginError, ToolDefinition};

pub const SAVE_USER_DATA: &str = "saveUserData";
pub const GET_USER_DATA: &str = "getUserData";
pub const GET_ALL_USER_DATA: &str = "getAllUserData";

pub const DEFAULT_CAPACITY: usize = 10;

/// Session-scoped user memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    entries: BTreeMap<String, String>,
    capacity: usize,
}

impl UserData {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
        }
    }

    /// Upsert `key`. A new key is refused once the memory is full.
    pub fn save(&mut self, key: &str, value: &str) -> String {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(key) {
            return format!(
                "عذراً، الذاكرة ممتلئة. لا يمكن حفظ أكثر من {} معلومات. يرجى حذف معلومة قديمة أولاً.",
                self.capacity
            );
        }

        self.entries.insert(key.to_string(), value.to_string());
        tracing::debug!(key, size = self.entries.len(), "Saved to memory");
        format!("تم حفظ المعلومة بنجاح: {}", key)
    }

    pub fn get(&self, key: &str) -> String {
        match self.entries.get(key) {
            Some(value) => format!("المعلومة التي وجدتها لـ {} هي: {}", key, value),
            None => format!("عذراً، لم أجد أي معلومة محفوظة بالمفتاح: {}", key),
        }
    }

    /// The whole memory as a flat JSON object string (`{}` when empty)
    pub fn all_as_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }

    #[cfg(test)]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Remove a fact. Returns whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for UserData {
    fn default() -> Self {
        Self::new()
    }
}

/// The closed set of memory capabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryFunction {
    SaveUserData { key: String, value: String },
    GetUserData { key: String },
    GetAllUserData,
}

impl MemoryFunction {
    pub fn execute(&self, data: &mut UserData) -> String {
        match self {
            MemoryFunction::SaveUserData { key, value } => data.save(key, value),
            MemoryFunction::GetUserData { key } => data.get(key),
            MemoryFunction::GetAllUserData => data.all_as_json(),
        }
    }
}

impl TryFrom<&FunctionCall> for MemoryFunction {
    type Error = PluginError;

    fn try_from(call: &FunctionCall) -> Result<Self, Self::Error> {
        let arg = |parameter: &str| {
            call.arg(parameter).ok_or_else(|| PluginError::MissingParameter {
                function: call.name.clone(),
                parameter: parameter.to_string(),
            })
        };

        match call.name.as_str() {
            SAVE_USER_DATA => Ok(MemoryFunction::SaveUserData {
                key: arg("key")?,
                value: arg("value")?,
            }),
            GET_USER_DATA => Ok(MemoryFunction::GetUserData { key: arg("key")? }),
            GET_ALL_USER_DATA => Ok(MemoryFunction::GetAllUserData),
            other => Err(PluginError::UnknownFunction(other.to_string())),
        }
    }
}

/// Resolve and run a model-issued call against `data`
pub fn dispatch(call: &FunctionCall, data: &mut UserData) -> Result<String, PluginError> {
    let function = MemoryFunction::try_from(call)?;
    Ok(function.execute(data))
}

/// Declarations sent to the model with every upstream request
pub fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            SAVE_USER_DATA,
            "يحفظ معلومة واحدة عن المستخدم باستخدام مفتاح وقيمة. استخدمه عندما يطلب منك المستخدم صراحة أن تتذكر شيئًا ما.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "المفتاح الذي سيتم حفظ المعلومة تحته. يجب أن يكون بسيطاً وواضحاً، مثل \"تاريخ الميلاد\" أو \"اسم حيوان أليف\"."
                },
                "value": {
                    "type": "string",
                    "description": "المعلومة الفعلية التي سيتم حفظها."
                }
            },
            "required": ["key", "value"]
        })),
        ToolDefinition::new(
            GET_USER_DATA,
            "يسترجع معلومة واحدة محفوظة مسبقاً عن المستخدم باستخدام مفتاحها.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "المفتاح الذي تريد البحث عن معلومته."
                }
            },
            "required": ["key"]
        })),
        ToolDefinition::new(
            GET_ALL_USER_DATA,
            "يسترجع جميع المعلومات المحفوظة عن المستخدم ككائن JSON. استخدمه للحصول على نظرة عامة على ذاكرة المستخدم أو عند بدء محادثة جديدة.",
        ),
    ]
}
