pub mod apps;
pub mod args;
pub mod bundle_ids;
pub mod certificates;
pub mod dsyms;
pub mod firebase;
pub mod profiles;
pub mod registry;
pub mod transporter;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use crate::archives::ArchiveScanner;
use crate::asc::AppStoreConnect;
use crate::process::firebase::FirebaseCli;
use crate::process::transporter::TransporterCli;

pub use registry::Dispatcher;

/// Named argument bag of one call.
pub type Arguments = Map<String, Value>;

/// An inbound call: tool name plus its raw arguments.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Arguments,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
}

/// Outcome of a call that ran to completion. `is_error` marks diagnostic results that are not
/// hard failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            is_error: false,
        }
    }

    pub fn error_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            is_error: true,
        }
    }

    /// All text blocks joined by newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text(text) => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Catalog entry advertised to clients.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(
        name: &'static str,
        description: &'static str,
        properties: Value,
        required: &[&str],
    ) -> Self {
        Self {
            name,
            description,
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

pub(crate) fn string_prop(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub(crate) fn enum_prop(description: &str, values: &[&str]) -> Value {
    json!({ "type": "string", "description": description, "enum": values })
}

pub(crate) fn string_array_prop(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

/// Shared collaborators handed to every handler. Nothing in here is per-call state.
#[derive(Clone)]
pub struct ToolContext {
    pub gateway: Arc<dyn AppStoreConnect>,
    pub firebase: Arc<FirebaseCli>,
    pub transporter: Arc<TransporterCli>,
    pub archives: ArchiveScanner,
    pub clock: fn() -> DateTime<Utc>,
}

impl ToolContext {
    pub fn new(
        gateway: Arc<dyn AppStoreConnect>,
        firebase: FirebaseCli,
        transporter: TransporterCli,
        archives: ArchiveScanner,
    ) -> Self {
        Self {
            gateway,
            firebase: Arc::new(firebase),
            transporter: Arc::new(transporter),
            archives,
            clock: Utc::now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_object_arguments_become_empty() {
        let call = ToolCall::new("list_apps", Value::Null);
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn error_results_are_flagged() {
        let result = ToolResult::error_text("Build validation failed");
        assert!(result.is_error);
        assert_eq!(result.joined_text(), "Build validation failed");
    }

    #[test]
    fn descriptor_schema_is_an_object() {
        let descriptor = ToolDescriptor::new(
            "get_app_status",
            "Get app status",
            json!({ "app_id": string_prop("App ID") }),
            &[],
        );
        assert_eq!(descriptor.input_schema["type"], "object");
        assert_eq!(descriptor.input_schema["required"], json!([]));
    }
}
