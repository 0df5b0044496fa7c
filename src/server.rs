//! MCP adapter: exposes the [`Dispatcher`] as an rmcp server handler.

use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer};
use serde_json::Value;

use crate::error::AscError;
use crate::tools::{ContentBlock, Dispatcher, ToolCall, ToolDescriptor, ToolResult};

pub const SERVER_NAME: &str = "appstoreconnect-mcp";

const INSTRUCTIONS: &str = "App Store Connect tools: apps and builds, dSYM download and \
     Firebase Crashlytics upload, local Xcode archives, certificates, bundle IDs, provisioning \
     profiles, and IPA upload/validation.";

#[derive(Clone)]
pub struct AscServer {
    dispatcher: Arc<Dispatcher>,
}

impl AscServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

fn to_tool(descriptor: &ToolDescriptor) -> Tool {
    let schema = match &descriptor.input_schema {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    Tool::new(descriptor.name, descriptor.description, Arc::new(schema))
}

fn to_call_result(result: ToolResult) -> CallToolResult {
    let content = result
        .content
        .into_iter()
        .map(|block| match block {
            ContentBlock::Text(text) => Content::text(text),
        })
        .collect();
    if result.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

/// Caller mistakes are "invalid params", an unknown name is "invalid request", everything else
/// is an internal error carrying the failure text.
pub fn to_mcp_error(error: &AscError) -> McpError {
    let message = error.to_string();
    match error {
        AscError::UnknownTool(_) => McpError::invalid_request(message, None),
        e if e.is_input_error() => McpError::invalid_params(message, None),
        _ => McpError::internal_error(message, None),
    }
}

impl ServerHandler for AscServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_owned();
        server_info.version = env!("CARGO_PKG_VERSION").to_owned();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = server_info;
        info.instructions = Some(INSTRUCTIONS.to_owned());
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self.dispatcher.list_tools().iter().map(to_tool).collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        let call = ToolCall::new(request.name.as_ref(), arguments);

        self.dispatcher
            .dispatch(call)
            .await
            .map(to_call_result)
            .map_err(|e| to_mcp_error(&e))
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorCode;
    use serde_json::json;

    use super::*;

    #[test]
    fn errors_map_to_protocol_channels() {
        assert_eq!(
            to_mcp_error(&AscError::MissingParameter("app_id".into())).code,
            ErrorCode::INVALID_PARAMS
        );
        assert_eq!(
            to_mcp_error(&AscError::InvalidBundleId("com".into())).code,
            ErrorCode::INVALID_PARAMS
        );
        assert_eq!(
            to_mcp_error(&AscError::UnknownTool("nope".into())).code,
            ErrorCode::INVALID_REQUEST
        );
        let error = to_mcp_error(&AscError::RateLimited);
        assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
        assert!(error.message.contains("rate limit"));
    }

    #[test]
    fn error_flag_survives_conversion() {
        let result = to_call_result(ToolResult::error_text("Build validation failed"));
        assert_eq!(result.is_error, Some(true));

        let result = to_call_result(ToolResult::text("ok"));
        assert_eq!(result.is_error, Some(false));
    }

    #[test]
    fn descriptor_schema_is_carried_over() {
        let descriptor = ToolDescriptor::new(
            "list_builds",
            "List builds",
            json!({ "app_id": { "type": "string" } }),
            &["app_id"],
        );
        let tool = to_tool(&descriptor);
        assert_eq!(tool.name, "list_builds");
        assert_eq!(tool.input_schema["required"], json!(["app_id"]));
    }
}
