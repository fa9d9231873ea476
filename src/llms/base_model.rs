//! Chat model seam.
//!
//! Provider adapters live outside this crate; the skill system only
//! needs a narrow surface: hand over messages plus the turn's tool set,
//! get back text and any requested tool calls. Implementations should
//! handle provider error cases themselves and surface them as errors,
//! which the middleware and agent propagate untouched.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::skill_tool::SkillTool;
use crate::utilities::errors::BoxError;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back in the tool message.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Call arguments as a JSON object (or a JSON-encoded string).
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// For `Role::Tool` messages: the id of the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For assistant messages: the calls the model requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    /// An assistant message without tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// An assistant message carrying tool calls.
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// A tool result message answering `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(Role::Tool, content)
        }
    }
}

/// An outgoing model invocation: conversation so far plus the tool set
/// offered for this call.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<SkillTool>,
}

impl ModelRequest {
    /// A request with no tools attached.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
        }
    }

    /// Attach a tool set.
    pub fn with_tools(mut self, tools: Vec<SkillTool>) -> Self {
        self.tools = tools;
        self
    }

    /// Names of the tools offered by this request.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// The tool set as provider-facing JSON schemas.
    pub fn tool_schemas(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.to_schema()).collect()
    }
}

/// A model's reply: text plus any requested tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelResponse {
    /// A plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A reply requesting tool calls.
    pub fn with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }
}

/// Interface implemented by chat model adapters.
#[async_trait]
pub trait ChatModel: Send + Sync + fmt::Debug {
    /// Model identifier, for diagnostics.
    fn model(&self) -> &str;

    /// Invoke the model synchronously.
    fn call(&self, request: &ModelRequest) -> Result<ModelResponse, BoxError>;

    /// Invoke the model asynchronously.
    ///
    /// Defaults to the synchronous path; providers with native async
    /// clients override this.
    async fn acall(&self, request: &ModelRequest) -> Result<ModelResponse, BoxError> {
        self.call(request)
    }
}
