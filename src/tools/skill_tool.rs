//! Tool handles exposed to chat models.
//!
//! A [`SkillTool`] is an immutable, clone-able handle around a tool
//! function. Every tool belongs to a skill and is either the skill's
//! loader (always visible, unlocks the skill when called) or a regular
//! operation (visible only after the skill is unlocked). Handles are
//! shared read-only once a skill is registered, so invocation takes
//! `&self` and any usage accounting lives outside the tool (see
//! [`crate::tools::filters::UsageLedger`]).

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::utilities::errors::BoxError;

/// Type alias for a tool function.
///
/// Receives the call arguments as a JSON object and returns a
/// [`ToolOutput`].
pub type ToolFn = Arc<dyn Fn(Value) -> Result<ToolOutput, BoxError> + Send + Sync>;

/// Whether a tool is a skill's loader or a regular operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// The skill's single always-visible entry point. Calling it returns
    /// the skill's instructions and unlocks the skill for the session.
    Loader,
    /// A regular operation, visible only while its skill is unlocked.
    Operation,
}

/// Result of a tool invocation.
///
/// `unlocked_skills` is the state delta a loader reports back to the
/// session; regular operations leave it empty. The middleware and agent
/// treat it as data to merge, never as something to act on immediately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text returned to the model as the tool result.
    pub content: String,
    /// Skill names this invocation unlocked.
    pub unlocked_skills: Vec<String>,
}

impl ToolOutput {
    /// A plain text result with no state delta.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            unlocked_skills: Vec::new(),
        }
    }

    /// A result that unlocks one skill.
    pub fn unlock(content: impl Into<String>, skill: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            unlocked_skills: vec![skill.into()],
        }
    }
}

impl From<String> for ToolOutput {
    fn from(content: String) -> Self {
        ToolOutput::text(content)
    }
}

impl From<&str> for ToolOutput {
    fn from(content: &str) -> Self {
        ToolOutput::text(content)
    }
}

/// A tool handle offered to chat models.
#[derive(Clone)]
pub struct SkillTool {
    /// The tool name as offered to the model.
    pub name: String,
    /// A description of what the tool does.
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub args_schema: Value,
    /// Loader or regular operation.
    pub kind: ToolKind,
    /// Name of the owning skill. Stamped when the skill is built.
    pub skill_name: String,
    /// Permissions inherited from the owning skill's metadata.
    pub required_permissions: Vec<String>,
    /// The function to run when the tool is called.
    pub func: ToolFn,
}

impl fmt::Debug for SkillTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillTool")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("skill_name", &self.skill_name)
            .field("required_permissions", &self.required_permissions)
            .finish()
    }
}

impl fmt::Display for SkillTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SkillTool(name='{}', skill='{}')", self.name, self.skill_name)
    }
}

impl SkillTool {
    /// Create a regular operation tool.
    ///
    /// The owning skill stamps itself onto the tool at build time via
    /// [`SkillTool::bound_to`]; until then `skill_name` is empty.
    pub fn operation(
        name: impl Into<String>,
        description: impl Into<String>,
        args_schema: Value,
        func: ToolFn,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args_schema,
            kind: ToolKind::Operation,
            skill_name: String::new(),
            required_permissions: Vec::new(),
            func,
        }
    }

    /// Create a loader tool.
    ///
    /// Loaders take no arguments; the schema is the empty object schema.
    pub fn loader(
        name: impl Into<String>,
        description: impl Into<String>,
        func: ToolFn,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args_schema: Self::empty_schema(),
            kind: ToolKind::Loader,
            skill_name: String::new(),
            required_permissions: Vec::new(),
            func,
        }
    }

    /// The schema for a tool that takes no arguments.
    pub fn empty_schema() -> Value {
        json!({ "type": "object", "properties": {} })
    }

    /// Stamp the owning skill's name and required permissions onto the
    /// tool.
    pub fn bound_to(mut self, skill_name: &str, required_permissions: &[String]) -> Self {
        self.skill_name = skill_name.to_string();
        self.required_permissions = required_permissions.to_vec();
        self
    }

    /// Whether this tool is a loader.
    pub fn is_loader(&self) -> bool {
        self.kind == ToolKind::Loader
    }

    /// Normalize raw call arguments to a JSON object.
    ///
    /// Accepts an object, a JSON string encoding an object, or null
    /// (treated as the empty object). Models frequently return arguments
    /// as a string, so both forms must work.
    pub fn normalize_args(raw: Value) -> Result<Value, BoxError> {
        match raw {
            Value::Object(map) => Ok(Value::Object(map)),
            Value::Null => Ok(Value::Object(serde_json::Map::new())),
            Value::String(s) => {
                let parsed: serde_json::Map<String, Value> = serde_json::from_str(&s)
                    .map_err(|e| format!("Failed to parse arguments as JSON: {}", e))?;
                Ok(Value::Object(parsed))
            }
            _ => Err("Arguments must be a JSON object or string".into()),
        }
    }

    /// Invoke the tool synchronously.
    pub fn invoke(&self, args: Value) -> Result<ToolOutput, BoxError> {
        let args = Self::normalize_args(args)?;
        (self.func)(args)
    }

    /// Invoke the tool asynchronously.
    ///
    /// Delegates to [`SkillTool::invoke`]; tool functions in this crate
    /// are synchronous closures.
    pub async fn ainvoke(&self, args: Value) -> Result<ToolOutput, BoxError> {
        self.invoke(args)
    }

    /// The JSON shape offered to chat models for this tool.
    pub fn to_schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.args_schema,
        })
    }
}
