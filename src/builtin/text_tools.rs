//! Text manipulation skill.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::skills::discovery::SkillFactoryRegistration;
use crate::skills::skill::{Skill, StaticSkill, StaticSkillBuilder};
use crate::tools::skill_tool::{SkillTool, ToolOutput};
use crate::utilities::errors::{BoxError, SkillError};

fn text_arg(args: &Value) -> Result<&str, BoxError> {
    args.get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BoxError::from("'text' must be a string"))
}

fn text_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": { "type": "string", "description": "Text to operate on" }
        },
        "required": ["text"]
    })
}

fn builder() -> StaticSkillBuilder {
    StaticSkill::builder("text_tools", "Text manipulation utilities.")
        .tag("text")
        .tag("utility")
        .tool(SkillTool::operation(
            "count_words",
            "Count whitespace-separated words in a text.",
            text_schema(),
            Arc::new(|args| {
                let text = text_arg(&args)?;
                Ok(ToolOutput::text(text.split_whitespace().count().to_string()))
            }),
        ))
        .tool(SkillTool::operation(
            "reverse_text",
            "Reverse a text character by character.",
            text_schema(),
            Arc::new(|args| {
                let text = text_arg(&args)?;
                Ok(ToolOutput::text(text.chars().rev().collect::<String>()))
            }),
        ))
}

/// The skill, without a backing directory.
pub fn skill() -> Arc<dyn Skill> {
    builder().build_arc()
}

/// Factory entry point used by directory discovery.
pub fn factory(dir: &Path) -> Result<Box<dyn Skill>, SkillError> {
    Ok(Box::new(builder().skill_dir(dir).build()))
}

inventory::submit! {
    SkillFactoryRegistration {
        name: "text_tools",
        factory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str) -> SkillTool {
        skill()
            .tools()
            .into_iter()
            .find(|t| t.name == name)
            .unwrap()
    }

    #[test]
    fn test_count_words() {
        let out = tool("count_words")
            .invoke(json!({ "text": "the quick brown fox" }))
            .unwrap();
        assert_eq!(out.content, "4");
    }

    #[test]
    fn test_reverse_text() {
        let out = tool("reverse_text")
            .invoke(json!({ "text": "abc" }))
            .unwrap();
        assert_eq!(out.content, "cba");
    }

    #[test]
    fn test_missing_text_is_an_error() {
        assert!(tool("count_words").invoke(json!({})).is_err());
    }

    #[test]
    fn test_skill_is_well_formed() {
        let skill = skill();
        assert!(skill.validate().is_ok());
        assert_eq!(skill.loader_tool().name, "skill_text_tools");
    }
}
