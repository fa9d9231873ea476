//! Minimal demonstration skill: one greeting tool.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::skills::discovery::SkillFactoryRegistration;
use crate::skills::skill::{Skill, StaticSkill, StaticSkillBuilder};
use crate::tools::skill_tool::{SkillTool, ToolOutput};
use crate::utilities::errors::SkillError;

fn builder() -> StaticSkillBuilder {
    StaticSkill::builder("hello_world", "A simple hello world skill.")
        .tag("demo")
        .tag("hello")
        .tool(SkillTool::operation(
            "say_hello",
            "Say hello to a name.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Who to greet" }
                }
            }),
            Arc::new(|args| {
                let name = args.get("name").and_then(|v| v.as_str()).unwrap_or("world");
                Ok(ToolOutput::text(format!("Hello, {}!", name)))
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
        name: "hello_world",
        factory,
    }
}
