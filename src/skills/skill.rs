//! Skill trait and the standard static implementation.
//!
//! A skill bundles a descriptor, one or more operation tools, and exactly
//! one loader tool. The loader is the only sanctioned way to unlock the
//! skill: it is always visible, and invoking it returns the skill's usage
//! instructions together with an unlock delta for the session.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::metadata::{SkillMetadata, Visibility};
use crate::tools::skill_tool::{SkillTool, ToolFn, ToolOutput};
use crate::utilities::errors::SkillError;

/// Conventional file name for authored skill instructions, resolved
/// relative to the skill directory.
pub const INSTRUCTIONS_FILE: &str = "instructions.md";

/// Conventional prefix for loader tool names (`skill_<name>`).
pub const LOADER_PREFIX: &str = "skill_";

/// A named, versioned bundle of tools with a single loader.
///
/// "Exactly one loader" is enforced by the trait shape: implementations
/// return it from [`Skill::loader_tool`] and keep it out of
/// [`Skill::tools`]. Skills are never mutated after registration.
pub trait Skill: Send + Sync {
    /// The skill's descriptor.
    fn metadata(&self) -> &SkillMetadata;

    /// Regular operation tools. At least one is required.
    fn tools(&self) -> Vec<SkillTool>;

    /// The always-visible loader tool.
    fn loader_tool(&self) -> SkillTool;

    /// Directory the skill was loaded from, when discovered.
    fn skill_dir(&self) -> Option<&Path> {
        None
    }

    /// Usage instructions returned by the loader.
    ///
    /// Prefers an authored `instructions.md` in the skill directory;
    /// falls back to a synthesized description and tool listing.
    fn instructions(&self) -> String {
        let meta = self.metadata();
        let tools = self.tools();
        read_instructions(self.skill_dir(), || synthesize_instructions(meta, &tools))
    }

    /// Check the skill's own consistency before registration.
    ///
    /// The registry calls this once per [`crate::skills::registry::SkillRegistry::register`];
    /// a failing skill is rejected without touching registry state.
    fn validate(&self) -> Result<(), SkillError> {
        let meta = self.metadata();
        if meta.name.is_empty() {
            return Err(SkillError::load("<unnamed>", "skill name cannot be empty"));
        }
        if meta.description.is_empty() {
            return Err(SkillError::load(&meta.name, "skill description cannot be empty"));
        }
        let tools = self.tools();
        if tools.is_empty() {
            return Err(SkillError::load(
                &meta.name,
                "skill must provide at least one tool",
            ));
        }
        let loader = self.loader_tool();
        if loader.name.is_empty() {
            return Err(SkillError::load(&meta.name, "loader tool name cannot be empty"));
        }
        for tool in tools.iter().chain(std::iter::once(&loader)) {
            if tool.skill_name != meta.name {
                return Err(SkillError::load(
                    &meta.name,
                    format!("tool '{}' is not bound to this skill", tool.name),
                ));
            }
        }
        Ok(())
    }
}

/// Read authored instructions from `skill_dir`, or synthesize them.
pub fn read_instructions(skill_dir: Option<&Path>, fallback: impl FnOnce() -> String) -> String {
    if let Some(dir) = skill_dir {
        let path = dir.join(INSTRUCTIONS_FILE);
        if path.exists() {
            if let Ok(text) = std::fs::read_to_string(&path) {
                return text;
            }
        }
    }
    fallback()
}

/// Synthesize fallback instructions from a descriptor and tool list.
pub fn synthesize_instructions(metadata: &SkillMetadata, tools: &[SkillTool]) -> String {
    let tools_desc = tools
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{}\n\nAvailable tools:\n{}\n\nUse these tools to accomplish tasks related to: {}",
        metadata.description,
        tools_desc,
        metadata.tags.join(", ")
    )
}

/// The standard [`Skill`] implementation: metadata and tools assembled
/// up front, loader derived at build time.
pub struct StaticSkill {
    metadata: SkillMetadata,
    tools: Vec<SkillTool>,
    loader: SkillTool,
    skill_dir: Option<PathBuf>,
}

impl fmt::Debug for StaticSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSkill")
            .field("name", &self.metadata.name)
            .field("version", &self.metadata.version)
            .field("tools", &self.tools.len())
            .finish()
    }
}

impl fmt::Display for StaticSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StaticSkill(name='{}', version='{}')",
            self.metadata.name, self.metadata.version
        )
    }
}

impl StaticSkill {
    /// Start building a skill with the given name and description.
    pub fn builder(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> StaticSkillBuilder {
        StaticSkillBuilder {
            metadata: SkillMetadata::new(name, description),
            tools: Vec::new(),
            skill_dir: None,
            loader_description: None,
        }
    }
}

impl Skill for StaticSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    fn tools(&self) -> Vec<SkillTool> {
        self.tools.clone()
    }

    fn loader_tool(&self) -> SkillTool {
        self.loader.clone()
    }

    fn skill_dir(&self) -> Option<&Path> {
        self.skill_dir.as_deref()
    }
}

/// Builder for [`StaticSkill`].
pub struct StaticSkillBuilder {
    metadata: SkillMetadata,
    tools: Vec<SkillTool>,
    skill_dir: Option<PathBuf>,
    loader_description: Option<String>,
}

impl StaticSkillBuilder {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.metadata.version = version.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.metadata.visibility = visibility;
        self
    }

    pub fn dependency(mut self, skill_name: impl Into<String>) -> Self {
        self.metadata.dependencies.push(skill_name.into());
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.metadata.required_permissions.push(permission.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.metadata.author = Some(author.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.metadata.enabled = enabled;
        self
    }

    pub fn skill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skill_dir = Some(dir.into());
        self
    }

    /// Override the derived loader description.
    pub fn loader_description(mut self, description: impl Into<String>) -> Self {
        self.loader_description = Some(description.into());
        self
    }

    /// Add a regular operation tool. Binding to the skill happens at
    /// build time.
    pub fn tool(mut self, tool: SkillTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Assemble the skill: bind every tool to the skill and derive the
    /// loader.
    ///
    /// The loader is named `skill_<name>`, reads authored instructions
    /// from the skill directory on each call, and reports the skill name
    /// as its unlock delta. Validation is deferred to registration.
    pub fn build(self) -> StaticSkill {
        let StaticSkillBuilder {
            metadata,
            tools,
            skill_dir,
            loader_description,
        } = self;

        let tools: Vec<SkillTool> = tools
            .into_iter()
            .map(|t| t.bound_to(&metadata.name, &metadata.required_permissions))
            .collect();

        let loader_name = format!("{}{}", LOADER_PREFIX, metadata.name);
        let loader_desc = loader_description.unwrap_or_else(|| {
            format!(
                "Load the '{}' skill. {}",
                metadata.name, metadata.description
            )
        });

        let fallback = synthesize_instructions(&metadata, &tools);
        let skill_name = metadata.name.clone();
        let dir = skill_dir.clone();
        let func: ToolFn = Arc::new(move |_args| {
            let text = read_instructions(dir.as_deref(), || fallback.clone());
            Ok(ToolOutput::unlock(text, skill_name.clone()))
        });

        let loader = SkillTool::loader(loader_name, loader_desc, func)
            .bound_to(&metadata.name, &metadata.required_permissions);

        StaticSkill {
            metadata,
            tools,
            loader,
            skill_dir,
        }
    }

    /// Build and wrap in an `Arc<dyn Skill>` for registration.
    pub fn build_arc(self) -> Arc<dyn Skill> {
        Arc::new(self.build())
    }
}
