//! Skill metadata: the descriptor record for a registered skill.
//!
//! Metadata is what the registry caches, lists, and searches. It is kept
//! separate from the skill object so queries (including queries about
//! disabled skills) never have to touch skill code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who a skill is offered to.
///
/// Visibility is advisory: the registry stores it and search filters on
/// it, but nothing in the core hides a skill because of it. Deployments
/// that want visibility-based gating install a metadata filter (see
/// [`crate::config::SkillSystemConfig::visibility_predicate`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Offered to every session.
    #[default]
    Public,
    /// Offered to first-party surfaces only.
    Internal,
    /// Offered only when explicitly allowed.
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "internal" => Ok(Visibility::Internal),
            "private" => Ok(Visibility::Private),
            other => Err(format!("Unknown visibility: {}", other)),
        }
    }
}

/// Descriptor for a skill.
///
/// `name` is the registry key and must be unique; `dependencies` is
/// informational only and never resolved or enforced by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Unique skill name (registry key).
    pub name: String,
    /// What the skill does, shown to models in the loader description.
    pub description: String,
    /// Skill version string.
    #[serde(default = "default_version")]
    pub version: String,
    /// Search tags, in declaration order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Who the skill is offered to.
    #[serde(default)]
    pub visibility: Visibility,
    /// Names of other skills this one builds on. Informational only.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Permissions a caller should hold before using this skill's tools.
    #[serde(default)]
    pub required_permissions: Vec<String>,
    /// Optional author attribution.
    #[serde(default)]
    pub author: Option<String>,
    /// Disabled skills stay registered and searchable but contribute no
    /// tools to any assembled set.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_enabled() -> bool {
    true
}

impl SkillMetadata {
    /// Create metadata with the given name and description; everything
    /// else takes its default.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version: default_version(),
            tags: Vec::new(),
            visibility: Visibility::default(),
            dependencies: Vec::new(),
            required_permissions: Vec::new(),
            author: None,
            enabled: true,
        }
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replace the tag list.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Replace the dependency list.
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Replace the required permission list.
    pub fn with_required_permissions(mut self, permissions: Vec<String>) -> Self {
        self.required_permissions = permissions;
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set whether the skill is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check whether any of this skill's tags appears in `tags`.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}
