//! # skillgate
//!
//! Progressive skill disclosure for conversational agents.
//!
//! Skills bundle tools behind an always-visible loader: a model call
//! starts with loaders only, invoking a loader unlocks that skill for
//! the session, and every subsequent model call is offered the tool set
//! recomputed from the session's unlocked skills. The crate provides
//! the skill registry with directory discovery, the unlock-state merge
//! policies, the exposure middleware for sync and async model calls,
//! and an agent loop tying them together.

pub mod agent;
pub mod builtin;
pub mod config;
pub mod diagnostics;
pub mod llms;
pub mod middleware;
pub mod skills;
pub mod state;
pub mod tools;
pub mod utilities;

// Re-exports matching the crate's primary surface
pub use agent::{SkillAgent, SkillAgentBuilder};
pub use config::{SkillSystemConfig, StateMode};
pub use middleware::SkillMiddleware;
pub use skills::metadata::{SkillMetadata, Visibility};
pub use skills::registry::SkillRegistry;
pub use skills::skill::{Skill, StaticSkill};
pub use state::{MergePolicy, SessionState};
pub use tools::skill_tool::{SkillTool, ToolOutput};
pub use utilities::errors::{BoxError, SkillError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
