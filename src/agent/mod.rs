//! Agent layer combining model, registry, middleware, and session state.

pub mod skill_agent;

// Re-exports for convenience
pub use skill_agent::{SkillAgent, SkillAgentBuilder};
