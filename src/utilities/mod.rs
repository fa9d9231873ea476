//! Shared utilities.

pub mod errors;
pub mod helpers;

// Re-exports for convenience
pub use errors::{BoxError, SkillError};
pub use helpers::{format_registry_status, format_skill_list, validate_skill_structure};
