//! Tool handles and tool filtering.
//!
//! This module provides the tool infrastructure: the [`SkillTool`] handle
//! skills expose to chat models, the [`ToolOutput`] carrier for results
//! and unlock deltas, and the operation-level filters the middleware can
//! apply on top of assembly.

pub mod filters;
pub mod skill_tool;

// Re-exports for convenience
pub use filters::{allow_tools, block_tools, require_permissions, ToolFilter, UsageLedger};
pub use skill_tool::{SkillTool, ToolFn, ToolKind, ToolOutput};
