//! Chat model seam.
//!
//! This module provides the model-facing surface of the skill system:
//!
//! - [`base_model`] - The [`ChatModel`] trait and typed message/request types
//! - [`scripted`] - A canned-response model for tests and demos
//!
//! Provider adapters implement [`ChatModel`] outside this crate.

pub mod base_model;
pub mod scripted;

// Re-exports for convenience
pub use base_model::{ChatMessage, ChatModel, ModelRequest, ModelResponse, Role, ToolCall};
pub use scripted::ScriptedModel;
