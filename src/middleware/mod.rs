//! Model-call middleware.

pub mod skill_middleware;

// Re-exports for convenience
pub use skill_middleware::SkillMiddleware;
