//! Error types for the skill system.

use thiserror::Error;

/// Boxed error type used at the model and tool execution seams.
///
/// Tool functions and chat model implementations return arbitrary errors;
/// callers that need to inspect them downcast, everyone else formats them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the skill registry and its collaborators.
#[derive(Debug, Error)]
pub enum SkillError {
    /// A strict lookup referenced a skill that is not registered.
    #[error("Skill not found: {0}")]
    NotFound(String),

    /// A skill could not be loaded or failed validation.
    ///
    /// `skill` names the skill the operation was trying to produce; for
    /// discovery failures where no name is known yet, the subdirectory
    /// name stands in.
    #[error("Failed to load skill '{skill}': {reason}")]
    Load { skill: String, reason: String },

    /// A permission check rejected access to a skill's tools.
    ///
    /// The core never raises this on its own; it is the error shape
    /// permission-checking collaborators use when they prefer rejection
    /// over silent filtering.
    #[error("Permission denied for skill '{skill}': requires '{permission}'")]
    Permission { skill: String, permission: String },

    /// Configuration was invalid (bad file, bad env override, bad policy).
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SkillError {
    /// Convenience constructor for load failures.
    pub fn load(skill: impl Into<String>, reason: impl Into<String>) -> Self {
        SkillError::Load {
            skill: skill.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SkillError::NotFound("math".to_string());
        assert_eq!(err.to_string(), "Skill not found: math");

        let err = SkillError::load("broken", "missing loader");
        assert_eq!(
            err.to_string(),
            "Failed to load skill 'broken': missing loader"
        );

        let err = SkillError::Permission {
            skill: "admin".to_string(),
            permission: "admin:write".to_string(),
        };
        assert!(err.to_string().contains("admin:write"));
    }
}
