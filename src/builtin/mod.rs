//! Compiled-in skills.
//!
//! Each skill module exposes a `skill()` constructor for direct
//! registration and a `factory` that directory discovery resolves by
//! name through its manifest.

pub mod data_analysis;
pub mod hello_world;
pub mod text_tools;

use crate::skills::registry::SkillRegistry;
use crate::utilities::errors::SkillError;

/// Register every compiled-in skill directly, without discovery.
pub fn register_builtins(registry: &mut SkillRegistry) -> Result<(), SkillError> {
    registry.register(hello_world::skill())?;
    registry.register(text_tools::skill())?;
    registry.register(data_analysis::skill())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::discovery::builtin_factories;

    #[test]
    fn test_register_builtins() {
        let mut registry = SkillRegistry::new();
        register_builtins(&mut registry).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("hello_world"));
        assert!(registry.contains("text_tools"));
        assert!(registry.contains("data_analysis"));
    }

    #[test]
    fn test_factories_self_register() {
        let names: Vec<&str> = builtin_factories().iter().map(|r| r.name).collect();
        assert!(names.contains(&"data_analysis"));
        assert!(names.contains(&"hello_world"));
        assert!(names.contains(&"text_tools"));
        // Sorted by name.
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
