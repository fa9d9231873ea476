//! Skill discovery support: factories and manifests.
//!
//! A skill directory is an immediate subdirectory of the configured
//! skills root containing an entrypoint manifest (`skill.yaml` by
//! default). The manifest names a factory registered with the registry;
//! the factory receives the subdirectory path and produces the skill.
//! Factories compiled into the binary self-register through `inventory`
//! and are picked up by [`builtin_factories`].

use std::path::Path;

use serde::Deserialize;

use super::skill::Skill;
use crate::utilities::errors::SkillError;

/// Default entrypoint file name looked for in each skill directory.
pub const DEFAULT_ENTRYPOINT: &str = "skill.yaml";

/// A factory producing a skill from its directory.
///
/// Plain function pointer so factories can be registered as static data.
pub type SkillFactory = fn(&Path) -> Result<Box<dyn Skill>, SkillError>;

/// Self-registration entry for a compiled-in skill factory.
///
/// Skill modules register themselves with
/// `inventory::submit!(SkillFactoryRegistration { name: "...", factory: ... })`.
pub struct SkillFactoryRegistration {
    /// Factory name referenced by manifests.
    pub name: &'static str,
    /// The factory function.
    pub factory: SkillFactory,
}

inventory::collect!(SkillFactoryRegistration);

/// All compiled-in factory registrations, sorted by name.
pub fn builtin_factories() -> Vec<&'static SkillFactoryRegistration> {
    let mut entries: Vec<&'static SkillFactoryRegistration> =
        inventory::iter::<SkillFactoryRegistration>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Entrypoint manifest found in a skill directory.
///
/// Only `factory` is required; unknown keys are ignored so skill authors
/// can keep their own metadata beside it.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillManifest {
    /// Name of the registered factory that builds this skill.
    pub factory: String,
}

impl SkillManifest {
    /// Parse a manifest file.
    pub fn from_file(path: &Path) -> Result<Self, SkillError> {
        let dir_name = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let content = std::fs::read_to_string(path)
            .map_err(|e| SkillError::load(&dir_name, format!("cannot read manifest: {}", e)))?;
        let manifest: SkillManifest = serde_yaml::from_str(&content)
            .map_err(|e| SkillError::load(&dir_name, format!("invalid manifest: {}", e)))?;

        if manifest.factory.is_empty() {
            return Err(SkillError::load(&dir_name, "manifest 'factory' key is empty"));
        }
        Ok(manifest)
    }
}
