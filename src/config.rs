//! Skill system configuration.
//!
//! Configuration is layered: coded defaults, then an optional YAML file,
//! then `SKILLGATE_*` environment overrides, validated as a whole. The
//! config owns deployment-level choices (skill directory, merge policy,
//! visibility allow-list, middleware enablement); per-session choices
//! live on the agent.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::skills::discovery::DEFAULT_ENTRYPOINT;
use crate::skills::metadata::Visibility;
use crate::skills::registry::MetadataPredicate;
use crate::state::MergePolicy;
use crate::utilities::errors::SkillError;

/// How the session's unlocked-skills list is merged each turn.
///
/// The serialized form of [`MergePolicy`]; converted with
/// [`SkillSystemConfig::to_merge_policy`], which also applies the FIFO
/// bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMode {
    #[default]
    Replace,
    Accumulate,
    Fifo,
}

impl fmt::Display for StateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StateMode::Replace => "replace",
            StateMode::Accumulate => "accumulate",
            StateMode::Fifo => "fifo",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for StateMode {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(StateMode::Replace),
            "accumulate" => Ok(StateMode::Accumulate),
            "fifo" => Ok(StateMode::Fifo),
            other => Err(SkillError::Config(format!(
                "invalid state_mode '{}', expected replace, accumulate, or fifo",
                other
            ))),
        }
    }
}

/// Deployment configuration for the skill system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillSystemConfig {
    /// Root directory scanned for skill folders.
    pub skills_dir: PathBuf,
    /// Entrypoint manifest file name inside each skill folder.
    pub entrypoint: String,

    /// Unlock-list merge mode.
    pub state_mode: StateMode,
    /// FIFO bound; only meaningful when `state_mode` is `fifo`.
    pub max_concurrent_skills: usize,

    /// Emit per-call middleware diagnostics.
    pub verbose: bool,
    /// Log level for the demo binary's logger initialization.
    pub log_level: String,

    /// Model identifier handed to the chat model adapter.
    pub default_model: String,

    /// When false, the agent offers the full tool surface every call.
    pub middleware_enabled: bool,
    /// Scan `skills_dir` at agent construction.
    pub auto_discover: bool,

    /// Apply the visibility allow-list when assembling the deployment's
    /// skill set.
    pub filter_by_visibility: bool,
    /// Visibilities offered when `filter_by_visibility` is on.
    pub allowed_visibilities: Vec<Visibility>,

    /// Permissions held by this deployment's caller; tools requiring
    /// anything else are hidden.
    pub user_permissions: Vec<String>,
    /// Free-form deployment data, carried untouched.
    pub custom: HashMap<String, Value>,
}

impl Default for SkillSystemConfig {
    fn default() -> Self {
        Self {
            skills_dir: PathBuf::from("./skills"),
            entrypoint: DEFAULT_ENTRYPOINT.to_string(),
            state_mode: StateMode::Replace,
            max_concurrent_skills: 3,
            verbose: false,
            log_level: "info".to_string(),
            default_model: "gpt-4".to_string(),
            middleware_enabled: true,
            auto_discover: true,
            filter_by_visibility: true,
            allowed_visibilities: vec![Visibility::Public],
            user_permissions: Vec::new(),
            custom: HashMap::new(),
        }
    }
}

/// Process-wide default configuration.
pub static DEFAULT_CONFIG: Lazy<SkillSystemConfig> = Lazy::new(SkillSystemConfig::default);

impl SkillSystemConfig {
    /// Parse a YAML config file. Missing keys take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, SkillError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SkillError::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let config: SkillSystemConfig = serde_yaml::from_str(&content).map_err(|e| {
            SkillError::Config(format!("invalid config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration: file (when given and present), then
    /// `SKILLGATE_*` environment overrides, then validation.
    pub fn load(config_path: Option<&Path>) -> Result<Self, SkillError> {
        let mut config = match config_path {
            Some(path) if path.exists() => Self::from_yaml_file(path)?,
            _ => DEFAULT_CONFIG.clone(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Fold `SKILLGATE_*` environment variables into this config.
    pub fn apply_env_overrides(&mut self) -> Result<(), SkillError> {
        if let Ok(value) = std::env::var("SKILLGATE_SKILLS_DIR") {
            self.skills_dir = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("SKILLGATE_STATE_MODE") {
            self.state_mode = value.parse()?;
        }
        if let Ok(value) = std::env::var("SKILLGATE_MAX_CONCURRENT_SKILLS") {
            self.max_concurrent_skills = value.parse().map_err(|_| {
                SkillError::Config(format!(
                    "SKILLGATE_MAX_CONCURRENT_SKILLS must be an integer, got '{}'",
                    value
                ))
            })?;
        }
        if let Ok(value) = std::env::var("SKILLGATE_VERBOSE") {
            self.verbose = env_bool(&value);
        }
        if let Ok(value) = std::env::var("SKILLGATE_LOG_LEVEL") {
            self.log_level = value;
        }
        if let Ok(value) = std::env::var("SKILLGATE_DEFAULT_MODEL") {
            self.default_model = value;
        }
        if let Ok(value) = std::env::var("SKILLGATE_MIDDLEWARE_ENABLED") {
            self.middleware_enabled = env_bool(&value);
        }
        if let Ok(value) = std::env::var("SKILLGATE_AUTO_DISCOVER") {
            self.auto_discover = env_bool(&value);
        }
        Ok(())
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), SkillError> {
        if self.state_mode == StateMode::Fifo && self.max_concurrent_skills == 0 {
            return Err(SkillError::Config(
                "max_concurrent_skills must be at least 1 in fifo mode".to_string(),
            ));
        }
        if self.entrypoint.is_empty() {
            return Err(SkillError::Config("entrypoint cannot be empty".to_string()));
        }
        Ok(())
    }

    /// The runtime merge policy this config selects.
    pub fn to_merge_policy(&self) -> Result<MergePolicy, SkillError> {
        match self.state_mode {
            StateMode::Replace => Ok(MergePolicy::Replace),
            StateMode::Accumulate => Ok(MergePolicy::Accumulate),
            StateMode::Fifo => MergePolicy::fifo(self.max_concurrent_skills).ok_or_else(|| {
                SkillError::Config(
                    "max_concurrent_skills must be at least 1 in fifo mode".to_string(),
                )
            }),
        }
    }

    /// The capability-level predicate implementing the visibility
    /// allow-list, or `None` when visibility filtering is off.
    pub fn visibility_predicate(&self) -> Option<MetadataPredicate> {
        if !self.filter_by_visibility {
            return None;
        }
        let allowed = self.allowed_visibilities.clone();
        Some(Box::new(move |meta| allowed.contains(&meta.visibility)))
    }
}

fn env_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::metadata::SkillMetadata;

    #[test]
    fn test_defaults() {
        let config = SkillSystemConfig::default();
        assert_eq!(config.skills_dir, PathBuf::from("./skills"));
        assert_eq!(config.entrypoint, "skill.yaml");
        assert_eq!(config.state_mode, StateMode::Replace);
        assert_eq!(config.max_concurrent_skills, 3);
        assert!(config.middleware_enabled);
        assert!(config.auto_discover);
        assert_eq!(config.allowed_visibilities, vec![Visibility::Public]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_file_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "skills_dir: /opt/skills\nstate_mode: accumulate\nverbose: true\n",
        )
        .unwrap();

        let config = SkillSystemConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.skills_dir, PathBuf::from("/opt/skills"));
        assert_eq!(config.state_mode, StateMode::Accumulate);
        assert!(config.verbose);
        // Untouched keys keep their defaults.
        assert!(config.middleware_enabled);
        assert_eq!(config.max_concurrent_skills, 3);
    }

    #[test]
    fn test_from_yaml_file_rejects_bad_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "state_mode: sideways\n").unwrap();

        let err = SkillSystemConfig::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, SkillError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        // The only test that touches the environment; keys are removed
        // before it returns.
        std::env::set_var("SKILLGATE_STATE_MODE", "fifo");
        std::env::set_var("SKILLGATE_MAX_CONCURRENT_SKILLS", "5");
        std::env::set_var("SKILLGATE_VERBOSE", "yes");
        std::env::set_var("SKILLGATE_MIDDLEWARE_ENABLED", "0");

        let mut config = SkillSystemConfig::default();
        config.apply_env_overrides().unwrap();

        std::env::remove_var("SKILLGATE_STATE_MODE");
        std::env::remove_var("SKILLGATE_MAX_CONCURRENT_SKILLS");
        std::env::remove_var("SKILLGATE_VERBOSE");
        std::env::remove_var("SKILLGATE_MIDDLEWARE_ENABLED");

        assert_eq!(config.state_mode, StateMode::Fifo);
        assert_eq!(config.max_concurrent_skills, 5);
        assert!(config.verbose);
        assert!(!config.middleware_enabled);
    }

    #[test]
    fn test_to_merge_policy() {
        let mut config = SkillSystemConfig::default();
        assert_eq!(config.to_merge_policy().unwrap(), MergePolicy::Replace);

        config.state_mode = StateMode::Accumulate;
        assert_eq!(config.to_merge_policy().unwrap(), MergePolicy::Accumulate);

        config.state_mode = StateMode::Fifo;
        config.max_concurrent_skills = 2;
        assert_eq!(
            config.to_merge_policy().unwrap(),
            MergePolicy::fifo(2).unwrap()
        );
    }

    #[test]
    fn test_fifo_zero_rejected() {
        let mut config = SkillSystemConfig::default();
        config.state_mode = StateMode::Fifo;
        config.max_concurrent_skills = 0;

        assert!(config.validate().is_err());
        assert!(config.to_merge_policy().is_err());
    }

    #[test]
    fn test_visibility_predicate() {
        let config = SkillSystemConfig::default();
        let pred = config.visibility_predicate().unwrap();

        let public = SkillMetadata::new("a", "public skill");
        let private =
            SkillMetadata::new("b", "private skill").with_visibility(Visibility::Private);
        assert!(pred(&public));
        assert!(!pred(&private));

        let mut open = SkillSystemConfig::default();
        open.filter_by_visibility = false;
        assert!(open.visibility_predicate().is_none());
    }

    #[test]
    fn test_state_mode_round_trip() {
        for mode in [StateMode::Replace, StateMode::Accumulate, StateMode::Fifo] {
            let parsed: StateMode = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
        assert!("sideways".parse::<StateMode>().is_err());
    }
}
