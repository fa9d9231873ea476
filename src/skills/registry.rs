//! Skill registry: registration, lookup, search, and tool-set assembly.
//!
//! The registry is the single source of truth for which skills exist.
//! It is populated once during a single-threaded startup phase (direct
//! registration or directory discovery) and read concurrently afterwards;
//! it holds no interior locks. Alongside each skill it caches the skill's
//! descriptor, so metadata queries never call back into skill code.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use super::discovery::{builtin_factories, SkillFactory, SkillManifest};
use super::metadata::{SkillMetadata, Visibility};
use super::skill::Skill;
use crate::diagnostics::{default_sink, DiagnosticsSink};
use crate::tools::skill_tool::SkillTool;
use crate::utilities::errors::SkillError;

/// Capability-level predicate over skill descriptors.
///
/// Used by listing and assembly to decide which skills a deployment
/// offers at all. Operation-level filtering is a separate concern, see
/// [`crate::tools::filters::ToolFilter`].
pub type MetadataPredicate = Box<dyn Fn(&SkillMetadata) -> bool + Send + Sync>;

/// In-memory store of skills keyed by name.
///
/// Invariant: the skill map and the descriptor cache always hold the
/// same key set, in the same (registration) order. Every mutation path
/// updates both or neither.
pub struct SkillRegistry {
    skills: IndexMap<String, Arc<dyn Skill>>,
    metadata_cache: IndexMap<String, SkillMetadata>,
    factories: HashMap<String, SkillFactory>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillRegistry")
            .field("skills", &self.skills.keys().collect::<Vec<_>>())
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillRegistry {
    /// Create an empty registry reporting through the default sink.
    pub fn new() -> Self {
        Self::with_sink(default_sink())
    }

    /// Create an empty registry reporting through `sink`.
    pub fn with_sink(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            skills: IndexMap::new(),
            metadata_cache: IndexMap::new(),
            factories: HashMap::new(),
            sink,
        }
    }

    /// Create a registry pre-seeded with every compiled-in factory.
    pub fn with_builtin_factories() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_factories();
        registry
    }

    /// Register every compiled-in factory with this registry.
    pub fn register_builtin_factories(&mut self) {
        for entry in builtin_factories() {
            self.factories.insert(entry.name.to_string(), entry.factory);
        }
    }

    /// Register a factory under `name` for manifest resolution.
    pub fn register_factory(&mut self, name: impl Into<String>, factory: SkillFactory) {
        self.factories.insert(name.into(), factory);
    }

    // -----------------------------------------------------------------
    // Registration and lookup
    // -----------------------------------------------------------------

    /// Register a skill.
    ///
    /// Validates first; on failure the registry is unchanged. Registering
    /// a name that already exists overwrites the previous entry with a
    /// warning (last registration wins, keeping its original position in
    /// listing order).
    pub fn register(&mut self, skill: Arc<dyn Skill>) -> Result<(), SkillError> {
        skill.validate()?;
        let meta = skill.metadata().clone();
        let name = meta.name.clone();

        if self.skills.contains_key(&name) {
            self.sink
                .warn(&format!("Skill '{}' is already registered, overwriting", name));
        }

        self.skills.insert(name.clone(), skill);
        self.metadata_cache.insert(name.clone(), meta.clone());
        self.sink
            .info(&format!("Registered skill: {} v{}", name, meta.version));
        Ok(())
    }

    /// Remove a skill by name. A missing name is a no-op.
    pub fn unregister(&mut self, skill_name: &str) {
        // shift_remove keeps the remaining entries in registration order.
        let removed = self.skills.shift_remove(skill_name).is_some();
        self.metadata_cache.shift_remove(skill_name);
        if removed {
            self.sink.info(&format!("Unregistered skill: {}", skill_name));
        }
    }

    /// Get a skill by name.
    pub fn get(&self, skill_name: &str) -> Result<Arc<dyn Skill>, SkillError> {
        self.skills
            .get(skill_name)
            .cloned()
            .ok_or_else(|| SkillError::NotFound(skill_name.to_string()))
    }

    /// Get a skill's cached descriptor by name.
    pub fn get_metadata(&self, skill_name: &str) -> Result<SkillMetadata, SkillError> {
        self.metadata_cache
            .get(skill_name)
            .cloned()
            .ok_or_else(|| SkillError::NotFound(skill_name.to_string()))
    }

    /// Number of registered skills.
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Whether the registry holds no skills.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Whether a skill with this name is registered.
    pub fn contains(&self, skill_name: &str) -> bool {
        self.skills.contains_key(skill_name)
    }

    // -----------------------------------------------------------------
    // Listing and search
    // -----------------------------------------------------------------

    /// List skill names in registration order, optionally filtered by a
    /// descriptor predicate.
    pub fn list_skills(&self, filter: Option<&MetadataPredicate>) -> Vec<String> {
        match filter {
            None => self.metadata_cache.keys().cloned().collect(),
            Some(pred) => self
                .metadata_cache
                .iter()
                .filter(|(_, meta)| pred(meta))
                .map(|(name, _)| name.clone())
                .collect(),
        }
    }

    /// Search descriptors by text, tags, and visibility.
    ///
    /// `query` is a case-insensitive substring match against name or
    /// description; the empty query matches everything. `tags` matches
    /// if any given tag appears on the skill. Criteria are combined with
    /// AND. Results keep registration order.
    pub fn search(
        &self,
        query: &str,
        tags: Option<&[String]>,
        visibility: Option<Visibility>,
    ) -> Vec<SkillMetadata> {
        let query_lower = query.to_lowercase();
        self.metadata_cache
            .values()
            .filter(|meta| {
                if !query_lower.is_empty()
                    && !meta.name.to_lowercase().contains(&query_lower)
                    && !meta.description.to_lowercase().contains(&query_lower)
                {
                    return false;
                }
                if let Some(tags) = tags {
                    if !tags.is_empty() && !meta.has_any_tag(tags) {
                        return false;
                    }
                }
                if let Some(vis) = visibility {
                    if meta.visibility != vis {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------
    // Tool-set assembly
    // -----------------------------------------------------------------

    /// Loader tool of every enabled skill surviving the filter.
    pub fn loader_tools(&self, filter: Option<&MetadataPredicate>) -> Vec<SkillTool> {
        let mut loaders = Vec::new();
        for name in self.list_skills(filter) {
            if let Some(skill) = self.skills.get(&name) {
                if skill.metadata().enabled {
                    loaders.push(skill.loader_tool());
                }
            }
        }
        loaders
    }

    /// Every enabled surviving skill's loader followed by its regular
    /// tools, skills in registration order.
    pub fn all_tools(&self, filter: Option<&MetadataPredicate>) -> Vec<SkillTool> {
        let mut tools = Vec::new();
        for name in self.list_skills(filter) {
            if let Some(skill) = self.skills.get(&name) {
                if skill.metadata().enabled {
                    tools.push(skill.loader_tool());
                    tools.extend(skill.tools());
                }
            }
        }
        tools
    }

    /// The tool set for a session's unlocked skills: all loaders, plus
    /// the regular tools of each unlocked, registered, enabled skill.
    ///
    /// Loaders are included regardless of unlock state so a locked skill
    /// can always be unlocked. Unknown names are ignored rather than
    /// rejected: unlock names are untrusted state echoed back from
    /// model-driven turns, and one stale name must not take down the
    /// turn. A name repeated in `unlocked` contributes its tools once.
    pub fn tools_for_unlocked(&self, unlocked: &[String]) -> Vec<SkillTool> {
        let mut tools = self.loader_tools(None);
        let mut seen: HashSet<&str> = HashSet::new();

        for name in unlocked {
            if !seen.insert(name.as_str()) {
                continue;
            }
            if let Some(skill) = self.skills.get(name.as_str()) {
                if skill.metadata().enabled {
                    tools.extend(skill.tools());
                }
            }
        }
        tools
    }

    // -----------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------

    /// Discover and register skills from subdirectories of `skills_dir`.
    ///
    /// Each immediate subdirectory containing `entrypoint` is loaded
    /// independently: its manifest is parsed, the named factory is run
    /// with the subdirectory path, and the produced skill is registered.
    /// Any failure is reported through the sink and skips only that
    /// subdirectory. Returns the number of skills registered.
    pub fn discover_and_load(&mut self, skills_dir: &Path, entrypoint: &str) -> usize {
        if !skills_dir.exists() {
            self.sink
                .warn(&format!("Skill directory not found: {}", skills_dir.display()));
            return 0;
        }

        let entries = match std::fs::read_dir(skills_dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.sink.error(&format!(
                    "Cannot read skill directory {}: {}",
                    skills_dir.display(),
                    e
                ));
                return 0;
            }
        };

        let mut loaded = 0;
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    self.sink
                        .error(&format!("Cannot read directory entry: {}", e));
                    continue;
                }
            };
            if !path.is_dir() {
                continue;
            }
            let manifest_path = path.join(entrypoint);
            if !manifest_path.exists() {
                continue;
            }

            match self.load_skill_dir(&path, &manifest_path) {
                Ok(()) => loaded += 1,
                Err(e) => {
                    self.sink
                        .error(&format!("Failed to load skill from {}: {}", path.display(), e));
                }
            }
        }

        self.sink.info(&format!(
            "Loaded {} skills from {}",
            loaded,
            skills_dir.display()
        ));
        loaded
    }

    /// Load one skill directory: manifest, factory, register.
    fn load_skill_dir(&mut self, skill_dir: &Path, manifest_path: &Path) -> Result<(), SkillError> {
        let manifest = SkillManifest::from_file(manifest_path)?;
        let dir_name = skill_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| skill_dir.display().to_string());

        let factory = self.factories.get(&manifest.factory).copied().ok_or_else(|| {
            SkillError::load(&dir_name, format!("unknown factory '{}'", manifest.factory))
        })?;

        let skill = factory(skill_dir)?;
        self.register(Arc::from(skill))
    }
}
