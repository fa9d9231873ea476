//! Skill system: descriptors, skills, discovery, and the registry.
//!
//! A skill is a named bundle of tools behind a single loader. The
//! registry stores validated skills with a descriptor cache, answers
//! listing/search queries, and assembles the tool set for a session's
//! unlocked skills. Discovery walks a directory of skill folders whose
//! manifests name registered factories.

pub mod discovery;
pub mod metadata;
pub mod registry;
pub mod skill;

// Re-exports for convenience
pub use discovery::{
    builtin_factories, SkillFactory, SkillFactoryRegistration, SkillManifest, DEFAULT_ENTRYPOINT,
};
pub use metadata::{SkillMetadata, Visibility};
pub use registry::{MetadataPredicate, SkillRegistry};
pub use skill::{Skill, StaticSkill, StaticSkillBuilder, INSTRUCTIONS_FILE, LOADER_PREFIX};
