//! Rendering and validation helpers for skill tooling.

use std::path::Path;

use crate::skills::metadata::SkillMetadata;
use crate::skills::registry::SkillRegistry;
use crate::skills::skill::INSTRUCTIONS_FILE;

/// Format a list of skill descriptors into readable text.
pub fn format_skill_list(skills: &[SkillMetadata]) -> String {
    if skills.is_empty() {
        return "No skills available.".to_string();
    }

    let mut output = String::from("Available Skills:\n\n");
    for (i, meta) in skills.iter().enumerate() {
        output.push_str(&format!("{}. **{}** (v{})\n", i + 1, meta.name, meta.version));
        output.push_str(&format!("   Description: {}\n", meta.description));
        output.push_str(&format!("   Tags: {}\n", meta.tags.join(", ")));
        output.push_str(&format!("   Visibility: {}\n", meta.visibility));
        if !meta.dependencies.is_empty() {
            output.push_str(&format!(
                "   Dependencies: {}\n",
                meta.dependencies.join(", ")
            ));
        }
        output.push('\n');
    }
    output
}

/// Render a status summary for a registry.
pub fn format_registry_status(registry: &SkillRegistry) -> String {
    let skill_names = registry.list_skills(None);
    if skill_names.is_empty() {
        return "Registry is empty. No skills loaded.".to_string();
    }

    let mut output = String::from("Skill Registry Status\n=====================\n\n");
    output.push_str(&format!("Total Skills: {}\n\n", skill_names.len()));

    for name in skill_names {
        let (Ok(meta), Ok(skill)) = (registry.get_metadata(&name), registry.get(&name)) else {
            continue;
        };
        output.push_str(&format!("- {} (v{})\n", name, meta.version));
        output.push_str(&format!(
            "  Status: {}\n",
            if meta.enabled { "Enabled" } else { "Disabled" }
        ));
        output.push_str(&format!("  Visibility: {}\n", meta.visibility));
        output.push_str(&format!("  Tools: {}\n", skill.tools().len()));
        output.push('\n');
    }
    output
}

/// Check a skill directory for the files discovery expects.
///
/// Returns human-readable issues; an empty list means the directory is
/// fully populated. Missing optional files are reported as warnings.
pub fn validate_skill_structure(skill_dir: &Path, entrypoint: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if !skill_dir.exists() {
        issues.push(format!("Directory does not exist: {}", skill_dir.display()));
        return issues;
    }
    if !skill_dir.is_dir() {
        issues.push(format!("Not a directory: {}", skill_dir.display()));
        return issues;
    }

    if !skill_dir.join(entrypoint).exists() {
        issues.push(format!("Missing required file: {}", entrypoint));
    }
    if !skill_dir.join(INSTRUCTIONS_FILE).exists() {
        issues.push(format!(
            "Warning: Optional file not found: {}",
            INSTRUCTIONS_FILE
        ));
    }

    issues
}
