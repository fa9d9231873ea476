//! skillgate demo binary.
//!
//! Walks through progressive skill disclosure with a scripted model:
//! the first model call sees loader tools only, a loader call unlocks
//! its skill, and the next call sees the skill's tools as well. Runs
//! the same flow once synchronously and once asynchronously.
//!
//! # Environment Variables
//!
//! - `SKILLGATE_SKILLS_DIR`: extra skill directory to discover
//! - `SKILLGATE_STATE_MODE`: unlock merge mode, one of "replace" (default), "accumulate", "fifo"
//! - `SKILLGATE_VERBOSE`: per-call middleware diagnostics ("true"/"1"/"yes")
//! - `RUST_LOG`: log filter (default: the config's log level)
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//! ```

use std::sync::Arc;

use serde_json::json;

use skillgate::agent::SkillAgent;
use skillgate::builtin;
use skillgate::config::SkillSystemConfig;
use skillgate::llms::base_model::{ModelResponse, ToolCall};
use skillgate::llms::scripted::ScriptedModel;
use skillgate::skills::registry::SkillRegistry;
use skillgate::utilities::helpers::format_registry_status;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SkillSystemConfig::load(None)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_level),
    )
    .init();

    let mut registry = SkillRegistry::with_builtin_factories();
    builtin::register_builtins(&mut registry)?;
    if config.auto_discover && config.skills_dir.exists() {
        registry.discover_and_load(&config.skills_dir, &config.entrypoint);
    }
    let registry = Arc::new(registry);

    println!("{}", format_registry_status(&registry));

    // --- Sync walkthrough ------------------------------------------------

    println!("== Sync: unlock text_tools, then count words ==\n");
    let script = vec![
        ModelResponse::with_calls("", vec![ToolCall::new("call-1", "skill_text_tools", json!({}))]),
        ModelResponse::with_calls(
            "",
            vec![ToolCall::new(
                "call-2",
                "count_words",
                json!({ "text": "progressive disclosure keeps the tool surface small" }),
            )],
        ),
        ModelResponse::text("The sentence has 7 words."),
    ];
    let model = Arc::new(ScriptedModel::new(config.default_model.clone(), script));
    let mut agent = SkillAgent::builder(model.clone())
        .registry(Arc::clone(&registry))
        .merge_policy(config.to_merge_policy()?)
        .verbose(config.verbose)
        .system_prompt("You are an assistant with progressively disclosed skills.")
        .build();

    let answer = agent
        .invoke("How many words are in my sentence?")
        .map_err(|e| anyhow::anyhow!(e))?;

    report_calls(&model);
    println!("Unlocked skills: {:?}", agent.unlocked_skills());
    println!("Final answer: {}\n", answer);

    // --- Async walkthrough -----------------------------------------------

    println!("== Async: unlock hello_world, then greet ==\n");
    let script = vec![
        ModelResponse::with_calls(
            "",
            vec![ToolCall::new("call-1", "skill_hello_world", json!({}))],
        ),
        ModelResponse::with_calls(
            "",
            vec![ToolCall::new("call-2", "say_hello", json!({ "name": "skillgate" }))],
        ),
        ModelResponse::text("Greeted successfully."),
    ];
    let model = Arc::new(ScriptedModel::new(config.default_model.clone(), script));
    let mut agent = SkillAgent::builder(model.clone())
        .registry(Arc::clone(&registry))
        .merge_policy(config.to_merge_policy()?)
        .verbose(config.verbose)
        .build();

    let answer = agent
        .ainvoke("Say hello to the project")
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    report_calls(&model);
    println!("Unlocked skills: {:?}", agent.unlocked_skills());
    println!("Final answer: {}", answer);

    Ok(())
}

/// Print the tool set each model call was offered.
fn report_calls(model: &ScriptedModel) {
    for (i, tools) in model.offered_tools().iter().enumerate() {
        println!("model call {}: {} tools offered: {:?}", i + 1, tools.len(), tools);
    }
}
