//! Skill-aware conversational agent.
//!
//! `SkillAgent` ties the pieces together: a chat model, a skill
//! registry, the exposure middleware, and per-session unlock state. Each
//! model call inside a turn offers the tool set for the session's
//! current unlocked skills, executes any requested tool calls against
//! that same set, folds unlock deltas into the session, and loops until
//! the model answers in plain text.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use uuid::Uuid;

use crate::config::SkillSystemConfig;
use crate::diagnostics::{default_sink, DiagnosticsSink};
use crate::llms::base_model::{ChatMessage, ChatModel, ModelRequest, ModelResponse, ToolCall};
use crate::middleware::skill_middleware::SkillMiddleware;
use crate::skills::metadata::SkillMetadata;
use crate::skills::registry::{MetadataPredicate, SkillRegistry};
use crate::state::{MergePolicy, SessionState};
use crate::tools::filters::{all_of, require_permissions, ToolFilter, UsageLedger};
use crate::tools::skill_tool::SkillTool;
use crate::utilities::errors::{BoxError, SkillError};

const DEFAULT_MAX_ITER: usize = 25;

// ---------------------------------------------------------------------------
// SkillAgent
// ---------------------------------------------------------------------------

/// A conversational agent with progressive skill disclosure.
pub struct SkillAgent {
    model: Arc<dyn ChatModel>,
    registry: Arc<SkillRegistry>,
    middleware: Option<SkillMiddleware>,
    /// Descriptor predicate for the no-middleware path.
    skill_filter: Option<MetadataPredicate>,
    policy: MergePolicy,
    state: SessionState,
    history: Vec<ChatMessage>,
    ledger: Arc<UsageLedger>,
    sink: Arc<dyn DiagnosticsSink>,
    system_prompt: Option<String>,
    max_iter: usize,
    verbose: bool,
}

impl fmt::Debug for SkillAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillAgent")
            .field("model", &self.model.model())
            .field("skills", &self.registry.len())
            .field("policy", &self.policy)
            .field("max_iter", &self.max_iter)
            .finish()
    }
}

impl fmt::Display for SkillAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<SkillAgent: {} skills loaded>", self.registry.len())
    }
}

impl SkillAgent {
    /// Create a builder for configuring a `SkillAgent`.
    pub fn builder(model: Arc<dyn ChatModel>) -> SkillAgentBuilder {
        SkillAgentBuilder {
            model,
            registry: None,
            middleware_enabled: true,
            tool_filter: None,
            skill_filter: None,
            policy: MergePolicy::default(),
            system_prompt: None,
            verbose: false,
            max_iter: DEFAULT_MAX_ITER,
            sink: default_sink(),
            tool_usage_cap: None,
        }
    }

    /// Create an agent from a deployment config.
    ///
    /// Builds a registry with every compiled-in factory, runs directory
    /// discovery when enabled, and wires the middleware with the
    /// config's visibility allow-list and caller permissions.
    pub fn from_config(
        config: &SkillSystemConfig,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self, SkillError> {
        config.validate()?;
        let policy = config.to_merge_policy()?;

        let mut registry = SkillRegistry::with_builtin_factories();
        if config.auto_discover {
            registry.discover_and_load(&config.skills_dir, &config.entrypoint);
        }
        let registry = Arc::new(registry);

        let mut builder = Self::builder(model)
            .registry(Arc::clone(&registry))
            .merge_policy(policy)
            .verbose(config.verbose)
            .middleware_enabled(config.middleware_enabled);

        if let Some(pred) = config.visibility_predicate() {
            builder = builder.skill_filter(pred);
        }

        // Lift the skill-level visibility allow-list to the operation
        // level so the middleware can apply it per tool.
        let mut tool_filter: Option<ToolFilter> = None;
        if config.filter_by_visibility {
            let allowed = config.allowed_visibilities.clone();
            let registry = Arc::clone(&registry);
            tool_filter = Some(Box::new(move |tool: &SkillTool| {
                registry
                    .get_metadata(&tool.skill_name)
                    .map(|meta| allowed.contains(&meta.visibility))
                    .unwrap_or(false)
            }));
        }
        if !config.user_permissions.is_empty() {
            let perms = require_permissions(config.user_permissions.clone());
            tool_filter = Some(match tool_filter {
                Some(existing) => all_of(existing, perms),
                None => perms,
            });
        }
        if let Some(filter) = tool_filter {
            builder = builder.tool_filter(filter);
        }

        Ok(builder.build())
    }

    // -----------------------------------------------------------------
    // Conversation
    // -----------------------------------------------------------------

    /// Run one user turn to completion and return the final answer.
    pub fn invoke(&mut self, input: impl Into<String>) -> Result<String, BoxError> {
        self.seed_turn(input.into());

        for _ in 0..self.max_iter {
            let offered = self.exposed_tools();
            let request = ModelRequest::new(self.history.clone()).with_tools(offered.clone());

            let response = match &self.middleware {
                Some(mw) => {
                    mw.wrap_model_call(request, Some(&self.state), |req| self.model.call(&req))?
                }
                None => self.model.call(&request)?,
            };

            if let Some(answer) = self.absorb_response(&offered, response) {
                return Ok(answer);
            }
        }

        Err(format!(
            "agent stopped after reaching max iterations ({})",
            self.max_iter
        )
        .into())
    }

    /// Async variant of [`SkillAgent::invoke`].
    pub async fn ainvoke(&mut self, input: impl Into<String>) -> Result<String, BoxError> {
        self.seed_turn(input.into());

        for _ in 0..self.max_iter {
            let offered = self.exposed_tools();
            let request = ModelRequest::new(self.history.clone()).with_tools(offered.clone());

            let response = match &self.middleware {
                Some(mw) => {
                    let model = Arc::clone(&self.model);
                    mw.wrap_model_call_async(request, Some(&self.state), move |req| {
                        async move { model.acall(&req).await }.boxed()
                    })
                    .await?
                }
                None => self.model.acall(&request).await?,
            };

            if let Some(answer) = self.absorb_response(&offered, response) {
                return Ok(answer);
            }
        }

        Err(format!(
            "agent stopped after reaching max iterations ({})",
            self.max_iter
        )
        .into())
    }

    /// Drop the conversation and start a fresh session.
    pub fn reset(&mut self) {
        self.history.clear();
        self.state = SessionState::new();
        self.ledger.reset();
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Skills currently unlocked for this session.
    pub fn unlocked_skills(&self) -> &[String] {
        &self.state.unlocked_skills
    }

    /// This session's identifier.
    pub fn session_id(&self) -> Uuid {
        self.state.session_id
    }

    /// The conversation so far.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Names of all registered skills.
    pub fn list_skills(&self) -> Vec<String> {
        self.registry.list_skills(None)
    }

    /// A skill's descriptor.
    pub fn get_skill_info(&self, skill_name: &str) -> Result<SkillMetadata, SkillError> {
        self.registry.get_metadata(skill_name)
    }

    /// Search registered skills by text and tags.
    pub fn search_skills(&self, query: &str, tags: Option<&[String]>) -> Vec<SkillMetadata> {
        self.registry.search(query, tags, None)
    }

    /// The registry behind this agent.
    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    /// Per-tool usage counts for this session.
    pub fn usage_ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    // -----------------------------------------------------------------
    // Turn internals
    // -----------------------------------------------------------------

    fn seed_turn(&mut self, input: String) {
        if self.history.is_empty() {
            if let Some(prompt) = &self.system_prompt {
                self.history.push(ChatMessage::system(prompt.clone()));
            }
        }
        self.history.push(ChatMessage::user(input));
    }

    /// The tool set offered for the next model call.
    fn exposed_tools(&self) -> Vec<SkillTool> {
        match &self.middleware {
            Some(mw) => mw.filtered_tools(&self.state.unlocked_skills),
            None => self.registry.all_tools(self.skill_filter.as_ref()),
        }
    }

    /// Fold a model response into the conversation. Returns the final
    /// answer when the model requested no tool calls.
    fn absorb_response(
        &mut self,
        offered: &[SkillTool],
        response: ModelResponse,
    ) -> Option<String> {
        if response.tool_calls.is_empty() {
            self.history.push(ChatMessage::assistant(response.content.clone()));
            return Some(response.content);
        }

        self.history.push(ChatMessage::assistant_with_calls(
            response.content.clone(),
            response.tool_calls.clone(),
        ));

        let mut delta = Vec::new();
        for call in &response.tool_calls {
            let message = self.run_tool_call(offered, call, &mut delta);
            self.history.push(message);
        }

        self.state.apply_unlocks(&delta, &self.policy);
        if self.verbose && !delta.is_empty() {
            self.sink.info(&format!(
                "[SkillAgent] Unlocked skills now: {:?}",
                self.state.unlocked_skills
            ));
        }
        None
    }

    /// Execute one tool call against the set offered this iteration.
    ///
    /// A call naming a tool outside the offered set is answered with an
    /// error message rather than failing the turn; the model sees the
    /// error and can recover.
    fn run_tool_call(
        &self,
        offered: &[SkillTool],
        call: &ToolCall,
        delta: &mut Vec<String>,
    ) -> ChatMessage {
        let Some(tool) = offered.iter().find(|t| t.name == call.name) else {
            return ChatMessage::tool(
                &call.id,
                format!("Error: tool '{}' is not available", call.name),
            );
        };

        self.ledger.record(&call.name);
        match tool.invoke(call.arguments.clone()) {
            Ok(output) => {
                delta.extend(output.unlocked_skills.iter().cloned());
                ChatMessage::tool(&call.id, output.content)
            }
            Err(e) => ChatMessage::tool(
                &call.id,
                format!("Error executing tool '{}': {}", call.name, e),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// SkillAgentBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`SkillAgent`].
pub struct SkillAgentBuilder {
    model: Arc<dyn ChatModel>,
    registry: Option<Arc<SkillRegistry>>,
    middleware_enabled: bool,
    tool_filter: Option<ToolFilter>,
    skill_filter: Option<MetadataPredicate>,
    policy: MergePolicy,
    system_prompt: Option<String>,
    verbose: bool,
    max_iter: usize,
    sink: Arc<dyn DiagnosticsSink>,
    tool_usage_cap: Option<u64>,
}

impl SkillAgentBuilder {
    pub fn registry(mut self, registry: Arc<SkillRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Disable the middleware entirely; the full tool surface is then
    /// offered on every call.
    pub fn middleware_enabled(mut self, enabled: bool) -> Self {
        self.middleware_enabled = enabled;
        self
    }

    /// Operation-level filter applied by the middleware after assembly.
    pub fn tool_filter(mut self, filter: ToolFilter) -> Self {
        self.tool_filter = Some(filter);
        self
    }

    /// Descriptor predicate used when the middleware is disabled.
    pub fn skill_filter(mut self, filter: MetadataPredicate) -> Self {
        self.skill_filter = Some(filter);
        self
    }

    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Hide each non-loader tool after it has been used `max` times in
    /// the session.
    pub fn tool_usage_cap(mut self, max: u64) -> Self {
        self.tool_usage_cap = Some(max);
        self
    }

    pub fn build(self) -> SkillAgent {
        let SkillAgentBuilder {
            model,
            registry,
            middleware_enabled,
            tool_filter,
            skill_filter,
            policy,
            system_prompt,
            verbose,
            max_iter,
            sink,
            tool_usage_cap,
        } = self;

        let registry = registry.unwrap_or_else(|| Arc::new(SkillRegistry::new()));
        if registry.is_empty() {
            sink.warn("No skills loaded. Agent will have no skill capabilities.");
        }

        let ledger = Arc::new(UsageLedger::new());
        let mut tool_filter = tool_filter;
        if let Some(max) = tool_usage_cap {
            let cap = ledger.usage_cap_filter(max);
            tool_filter = Some(match tool_filter {
                Some(existing) => all_of(existing, cap),
                None => cap,
            });
        }

        let middleware = if middleware_enabled {
            let mut mw = SkillMiddleware::new(Arc::clone(&registry))
                .with_verbose(verbose)
                .with_sink(Arc::clone(&sink));
            if let Some(filter) = tool_filter {
                mw = mw.with_tool_filter(filter);
            }
            Some(mw)
        } else {
            if tool_filter.is_some() {
                sink.warn("Middleware disabled; the tool filter will not be applied");
            }
            None
        };

        SkillAgent {
            model,
            registry,
            middleware,
            skill_filter,
            policy,
            state: SessionState::new(),
            history: Vec::new(),
            ledger,
            sink,
            system_prompt,
            max_iter,
            verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::llms::base_model::Role;
    use crate::llms::scripted::ScriptedModel;
    use serde_json::json;

    fn demo_registry() -> Arc<SkillRegistry> {
        let mut registry = SkillRegistry::new();
        builtin::register_builtins(&mut registry).unwrap();
        Arc::new(registry)
    }

    fn scripted(responses: Vec<ModelResponse>) -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel::new("scripted", responses))
    }

    #[test]
    fn test_invoke_plain_answer_offers_loaders_only() {
        let model = scripted(vec![ModelResponse::text("hi there")]);
        let mut agent = SkillAgent::builder(model.clone())
            .registry(demo_registry())
            .system_prompt("You are a test agent.")
            .build();

        let answer = agent.invoke("hello").unwrap();
        assert_eq!(answer, "hi there");

        let offered = model.offered_tools();
        assert_eq!(offered.len(), 1);
        assert_eq!(offered[0].len(), 3);
        assert!(offered[0].iter().all(|name| name.starts_with("skill_")));

        assert_eq!(agent.history()[0].role, Role::System);
        assert_eq!(agent.history()[1].role, Role::User);
    }

    #[test]
    fn test_progressive_unlock_flow() {
        let model = scripted(vec![
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c1", "skill_hello_world", json!({}))],
            ),
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c2", "say_hello", json!({ "name": "Rust" }))],
            ),
            ModelResponse::text("done"),
        ]);
        let mut agent = SkillAgent::builder(model.clone())
            .registry(demo_registry())
            .build();

        assert_eq!(agent.invoke("greet in style").unwrap(), "done");

        let offered = model.offered_tools();
        assert_eq!(offered.len(), 3);
        // First call: locked, loaders only.
        assert!(!offered[0].contains(&"say_hello".to_string()));
        // Second call: hello_world unlocked, its tools appear.
        assert!(offered[1].contains(&"say_hello".to_string()));
        assert!(!offered[1].contains(&"count_words".to_string()));

        assert_eq!(agent.unlocked_skills(), &["hello_world".to_string()]);

        let greeting = agent
            .history()
            .iter()
            .find(|m| m.tool_call_id.as_deref() == Some("c2"))
            .unwrap();
        assert_eq!(greeting.content, "Hello, Rust!");
    }

    #[test]
    fn test_replace_policy_swaps_unlocked_skill() {
        let model = scripted(vec![
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c1", "skill_hello_world", json!({}))],
            ),
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c2", "skill_text_tools", json!({}))],
            ),
            ModelResponse::text("done"),
        ]);
        let mut agent = SkillAgent::builder(model.clone())
            .registry(demo_registry())
            .build();

        agent.invoke("switch skills").unwrap();
        assert_eq!(agent.unlocked_skills(), &["text_tools".to_string()]);

        let offered = model.offered_tools();
        assert!(offered[2].contains(&"count_words".to_string()));
        assert!(!offered[2].contains(&"say_hello".to_string()));
    }

    #[test]
    fn test_accumulate_policy_keeps_both_skills() {
        let model = scripted(vec![
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c1", "skill_hello_world", json!({}))],
            ),
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c2", "skill_text_tools", json!({}))],
            ),
            ModelResponse::text("done"),
        ]);
        let mut agent = SkillAgent::builder(model.clone())
            .registry(demo_registry())
            .merge_policy(MergePolicy::Accumulate)
            .build();

        agent.invoke("load both").unwrap();
        assert_eq!(
            agent.unlocked_skills(),
            &["hello_world".to_string(), "text_tools".to_string()]
        );

        let offered = model.offered_tools();
        assert!(offered[2].contains(&"say_hello".to_string()));
        assert!(offered[2].contains(&"count_words".to_string()));
    }

    #[test]
    fn test_unknown_tool_call_becomes_error_message() {
        let model = scripted(vec![
            ModelResponse::with_calls("", vec![ToolCall::new("c1", "missing_tool", json!({}))]),
            ModelResponse::text("recovered"),
        ]);
        let mut agent = SkillAgent::builder(model.clone())
            .registry(demo_registry())
            .build();

        assert_eq!(agent.invoke("try it").unwrap(), "recovered");

        let error = agent
            .history()
            .iter()
            .find(|m| m.tool_call_id.as_deref() == Some("c1"))
            .unwrap();
        assert_eq!(error.content, "Error: tool 'missing_tool' is not available");
    }

    #[test]
    fn test_max_iter_guard() {
        let model = scripted(vec![
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c1", "skill_hello_world", json!({}))],
            ),
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c2", "skill_hello_world", json!({}))],
            ),
        ]);
        let mut agent = SkillAgent::builder(model)
            .registry(demo_registry())
            .max_iter(2)
            .build();

        let err = agent.invoke("loop forever").unwrap_err();
        assert!(err.to_string().contains("max iterations (2)"));
    }

    #[test]
    fn test_middleware_disabled_offers_full_surface() {
        let model = scripted(vec![ModelResponse::text("done")]);
        let mut agent = SkillAgent::builder(model.clone())
            .registry(demo_registry())
            .middleware_enabled(false)
            .build();

        agent.invoke("anything").unwrap();

        let offered = model.offered_tools();
        assert!(offered[0].contains(&"say_hello".to_string()));
        assert!(offered[0].contains(&"count_words".to_string()));
    }

    #[test]
    fn test_tool_usage_cap_hides_spent_tool() {
        let model = scripted(vec![
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c1", "skill_hello_world", json!({}))],
            ),
            ModelResponse::with_calls("", vec![ToolCall::new("c2", "say_hello", json!({}))]),
            ModelResponse::with_calls("", vec![ToolCall::new("c3", "say_hello", json!({}))]),
            ModelResponse::text("done"),
        ]);
        let mut agent = SkillAgent::builder(model.clone())
            .registry(demo_registry())
            .tool_usage_cap(1)
            .build();

        assert_eq!(agent.invoke("greet twice").unwrap(), "done");
        assert_eq!(agent.usage_ledger().count("say_hello"), 1);

        let offered = model.offered_tools();
        assert!(offered[1].contains(&"say_hello".to_string()));
        assert!(!offered[2].contains(&"say_hello".to_string()));

        let second = agent
            .history()
            .iter()
            .find(|m| m.tool_call_id.as_deref() == Some("c3"))
            .unwrap();
        assert_eq!(second.content, "Error: tool 'say_hello' is not available");
    }

    #[test]
    fn test_reset_starts_fresh_session() {
        let model = scripted(vec![
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c1", "skill_hello_world", json!({}))],
            ),
            ModelResponse::text("done"),
        ]);
        let mut agent = SkillAgent::builder(model)
            .registry(demo_registry())
            .build();

        agent.invoke("unlock").unwrap();
        let old_session = agent.session_id();
        assert!(!agent.unlocked_skills().is_empty());

        agent.reset();
        assert!(agent.history().is_empty());
        assert!(agent.unlocked_skills().is_empty());
        assert_ne!(agent.session_id(), old_session);
    }

    #[test]
    fn test_from_config_discovers_skills() {
        let dir = tempfile::tempdir().unwrap();
        let skill_dir = dir.path().join("hello");
        std::fs::create_dir(&skill_dir).unwrap();
        std::fs::write(skill_dir.join("skill.yaml"), "factory: hello_world\n").unwrap();

        let mut config = SkillSystemConfig::default();
        config.skills_dir = dir.path().to_path_buf();

        let model = scripted(vec![ModelResponse::text("ok")]);
        let mut agent = SkillAgent::from_config(&config, model.clone()).unwrap();

        assert_eq!(agent.list_skills(), vec!["hello_world".to_string()]);
        assert_eq!(agent.invoke("hi").unwrap(), "ok");
        assert_eq!(
            model.offered_tools()[0],
            vec!["skill_hello_world".to_string()]
        );
    }

    #[test]
    fn test_from_config_rejects_zero_fifo_bound() {
        let mut config = SkillSystemConfig::default();
        config.state_mode = crate::config::StateMode::Fifo;
        config.max_concurrent_skills = 0;

        let model = scripted(vec![]);
        assert!(SkillAgent::from_config(&config, model).is_err());
    }

    #[tokio::test]
    async fn test_ainvoke_matches_invoke_flow() {
        let model = scripted(vec![
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c1", "skill_hello_world", json!({}))],
            ),
            ModelResponse::with_calls(
                "",
                vec![ToolCall::new("c2", "say_hello", json!({ "name": "async" }))],
            ),
            ModelResponse::text("done"),
        ]);
        let mut agent = SkillAgent::builder(model.clone())
            .registry(demo_registry())
            .build();

        assert_eq!(agent.ainvoke("greet").await.unwrap(), "done");
        assert_eq!(agent.unlocked_skills(), &["hello_world".to_string()]);

        let offered = model.offered_tools();
        assert!(!offered[0].contains(&"say_hello".to_string()));
        assert!(offered[1].contains(&"say_hello".to_string()));
    }
}
