//! Skill middleware: per-call tool exposure.
//!
//! Before each model invocation the middleware recomputes the visible
//! tool set from the session's unlocked skills and substitutes it into
//! the outgoing request. Nothing is cached between calls: the unlocked
//! list and the filter can both change from one turn to the next, so the
//! set is assembled from the registry every time.
//!
//! The middleware holds no per-turn mutable state and can be shared
//! across concurrent sessions.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::diagnostics::{default_sink, DiagnosticsSink};
use crate::llms::base_model::{ModelRequest, ModelResponse};
use crate::skills::registry::SkillRegistry;
use crate::state::SessionState;
use crate::tools::filters::ToolFilter;
use crate::tools::skill_tool::SkillTool;
use crate::utilities::errors::BoxError;

/// Middleware that scopes each model call's tool set to the session's
/// unlocked skills.
///
/// Cross-cutting concerns (permissions, usage caps, allow/block lists)
/// are composed in through the optional [`ToolFilter`] rather than
/// through subtypes; see [`crate::tools::filters`] for the standard
/// constructors.
pub struct SkillMiddleware {
    registry: Arc<SkillRegistry>,
    verbose: bool,
    tool_filter: Option<ToolFilter>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl fmt::Debug for SkillMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillMiddleware")
            .field("skills", &self.registry.len())
            .field("verbose", &self.verbose)
            .field("has_tool_filter", &self.tool_filter.is_some())
            .finish()
    }
}

impl SkillMiddleware {
    /// Create a middleware over `registry` with no filter, quiet
    /// diagnostics, and the default sink.
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self {
            registry,
            verbose: false,
            tool_filter: None,
            sink: default_sink(),
        }
    }

    /// Enable or disable per-call diagnostics.
    ///
    /// Verbose output is observability only; it never changes which
    /// tools are exposed.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Install an operation-level filter applied after assembly.
    pub fn with_tool_filter(mut self, filter: ToolFilter) -> Self {
        self.tool_filter = Some(filter);
        self
    }

    /// Route diagnostics through `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The registry this middleware assembles from.
    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    /// Compute the tool set for an unlocked-skills snapshot: registry
    /// assembly intersected with the installed filter.
    pub fn filtered_tools(&self, unlocked: &[String]) -> Vec<SkillTool> {
        let mut tools = self.registry.tools_for_unlocked(unlocked);
        if let Some(filter) = &self.tool_filter {
            tools.retain(|t| filter(t));
        }
        tools
    }

    /// Shared request preparation for the sync and async paths. Both
    /// must filter identically; only the await differs.
    fn prepare(&self, request: ModelRequest, state: Option<&SessionState>, label: &str) -> ModelRequest {
        let unlocked: &[String] = state.map(|s| s.unlocked_skills.as_slice()).unwrap_or(&[]);
        let tools = self.filtered_tools(unlocked);

        if self.verbose {
            self.sink.info(&format!(
                "[SkillMiddleware]{} Unlocked skills: {:?}",
                label, unlocked
            ));
            self.sink.info(&format!(
                "[SkillMiddleware]{} Exposed tools ({}): {:?}",
                label,
                tools.len(),
                tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
            ));
        }

        ModelRequest { tools, ..request }
    }

    /// Intercept a synchronous model call.
    ///
    /// Replaces the request's tool set from `state` (absent state means
    /// nothing unlocked) and forwards to `handler`. Handler errors
    /// propagate unchanged.
    pub fn wrap_model_call<H>(
        &self,
        request: ModelRequest,
        state: Option<&SessionState>,
        handler: H,
    ) -> Result<ModelResponse, BoxError>
    where
        H: FnOnce(ModelRequest) -> Result<ModelResponse, BoxError>,
    {
        let filtered = self.prepare(request, state, "");
        handler(filtered)
    }

    /// Intercept an asynchronous model call.
    ///
    /// Identical filtering to [`SkillMiddleware::wrap_model_call`]; the
    /// downstream call is awaited instead of invoked directly.
    pub async fn wrap_model_call_async<H>(
        &self,
        request: ModelRequest,
        state: Option<&SessionState>,
        handler: H,
    ) -> Result<ModelResponse, BoxError>
    where
        H: FnOnce(ModelRequest) -> BoxFuture<'static, Result<ModelResponse, BoxError>>,
    {
        let filtered = self.prepare(request, state, " (async)");
        handler(filtered).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CaptureSink, Severity};
    use crate::llms::base_model::ChatMessage;
    use crate::skills::skill::StaticSkill;
    use crate::tools::filters::block_tools;
    use crate::tools::skill_tool::{SkillTool, ToolOutput};
    use futures::FutureExt;

    fn registry_with_skills() -> Arc<SkillRegistry> {
        let mut registry = SkillRegistry::new();
        for name in ["math", "text"] {
            registry
                .register(
                    StaticSkill::builder(name, format!("The {} skill", name))
                        .tool(SkillTool::operation(
                            format!("{}_run", name),
                            "Run it",
                            SkillTool::empty_schema(),
                            Arc::new(|_| Ok(ToolOutput::text("ok"))),
                        ))
                        .build_arc(),
                )
                .unwrap();
        }
        Arc::new(registry)
    }

    fn request() -> ModelRequest {
        ModelRequest::new(vec![ChatMessage::user("hello")])
    }

    fn unlocked(names: &[&str]) -> SessionState {
        SessionState::with_unlocked(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_replaces_candidate_tool_set() {
        let middleware = SkillMiddleware::new(registry_with_skills());
        let state = unlocked(&["math"]);

        // A pre-attached tool on the incoming request must not survive.
        let incoming = request().with_tools(vec![SkillTool::operation(
            "stowaway",
            "Should be replaced",
            SkillTool::empty_schema(),
            Arc::new(|_| Ok("no".into())),
        )]);

        let seen = middleware
            .wrap_model_call(incoming, Some(&state), |req| {
                Ok(ModelResponse::text(req.tool_names().join(",")))
            })
            .unwrap();

        assert_eq!(seen.content, "skill_math,skill_text,math_run");
    }

    #[test]
    fn test_absent_state_means_nothing_unlocked() {
        let middleware = SkillMiddleware::new(registry_with_skills());

        let seen = middleware
            .wrap_model_call(request(), None, |req| {
                Ok(ModelResponse::text(req.tool_names().join(",")))
            })
            .unwrap();

        assert_eq!(seen.content, "skill_math,skill_text");
    }

    #[test]
    fn test_tool_filter_intersects_assembly() {
        let middleware = SkillMiddleware::new(registry_with_skills())
            .with_tool_filter(block_tools(vec!["math_run".to_string()]));
        let state = unlocked(&["math", "text"]);

        let names: Vec<String> = middleware
            .filtered_tools(&state.unlocked_skills)
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(names, vec!["skill_math", "skill_text", "text_run"]);
    }

    #[test]
    fn test_delegate_error_propagates_unchanged() {
        let middleware = SkillMiddleware::new(registry_with_skills());

        let err = middleware
            .wrap_model_call(request(), None, |_req| Err(BoxError::from("provider outage")))
            .unwrap_err();
        assert_eq!(err.to_string(), "provider outage");
    }

    #[tokio::test]
    async fn test_async_path_filters_identically() {
        let middleware = SkillMiddleware::new(registry_with_skills());
        let state = unlocked(&["text"]);

        let sync_seen = middleware
            .wrap_model_call(request(), Some(&state), |req| {
                Ok(ModelResponse::text(req.tool_names().join(",")))
            })
            .unwrap();

        let async_seen = middleware
            .wrap_model_call_async(request(), Some(&state), |req| {
                async move { Ok(ModelResponse::text(req.tool_names().join(","))) }.boxed()
            })
            .await
            .unwrap();

        assert_eq!(sync_seen, async_seen);
    }

    #[tokio::test]
    async fn test_async_delegate_error_propagates() {
        let middleware = SkillMiddleware::new(registry_with_skills());

        let err = middleware
            .wrap_model_call_async(request(), None, |_req| {
                async { Err(BoxError::from("async outage")) }.boxed()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "async outage");
    }

    #[test]
    fn test_verbose_logs_without_changing_result() {
        let sink = Arc::new(CaptureSink::new());
        let registry = registry_with_skills();
        let state = unlocked(&["math"]);

        let quiet = SkillMiddleware::new(registry.clone());
        let verbose = SkillMiddleware::new(registry)
            .with_verbose(true)
            .with_sink(sink.clone());

        let run = |mw: &SkillMiddleware| {
            mw.wrap_model_call(request(), Some(&state), |req| {
                Ok(ModelResponse::text(req.tool_names().join(",")))
            })
            .unwrap()
        };

        assert_eq!(run(&quiet), run(&verbose));
        assert!(sink.contains(Severity::Info, "Unlocked skills"));
        assert!(sink.contains(Severity::Info, "Exposed tools"));
    }

    #[test]
    fn test_quiet_mode_logs_nothing() {
        let sink = Arc::new(CaptureSink::new());
        let middleware = SkillMiddleware::new(registry_with_skills()).with_sink(sink.clone());

        middleware
            .wrap_model_call(request(), None, |_req| Ok(ModelResponse::text("ok")))
            .unwrap();
        assert!(sink.messages().is_empty());
    }
}
