//! Tool filtering support.
//!
//! A [`ToolFilter`] is an operation-level predicate the middleware applies
//! after assembling the turn's tool set. It is distinct from the
//! capability-level metadata predicate used at listing time: that one
//! decides which skills exist for a deployment, this one decides which
//! individual tools an already-visible skill may offer on this call.
//!
//! The core never installs a filter on its own. These constructors cover
//! the common cases; anything fancier is a closure away.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::skill_tool::SkillTool;

/// Type alias for tool filter functions.
///
/// Returns `true` if the tool should be offered, `false` to drop it.
pub type ToolFilter = Box<dyn Fn(&SkillTool) -> bool + Send + Sync>;

/// Keep only tools whose names are in `names`.
pub fn allow_tools(names: Vec<String>) -> ToolFilter {
    let allowed: HashSet<String> = names.into_iter().collect();
    Box::new(move |tool: &SkillTool| allowed.contains(&tool.name))
}

/// Drop tools whose names are in `names`; everything else passes.
pub fn block_tools(names: Vec<String>) -> ToolFilter {
    let blocked: HashSet<String> = names.into_iter().collect();
    Box::new(move |tool: &SkillTool| !blocked.contains(&tool.name))
}

/// Keep only tools whose required permissions are all granted.
///
/// Tools with no required permissions always pass. This hides tools the
/// caller cannot use; collaborators that want a hard rejection instead
/// raise [`crate::utilities::errors::SkillError::Permission`] themselves.
pub fn require_permissions(granted: Vec<String>) -> ToolFilter {
    let granted: HashSet<String> = granted.into_iter().collect();
    Box::new(move |tool: &SkillTool| {
        tool.required_permissions.iter().all(|p| granted.contains(p))
    })
}

/// Combine two filters; a tool must pass both.
pub fn all_of(first: ToolFilter, second: ToolFilter) -> ToolFilter {
    Box::new(move |tool: &SkillTool| first(tool) && second(tool))
}

/// Per-tool invocation counters.
///
/// Tool handles are shared immutably after registration, so usage
/// accounting lives here rather than on the tool. The agent records each
/// successful invocation; [`UsageLedger::usage_cap_filter`] turns the
/// ledger into a filter that stops offering a tool once it has been used
/// `max` times in the session.
#[derive(Debug, Default)]
pub struct UsageLedger {
    counts: Mutex<HashMap<String, u64>>,
}

impl UsageLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation of `tool_name`.
    pub fn record(&self, tool_name: &str) {
        *self.counts.lock().entry(tool_name.to_string()).or_insert(0) += 1;
    }

    /// Number of recorded invocations for `tool_name`.
    pub fn count(&self, tool_name: &str) -> u64 {
        self.counts.lock().get(tool_name).copied().unwrap_or(0)
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.counts.lock().clear();
    }

    /// A filter that drops any tool already invoked `max` or more times.
    ///
    /// Loaders are exempt: hiding a loader would freeze the skill's
    /// unlock path for the rest of the session.
    pub fn usage_cap_filter(self: &Arc<Self>, max: u64) -> ToolFilter {
        let ledger = Arc::clone(self);
        Box::new(move |tool: &SkillTool| {
            tool.is_loader() || ledger.count(&tool.name) < max
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::skill_tool::ToolOutput;
    use serde_json::json;

    fn tool(name: &str) -> SkillTool {
        SkillTool::operation(
            name,
            "test tool",
            json!({ "type": "object", "properties": {} }),
            Arc::new(|_| Ok(ToolOutput::text("ok"))),
        )
    }

    fn tool_with_permissions(name: &str, perms: &[&str]) -> SkillTool {
        let perms: Vec<String> = perms.iter().map(|s| s.to_string()).collect();
        tool(name).bound_to("owner", &perms)
    }

    #[test]
    fn test_allow_tools() {
        let filter = allow_tools(vec!["a".to_string()]);
        assert!(filter(&tool("a")));
        assert!(!filter(&tool("b")));
    }

    #[test]
    fn test_block_tools() {
        let filter = block_tools(vec!["a".to_string()]);
        assert!(!filter(&tool("a")));
        assert!(filter(&tool("b")));
    }

    #[test]
    fn test_require_permissions_subset() {
        let filter = require_permissions(vec!["fs:read".to_string(), "net".to_string()]);

        assert!(filter(&tool_with_permissions("open", &["fs:read"])));
        assert!(filter(&tool_with_permissions("fetch", &["fs:read", "net"])));
        assert!(!filter(&tool_with_permissions("write", &["fs:write"])));
        // No requirements always passes.
        assert!(filter(&tool_with_permissions("noop", &[])));
    }

    #[test]
    fn test_all_of_requires_both() {
        let filter = all_of(
            allow_tools(vec!["a".to_string(), "b".to_string()]),
            block_tools(vec!["b".to_string()]),
        );
        assert!(filter(&tool("a")));
        assert!(!filter(&tool("b")));
        assert!(!filter(&tool("c")));
    }

    #[test]
    fn test_usage_ledger_counts() {
        let ledger = UsageLedger::new();
        assert_eq!(ledger.count("echo"), 0);
        ledger.record("echo");
        ledger.record("echo");
        assert_eq!(ledger.count("echo"), 2);
        ledger.reset();
        assert_eq!(ledger.count("echo"), 0);
    }

    #[test]
    fn test_usage_cap_filter() {
        let ledger = Arc::new(UsageLedger::new());
        let filter = ledger.usage_cap_filter(2);

        let t = tool("echo");
        assert!(filter(&t));
        ledger.record("echo");
        assert!(filter(&t));
        ledger.record("echo");
        assert!(!filter(&t));
    }

    #[test]
    fn test_usage_cap_filter_exempts_loaders() {
        let ledger = Arc::new(UsageLedger::new());
        let filter = ledger.usage_cap_filter(1);

        let loader = SkillTool::loader("skill_x", "Load x", Arc::new(|_| Ok("ok".into())));
        ledger.record("skill_x");
        ledger.record("skill_x");
        assert!(filter(&loader));
    }
}
