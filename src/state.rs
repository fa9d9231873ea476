//! Session state and unlock-list merge policies.
//!
//! A session tracks which skills have been unlocked so far. At the end
//! of each turn the skill names reported by loader invocations are
//! folded into the session through a [`MergePolicy`]. Policies are pure
//! functions over name lists: they never error, and empty inputs are
//! ordinary empty sequences.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// How newly unlocked skill names are folded into the session's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The new names replace the current list entirely.
    Replace,
    /// New names are appended, skipping any already present. Names are
    /// never removed; first-seen order is preserved.
    Accumulate,
    /// Accumulate, then keep only the most recent `max` names (oldest
    /// evicted first).
    Fifo { max: NonZeroUsize },
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Replace
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Replace => write!(f, "replace"),
            MergePolicy::Accumulate => write!(f, "accumulate"),
            MergePolicy::Fifo { max } => write!(f, "fifo({})", max),
        }
    }
}

impl MergePolicy {
    /// FIFO policy with the given bound; `None` if `max` is zero.
    pub fn fifo(max: usize) -> Option<Self> {
        NonZeroUsize::new(max).map(|max| MergePolicy::Fifo { max })
    }

    /// Merge `incoming` names into `current` under this policy.
    ///
    /// Under accumulate and FIFO the result never contains duplicates,
    /// even when `incoming` repeats a name.
    pub fn merge(&self, current: &[String], incoming: &[String]) -> Vec<String> {
        match self {
            MergePolicy::Replace => incoming.to_vec(),
            MergePolicy::Accumulate => accumulate(current, incoming),
            MergePolicy::Fifo { max } => {
                let merged = accumulate(current, incoming);
                if current.is_empty() {
                    merged.into_iter().take(max.get()).collect()
                } else {
                    let evict = merged.len().saturating_sub(max.get());
                    merged.into_iter().skip(evict).collect()
                }
            }
        }
    }
}

/// Append each incoming name not already present.
fn accumulate(current: &[String], incoming: &[String]) -> Vec<String> {
    let mut combined = current.to_vec();
    for name in incoming {
        if !combined.contains(name) {
            combined.push(name.clone());
        }
    }
    combined
}

/// Per-session state read and written by the skill system.
///
/// `unlocked_skills` is the only field the core interprets. `extra` is
/// an open extension bag for host-owned session data; the skill system
/// carries it untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique session identifier.
    pub session_id: Uuid,
    /// When the session started.
    pub created_at: DateTime<Utc>,
    /// Names of skills unlocked so far, in policy-defined order.
    #[serde(default)]
    pub unlocked_skills: Vec<String>,
    /// Host-owned extension data.
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Fresh session: new id, current time, nothing unlocked.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            unlocked_skills: Vec::new(),
            extra: HashMap::new(),
        }
    }

    /// Fresh session with an initial unlocked list.
    pub fn with_unlocked(unlocked_skills: Vec<String>) -> Self {
        Self {
            unlocked_skills,
            ..Self::new()
        }
    }

    /// Fold a turn's unlock deltas into the session under `policy`.
    ///
    /// A turn that produced no deltas leaves the session untouched under
    /// every policy; replace only replaces when something was unlocked.
    pub fn apply_unlocks(&mut self, incoming: &[String], policy: &MergePolicy) {
        if incoming.is_empty() {
            return;
        }
        self.unlocked_skills = policy.merge(&self.unlocked_skills, incoming);
    }
}
