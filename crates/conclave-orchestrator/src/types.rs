use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a delegated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationStatus {
    Queued,
    Dispatched,
    Completed,
    Failed,
}

impl DelegationStatus {
    /// Queued and dispatched tasks are in flight.
    pub fn is_in_flight(self) -> bool {
        matches!(self, DelegationStatus::Queued | DelegationStatus::Dispatched)
    }
}

impl std::fmt::Display for DelegationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelegationStatus::Queued => write!(f, "queued"),
            DelegationStatus::Dispatched => write!(f, "dispatched"),
            DelegationStatus::Completed => write!(f, "completed"),
            DelegationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// An action recommended by the external analysis feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    /// The action to delegate; also the skill used to route it.
    pub action: String,
    /// Agent that should perform it, when the feed names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_agent: Option<String>,
    /// Why the feed recommends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl RecommendedAction {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            target_agent: None,
            rationale: None,
        }
    }

    pub fn targeting(mut self, agent_id: impl Into<String>) -> Self {
        self.target_agent = Some(agent_id.into());
        self
    }
}

/// A unit of delegated work owned by the [`TaskQueue`](crate::TaskQueue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedTask {
    pub id: Uuid,
    pub action: String,
    pub target_agent: Option<String>,
    pub status: DelegationStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Unix seconds at which a failed task becomes due for requeue.
    pub next_attempt_unix: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_detail: Option<String>,
    pub last_result: Option<String>,
    pub duration_ms: Option<u64>,
    /// Creation order within the queue; breaks due-time ties.
    pub sequence: u64,
}

impl DelegatedTask {
    pub(crate) fn new(
        action: &RecommendedAction,
        max_attempts: u32,
        created_at: DateTime<Utc>,
        sequence: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.action.clone(),
            target_agent: action.target_agent.clone(),
            status: DelegationStatus::Queued,
            attempts: 0,
            max_attempts,
            next_attempt_unix: None,
            created_at,
            dispatched_at: None,
            completed_at: None,
            last_error: None,
            last_error_detail: None,
            last_result: None,
            duration_ms: None,
            sequence,
        }
    }

    /// Failed with no attempts left; never requeued again.
    pub fn is_exhausted(&self) -> bool {
        self.status == DelegationStatus::Failed && self.attempts >= self.max_attempts
    }

    /// Failed, retry-eligible, and due at `now_unix`.
    pub fn is_due(&self, now_unix: i64) -> bool {
        self.status == DelegationStatus::Failed
            && self.attempts < self.max_attempts
            && self.next_attempt_unix.is_some_and(|due| due <= now_unix)
    }
}

/// What an agent reported after executing a dispatched task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_detail: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    pub duration_ms: u64,
}

impl ExecutionReport {
    pub fn success(duration_ms: u64, result: Option<String>) -> Self {
        Self {
            success: true,
            error_message: None,
            error_detail: None,
            result,
            duration_ms,
        }
    }

    pub fn failure(
        error_message: impl Into<String>,
        error_detail: Option<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: false,
            error_message: Some(error_message.into()),
            error_detail,
            result: None,
            duration_ms,
        }
    }
}

/// Snapshot handed to an external status API.
///
/// `count` always equals `tasks.len()`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusView {
    pub count: usize,
    pub tasks: Vec<DelegatedTask>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counts; `queued + dispatched + completed + failed == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub queued: usize,
    pub dispatched: usize,
    pub completed: usize,
    pub failed: usize,
    /// Subset of `failed` with no attempts left.
    pub exhausted: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let action = RecommendedAction::new("reindex").targeting("agent-9");
        let task = DelegatedTask::new(&action, 3, Utc::now(), 0);
        assert_eq!(task.status, DelegationStatus::Queued);
        assert_eq!(task.attempts, 0);
        assert_eq!(task.max_attempts, 3);
        assert!(task.next_attempt_unix.is_none());
        assert_eq!(task.target_agent.as_deref(), Some("agent-9"));
    }

    #[test]
    fn test_is_due_requires_failed_and_attempts_left() {
        let mut task = DelegatedTask::new(&RecommendedAction::new("a"), 2, Utc::now(), 0);
        task.status = DelegationStatus::Failed;
        task.attempts = 1;
        task.next_attempt_unix = Some(100);
        assert!(task.is_due(100));
        assert!(!task.is_due(99));

        task.attempts = 2;
        assert!(!task.is_due(100));
        assert!(task.is_exhausted());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&DelegationStatus::Dispatched).unwrap();
        assert_eq!(json, "\"dispatched\"");
        assert!(DelegationStatus::Queued.is_in_flight());
        assert!(!DelegationStatus::Failed.is_in_flight());
    }

    #[test]
    fn test_action_feed_shape() {
        let json = r#"[{"action": "compact-logs"}, {"action": "rotate-keys", "targetAgent": "sec-1"}]"#;
        let actions: Vec<RecommendedAction> = serde_json::from_str(json).unwrap();
        assert_eq!(actions[0], RecommendedAction::new("compact-logs"));
        assert_eq!(actions[1].target_agent.as_deref(), Some("sec-1"));
    }
}
