use crate::clock::Clock;
use crate::provider::ActionProvider;
use crate::retry::RetryPolicy;
use crate::types::{
    DelegatedTask, DelegationStatus, ExecutionReport, TaskStatusView, TaskSummary,
};
use chrono::{DateTime, Utc};
use conclave_core::ConclaveResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Default)]
struct QueueState {
    /// All tasks in creation order. Tasks are never removed.
    tasks: Vec<DelegatedTask>,
    index: HashMap<Uuid, usize>,
    next_sequence: u64,
}

impl QueueState {
    fn get_mut(&mut self, id: Uuid) -> Option<&mut DelegatedTask> {
        let pos = *self.index.get(&id)?;
        self.tasks.get_mut(pos)
    }

    fn has_in_flight(&self, action: &str) -> bool {
        self.tasks
            .iter()
            .any(|t| t.action == action && t.status.is_in_flight())
    }

    fn push(&mut self, task: DelegatedTask) {
        self.index.insert(task.id, self.tasks.len());
        self.tasks.push(task);
        self.next_sequence += 1;
    }
}

/// Delegation queue with bounded retries and due-time requeueing.
///
/// Lifecycle: `queued -> dispatched -> completed | failed`, and
/// `failed -> queued` only through [`process_due_requeues`](Self::process_due_requeues)
/// while attempts remain. Every mutation takes the write lock, so mutations
/// are serialized and `mark_dispatched` is an atomic check-and-set. Readers
/// get cloned snapshots.
pub struct TaskQueue {
    state: RwLock<QueueState>,
    provider: Arc<dyn ActionProvider>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl TaskQueue {
    pub fn new(
        provider: Arc<dyn ActionProvider>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: RwLock::new(QueueState::default()),
            provider,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Pull a batch from the action provider and queue one task per action.
    ///
    /// An action that already has a queued or dispatched task is skipped;
    /// completed and failed tasks do not block a new one. Returns the ids of
    /// the tasks created, in creation order.
    pub async fn harvest_and_queue(&self) -> ConclaveResult<Vec<Uuid>> {
        let actions = self.provider.recommended_actions().await?;
        let now = self.clock.now();

        let mut state = self.state.write().await;
        let mut created = Vec::new();
        for action in &actions {
            if state.has_in_flight(&action.action) {
                debug!(action = %action.action, "Action already in flight, skipping");
                continue;
            }
            let task =
                DelegatedTask::new(action, self.policy.max_attempts, now, state.next_sequence);
            debug!(task_id = %task.id, action = %task.action, "Queued task");
            created.push(task.id);
            state.push(task);
        }

        if !created.is_empty() {
            info!(
                received = actions.len(),
                queued = created.len(),
                "Harvested recommended actions"
            );
        }
        Ok(created)
    }

    /// `queued -> dispatched`. Returns `false` when the task is unknown or
    /// not queued, so two concurrent callers can never both dispatch it.
    pub async fn mark_dispatched(&self, id: Uuid) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        match state.get_mut(id) {
            Some(task) if task.status == DelegationStatus::Queued => {
                task.status = DelegationStatus::Dispatched;
                task.next_attempt_unix = None;
                task.dispatched_at = Some(now);
                debug!(task_id = %id, action = %task.action, "Dispatched task");
                true
            }
            Some(task) => {
                debug!(task_id = %id, status = %task.status, "Task not queued, dispatch refused");
                false
            }
            None => false,
        }
    }

    /// Record the outcome of a dispatched task.
    ///
    /// Success completes the task. Failure counts an attempt and either
    /// schedules a retry at `now + backoff(attempts)` or, with no attempts
    /// left, leaves the task permanently failed. Returns `false` when the task
    /// is unknown or not dispatched.
    pub async fn mark_execution_result(&self, id: Uuid, report: ExecutionReport) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let Some(task) = state.get_mut(id) else {
            return false;
        };
        if task.status != DelegationStatus::Dispatched {
            debug!(task_id = %id, status = %task.status, "Task not dispatched, result ignored");
            return false;
        }

        task.duration_ms = Some(report.duration_ms);
        if report.success {
            task.status = DelegationStatus::Completed;
            task.completed_at = Some(now);
            task.last_result = report.result;
            info!(task_id = %id, action = %task.action, duration_ms = report.duration_ms, "Task completed");
        } else {
            let message = report
                .error_message
                .unwrap_or_else(|| "execution failed".to_string());
            record_failure(task, &self.policy, now, message, report.error_detail);
        }
        true
    }

    /// Requeue every failed task that is due at `now_unix` and has attempts
    /// left.
    ///
    /// Tasks are visited in ascending due time, ties broken by creation
    /// order, and their ids are returned in that order. A second call with the
    /// same `now_unix` finds nothing to do.
    pub async fn process_due_requeues(&self, now_unix: i64) -> Vec<Uuid> {
        let mut state = self.state.write().await;
        let mut due: Vec<(i64, u64, usize)> = state
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_due(now_unix))
            .map(|(pos, t)| (t.next_attempt_unix.unwrap_or(now_unix), t.sequence, pos))
            .collect();
        due.sort_unstable();

        let mut requeued = Vec::with_capacity(due.len());
        for (_, _, pos) in due {
            if let Some(task) = state.tasks.get_mut(pos) {
                task.status = DelegationStatus::Queued;
                task.next_attempt_unix = None;
                requeued.push(task.id);
            }
        }
        if !requeued.is_empty() {
            info!(count = requeued.len(), now_unix, "Requeued due tasks");
        }
        requeued
    }

    /// Fail dispatched tasks that have waited longer than `timeout` for a
    /// result, exactly as if the agent had reported a failure.
    pub async fn expire_stale_dispatches(
        &self,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Vec<Uuid> {
        let timeout = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX);
        let mut state = self.state.write().await;
        let mut expired = Vec::new();
        for task in &mut state.tasks {
            let stale = task.status == DelegationStatus::Dispatched
                && task
                    .dispatched_at
                    .is_some_and(|at| now.signed_duration_since(at) >= timeout);
            if stale {
                record_failure(
                    task,
                    &self.policy,
                    now,
                    "dispatch timed out".to_string(),
                    None,
                );
                expired.push(task.id);
            }
        }
        expired
    }

    pub async fn get_task(&self, id: Uuid) -> Option<DelegatedTask> {
        let state = self.state.read().await;
        state.index.get(&id).and_then(|&pos| state.tasks.get(pos)).cloned()
    }

    /// All tasks in creation order.
    pub async fn get_all_tasks(&self) -> Vec<DelegatedTask> {
        self.state.read().await.tasks.clone()
    }

    /// Queued tasks in creation order.
    pub async fn queued_tasks(&self) -> Vec<DelegatedTask> {
        self.state
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.status == DelegationStatus::Queued)
            .cloned()
            .collect()
    }

    pub async fn status_view(&self) -> TaskStatusView {
        let tasks = self.get_all_tasks().await;
        TaskStatusView {
            count: tasks.len(),
            tasks,
            timestamp: self.clock.now(),
        }
    }

    pub async fn summary(&self) -> TaskSummary {
        let state = self.state.read().await;
        let mut summary = TaskSummary {
            total: state.tasks.len(),
            ..TaskSummary::default()
        };
        for task in &state.tasks {
            match task.status {
                DelegationStatus::Queued => summary.queued += 1,
                DelegationStatus::Dispatched => summary.dispatched += 1,
                DelegationStatus::Completed => summary.completed += 1,
                DelegationStatus::Failed => {
                    summary.failed += 1;
                    if task.is_exhausted() {
                        summary.exhausted += 1;
                    }
                }
            }
        }
        summary
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// `dispatched -> failed`, counting one attempt and scheduling the retry.
fn record_failure(
    task: &mut DelegatedTask,
    policy: &RetryPolicy,
    now: DateTime<Utc>,
    message: String,
    detail: Option<String>,
) {
    task.status = DelegationStatus::Failed;
    task.attempts = (task.attempts + 1).min(task.max_attempts);
    task.last_error = Some(message);
    task.last_error_detail = detail;

    if task.attempts < task.max_attempts {
        let delay = i64::try_from(policy.backoff(task.attempts)).unwrap_or(i64::MAX);
        let due = now.timestamp().saturating_add(delay);
        task.next_attempt_unix = Some(due);
        warn!(
            task_id = %task.id,
            action = %task.action,
            attempts = task.attempts,
            max_attempts = task.max_attempts,
            next_attempt_unix = due,
            error = task.last_error.as_deref().unwrap_or_default(),
            "Task failed, retry scheduled"
        );
    } else {
        task.next_attempt_unix = None;
        warn!(
            task_id = %task.id,
            action = %task.action,
            attempts = task.attempts,
            error = task.last_error.as_deref().unwrap_or_default(),
            "Task failed permanently, retries exhausted"
        );
    }
}
