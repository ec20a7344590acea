use crate::communication::Communication;
use crate::task_queue::TaskQueue;
use crate::types::{DelegatedTask, ExecutionReport};
use conclave_core::{AgentCard, AgentHealth, AgentMessage, AgentStatus, TaskContext};
use conclave_discovery::HybridDiscovery;
use serde::Serialize;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sender id used on assignment messages unless overridden.
pub const DEFAULT_ORCHESTRATOR_ID: &str = "orchestrator";

/// Outcome of routing one skill during a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillAssignment {
    pub skill: String,
    /// Selected agent, or `None` when no agent advertises the skill.
    pub agent_id: Option<String>,
    pub delivered: bool,
}

/// Result of [`Orchestrator::coordinate_agents_for_task`], one entry per
/// required skill in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinationReport {
    pub assignments: Vec<SkillAssignment>,
}

impl CoordinationReport {
    pub fn delivered_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.delivered).count()
    }

    pub fn unassigned_skills(&self) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|a| a.agent_id.is_none())
            .map(|a| a.skill.as_str())
            .collect()
    }
}

/// Result of one [`Orchestrator::dispatch_queued`] pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    /// `(task, agent)` pairs whose assignment was delivered.
    pub dispatched: Vec<(Uuid, String)>,
    /// Tasks left queued because no agent matched.
    pub unroutable: Vec<Uuid>,
    /// Tasks claimed but whose assignment could not be delivered; they are
    /// recorded as failed executions.
    pub undelivered: Vec<Uuid>,
}

fn health_rank(health: Option<AgentHealth>) -> u8 {
    match health.unwrap_or(AgentHealth::Error) {
        AgentHealth::Healthy => 0,
        AgentHealth::Degraded => 1,
        AgentHealth::Error => 2,
    }
}

fn status_rank(status: AgentStatus) -> u8 {
    match status.normalized() {
        AgentStatus::Active => 0,
        AgentStatus::Pending => 1,
        AgentStatus::Inactive | AgentStatus::Retired => 2,
        AgentStatus::Error => 3,
    }
}

/// Orders candidates best-first: health (healthy, degraded, error/absent),
/// then status (active, pending, inactive/retired, error), then most recent
/// heartbeat, then `agentId`. The order is total, so selection is
/// reproducible for the same input.
pub fn rank_candidates(mut candidates: Vec<AgentCard>) -> Vec<AgentCard> {
    candidates.sort_by(|a, b| {
        let key = |c: &AgentCard| {
            (
                health_rank(c.health),
                status_rank(c.status),
                Reverse(c.last_heartbeat),
            )
        };
        key(a)
            .cmp(&key(b))
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    });
    candidates
}

/// Routes work to agents found through [`HybridDiscovery`] and delivers
/// assignments over a [`Communication`] port.
pub struct Orchestrator {
    id: String,
    discovery: Arc<HybridDiscovery>,
    comms: Arc<dyn Communication>,
}

impl Orchestrator {
    pub fn new(discovery: Arc<HybridDiscovery>, comms: Arc<dyn Communication>) -> Self {
        Self {
            id: DEFAULT_ORCHESTRATOR_ID.to_string(),
            discovery,
            comms,
        }
    }

    /// Overrides the sender id placed on assignment messages.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn discovery(&self) -> &Arc<HybridDiscovery> {
        &self.discovery
    }

    /// Best agent advertising `skill`, or `None` if there is no candidate.
    pub async fn select_best_agent(&self, skill: &str) -> Option<AgentCard> {
        let candidates = self.discovery.find_agents_by_skill(skill).await;
        let best = rank_candidates(candidates).into_iter().next();
        match &best {
            Some(agent) => debug!(skill = %skill, agent_id = %agent.agent_id, "Selected agent"),
            None => debug!(skill = %skill, "No agent advertises skill"),
        }
        best
    }

    /// Send `task` to `agent` as a request message.
    ///
    /// Returns `false` if the message cannot be built or delivered; the cause
    /// is logged and never propagated.
    pub async fn assign_task(&self, agent: &AgentCard, task: &TaskContext) -> bool {
        let credentials = (!agent.credentials.is_empty()).then(|| agent.credentials.clone());
        let message = match AgentMessage::request(&self.id, &agent.agent_id, task, credentials) {
            Ok(message) => message,
            Err(e) => {
                warn!(agent_id = %agent.agent_id, error = %e, "Could not build assignment");
                return false;
            }
        };

        match self.comms.send(message).await {
            Ok(()) => {
                info!(
                    agent_id = %agent.agent_id,
                    task_type = %task.task_type,
                    channel = self.comms.name(),
                    "Assigned task"
                );
                true
            }
            Err(e) => {
                warn!(agent_id = %agent.agent_id, task_type = %task.task_type, error = %e, "Assignment delivery failed");
                false
            }
        }
    }

    /// Route every required skill independently. A skill with no agent, or a
    /// failed delivery, does not stop the remaining skills.
    pub async fn coordinate_agents_for_task(&self, task: &TaskContext) -> CoordinationReport {
        let mut report = CoordinationReport::default();
        for skill in &task.required_skills {
            let assignment = match self.select_best_agent(skill).await {
                Some(agent) => {
                    let delivered = self.assign_task(&agent, task).await;
                    SkillAssignment {
                        skill: skill.clone(),
                        agent_id: Some(agent.agent_id),
                        delivered,
                    }
                }
                None => {
                    warn!(skill = %skill, task_type = %task.task_type, "No agent for required skill");
                    SkillAssignment {
                        skill: skill.clone(),
                        agent_id: None,
                        delivered: false,
                    }
                }
            };
            report.assignments.push(assignment);
        }
        report
    }

    async fn route(&self, task: &DelegatedTask) -> Option<AgentCard> {
        match &task.target_agent {
            Some(agent_id) => self.discovery.get_agent(agent_id).await,
            None => self.select_best_agent(&task.action).await,
        }
    }

    /// Dispatch every queued task to an agent.
    ///
    /// Tasks naming a target agent go to that agent; the rest are routed by
    /// using the action as the skill. Tasks without a match stay queued.
    ///
    /// Delivery failures are handled differently here than in
    /// [`assign_task`](Self::assign_task), which never touches task state. A
    /// task is claimed with `mark_dispatched` before its assignment is sent,
    /// so an undelivered assignment is recorded as a failed execution: it
    /// uses up one attempt and is retried on the policy's backoff, and an
    /// agent that keeps rejecting deliveries exhausts the task.
    pub async fn dispatch_queued(&self, queue: &TaskQueue) -> DispatchReport {
        let mut report = DispatchReport::default();
        for task in queue.queued_tasks().await {
            let Some(agent) = self.route(&task).await else {
                report.unroutable.push(task.id);
                continue;
            };
            if !queue.mark_dispatched(task.id).await {
                // Claimed by someone else in the meantime.
                continue;
            }

            let description = format!("Delegated action: {}", task.action);
            let context = TaskContext::new(task.action.clone(), description)
                .with_skills([task.action.clone()])
                .for_task(task.id);
            if self.assign_task(&agent, &context).await {
                report.dispatched.push((task.id, agent.agent_id));
            } else {
                queue
                    .mark_execution_result(
                        task.id,
                        ExecutionReport::failure(
                            "assignment delivery failed",
                            Some(format!("agent {}", agent.agent_id)),
                            0,
                        ),
                    )
                    .await;
                report.undelivered.push(task.id);
            }
        }
        if !report.dispatched.is_empty() || !report.undelivered.is_empty() {
            info!(
                dispatched = report.dispatched.len(),
                undelivered = report.undelivered.len(),
                unroutable = report.unroutable.len(),
                "Dispatch pass complete"
            );
        }
        report
    }
}
