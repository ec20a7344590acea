use crate::clock::Clock;
use crate::engine::{DispatchReport, Orchestrator};
use crate::task_queue::TaskQueue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Timing of the coordination loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Seconds between ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Fail dispatched tasks that report nothing for this many seconds.
    /// Disabled when unset.
    #[serde(default)]
    pub dispatch_timeout_secs: Option<u64>,
}

fn default_poll_interval_secs() -> u64 {
    15
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            dispatch_timeout_secs: None,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub harvested: Vec<Uuid>,
    pub requeued: Vec<Uuid>,
    pub expired: Vec<Uuid>,
    pub dispatch: DispatchReport,
}

/// Drives the queue: harvest, requeue due tasks, expire stale dispatches,
/// then dispatch everything queued.
pub struct CoordinationLoop {
    orchestrator: Arc<Orchestrator>,
    queue: Arc<TaskQueue>,
    clock: Arc<dyn Clock>,
    config: LoopConfig,
}

impl CoordinationLoop {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        queue: Arc<TaskQueue>,
        clock: Arc<dyn Clock>,
        config: LoopConfig,
    ) -> Self {
        Self {
            orchestrator,
            queue,
            clock,
            config,
        }
    }

    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    /// Run one pass. A failing action feed is logged and the rest of the pass
    /// still runs.
    pub async fn tick(&self) -> TickReport {
        let harvested = match self.queue.harvest_and_queue().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Harvest failed, continuing with existing tasks");
                Vec::new()
            }
        };

        let requeued = self
            .queue
            .process_due_requeues(self.clock.now_unix())
            .await;

        let expired = match self.config.dispatch_timeout_secs {
            Some(secs) => {
                self.queue
                    .expire_stale_dispatches(self.clock.now(), Duration::from_secs(secs))
                    .await
            }
            None => Vec::new(),
        };

        let dispatch = self.orchestrator.dispatch_queued(&self.queue).await;

        TickReport {
            harvested,
            requeued,
            expired,
            dispatch,
        }
    }

    /// Tick on a fixed interval until the returned handle is aborted.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let period = Duration::from_secs(self.config.poll_interval_secs.max(1));
        info!(interval_secs = period.as_secs(), "Coordination loop started");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let report = self.tick().await;
                if !report.expired.is_empty() {
                    warn!(count = report.expired.len(), "Expired stale dispatches");
                }
            }
        })
    }
}
