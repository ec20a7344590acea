//! Agent selection, task assignment, and resilient task delegation.
//!
//! Routes work to the best-matching agent found through hybrid discovery,
//! delivers assignments over a communication port, and keeps delegated tasks
//! in a queue with bounded retries and due-time requeueing so transient
//! failures do not lose work.
//!
//! # Main types
//!
//! - [`Orchestrator`] — Selects agents per skill and sends assignment messages.
//! - [`TaskQueue`] — Delegation queue with retries and backoff scheduling.
//! - [`RetryPolicy`] — Attempt limit and backoff curve.
//! - [`CoordinationLoop`] — Periodic harvest / requeue / dispatch driver.
//! - [`Communication`] — Port through which assignments reach agents.
//! - [`ActionProvider`] — Source of recommended actions.

/// Injectable time source.
pub mod clock;
/// Communication port and in-process adapters.
pub mod communication;
/// Periodic coordination loop.
pub mod coordinator;
/// Agent selection, assignment, and dispatch.
pub mod engine;
/// Recommended-action providers.
pub mod provider;
/// Retry limits and backoff.
pub mod retry;
/// Delegation task queue.
pub mod task_queue;
/// Shared delegation types (DelegatedTask, DelegationStatus, views).
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use communication::{ChannelCommunication, Communication, LogCommunication};
pub use coordinator::{CoordinationLoop, LoopConfig, TickReport};
pub use engine::{
    rank_candidates, CoordinationReport, DispatchReport, Orchestrator, SkillAssignment,
    DEFAULT_ORCHESTRATOR_ID,
};
pub use provider::{ActionProvider, FileActionProvider, StaticActionProvider};
pub use retry::RetryPolicy;
pub use task_queue::TaskQueue;
pub use types::{
    DelegatedTask, DelegationStatus, ExecutionReport, RecommendedAction, TaskStatusView,
    TaskSummary,
};
