//! Core types and error definitions for the Conclave coordination layer.
//!
//! This crate provides the foundational types shared across all Conclave
//! crates: the agent card model exchanged with the remote directory, typed
//! metadata, agent filters, the assignment message, and the error taxonomy.
//!
//! # Main types
//!
//! - [`ConclaveError`] — Unified error enum for all Conclave subsystems.
//! - [`ConclaveResult`] — Convenience alias for `Result<T, ConclaveError>`.
//! - [`AgentCard`] — Registration record of an agent.
//! - [`AgentFilter`] — AND-combined query over agent cards.
//! - [`AgentMessage`] — Directed assignment message sent to an agent.
//! - [`TaskContext`] — Work description serialized into an assignment.

/// Agent card, status, and health types.
pub mod agent;
/// Error taxonomy.
pub mod error;
/// Agent filters shared by the local registry and the remote directory.
pub mod filter;
/// Assignment messages and task contexts.
pub mod message;
/// Typed key-value metadata.
pub mod metadata;

pub use agent::{AgentCard, AgentHealth, AgentStatus};
pub use error::{ConclaveError, ConclaveResult};
pub use filter::AgentFilter;
pub use message::{AgentMessage, MessageContext, MessageType, TaskContext};
pub use metadata::{MetaValue, Metadata};
