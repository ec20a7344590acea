//! Agent discovery for Conclave.
//!
//! Combines an authoritative in-process registry with a remote directory
//! service. Lookups prefer the remote and fall back to the local registry
//! whenever the remote cannot answer in time or answers badly.
//!
//! # Main types
//!
//! - [`AgentRegistry`] — Local CRUD store of agent cards.
//! - [`RemoteDirectory`] — Port for the remote directory service.
//! - [`RemoteRegistryClient`] — HTTP implementation of [`RemoteDirectory`].
//! - [`HybridDiscovery`] — Remote-first lookup with local fallback.

/// Remote-first discovery with local fallback.
pub mod hybrid;
/// Local agent registry.
pub mod registry;
/// Remote directory port and HTTP client.
pub mod remote;

pub use hybrid::{Discovery, DiscoverySource, HybridDiscovery};
pub use registry::AgentRegistry;
pub use remote::{
    DiscoveryConfig, RemoteDirectory, RemoteFailure, RemoteOutcome, RemoteRegistryClient,
};
