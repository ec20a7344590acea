use crate::registry::AgentRegistry;
use crate::remote::{DiscoveryConfig, RemoteDirectory, RemoteFailure, RemoteOutcome};
use conclave_core::{AgentCard, AgentFilter, ConclaveResult};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Where the agents of a [`Discovery`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    /// The remote directory answered.
    Remote,
    /// The local registry answered (no remote, or the remote failed).
    Local,
}

/// Result of a discovery lookup. Agents come from exactly one source.
#[derive(Debug, Clone, Serialize)]
pub struct Discovery {
    pub agents: Vec<AgentCard>,
    pub source: DiscoverySource,
}

/// Agent lookup that prefers the remote directory and falls back to the
/// local registry.
///
/// Every lookup first issues one time-bounded read against the remote. Any
/// transport error, timeout, non-success status, or malformed body is logged
/// and answered from the local registry with the same filter. Results from the
/// two sources are never merged within one call.
pub struct HybridDiscovery {
    local: Arc<AgentRegistry>,
    remote: Option<Arc<dyn RemoteDirectory>>,
    timeout: Duration,
}

impl HybridDiscovery {
    /// Discovery backed by the local registry only.
    pub fn local_only(local: Arc<AgentRegistry>) -> Self {
        Self {
            local,
            remote: None,
            timeout: DiscoveryConfig::default().timeout(),
        }
    }

    pub fn new(
        local: Arc<AgentRegistry>,
        remote: Arc<dyn RemoteDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            local,
            remote: Some(remote),
            timeout,
        }
    }

    /// The local registry backing the fallback path.
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.local
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    async fn query_remote(
        &self,
        remote: &dyn RemoteDirectory,
        filter: &AgentFilter,
    ) -> RemoteOutcome<Vec<AgentCard>> {
        match tokio::time::timeout(self.timeout, remote.fetch_agents(filter)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RemoteFailure::Timeout(self.timeout)),
        }
    }

    /// Look up agents matching `filter`, reporting which source answered.
    pub async fn discover(&self, filter: &AgentFilter) -> Discovery {
        if let Some(remote) = &self.remote {
            match self.query_remote(remote.as_ref(), filter).await {
                Ok(agents) => {
                    debug!(count = agents.len(), "Remote directory answered");
                    return Discovery {
                        agents,
                        source: DiscoverySource::Remote,
                    };
                }
                Err(failure) => {
                    warn!(error = %failure, filter = ?filter, "Remote directory unavailable, using local registry");
                }
            }
        }
        Discovery {
            agents: self.local.list_agents(filter),
            source: DiscoverySource::Local,
        }
    }

    pub async fn list_agents(&self, filter: &AgentFilter) -> Vec<AgentCard> {
        self.discover(filter).await.agents
    }

    pub async fn find_agents_by_type(&self, agent_type: &str) -> Vec<AgentCard> {
        self.list_agents(&AgentFilter::by_type(agent_type)).await
    }

    pub async fn find_agents_by_capability(&self, capability: &str) -> Vec<AgentCard> {
        self.list_agents(&AgentFilter::by_capability(capability))
            .await
    }

    pub async fn find_agents_by_skill(&self, skill: &str) -> Vec<AgentCard> {
        self.list_agents(&AgentFilter::by_skill(skill)).await
    }

    /// Look up one agent by id: remote record first, local record otherwise.
    ///
    /// Unlike [`discover`](Self::discover), the fallback here is per id: when
    /// the remote answers but does not list `agent_id`, the local record is
    /// returned. Registrations are local-first with a best-effort publish, so
    /// an agent whose publish has not landed yet is still reachable by id.
    /// The returned card always comes from a single source.
    pub async fn get_agent(&self, agent_id: &str) -> Option<AgentCard> {
        if let Some(remote) = &self.remote {
            match self.query_remote(remote.as_ref(), &AgentFilter::any()).await {
                Ok(agents) => {
                    if let Some(card) = agents.into_iter().find(|c| c.agent_id == agent_id) {
                        return Some(card);
                    }
                }
                Err(failure) => {
                    warn!(error = %failure, agent_id = %agent_id, "Remote directory unavailable, using local registry");
                }
            }
        }
        self.local.get_agent(agent_id)
    }

    /// Register locally, then publish to the remote on a best-effort basis.
    ///
    /// The local write is authoritative for this process; a failed publish is
    /// only logged and the remote catches up on a later registration.
    pub async fn register_agent(&self, card: AgentCard) -> ConclaveResult<()> {
        self.local.register_agent(card.clone())?;
        if let Some(remote) = &self.remote {
            let publish = tokio::time::timeout(self.timeout, remote.publish_agent(&card)).await;
            match publish {
                Ok(Ok(())) => debug!(agent_id = %card.agent_id, "Published agent to remote directory"),
                Ok(Err(failure)) => {
                    warn!(agent_id = %card.agent_id, error = %failure, "Remote publish failed");
                }
                Err(_) => {
                    warn!(agent_id = %card.agent_id, timeout_ms = self.timeout.as_millis() as u64, "Remote publish timed out");
                }
            }
        }
        Ok(())
    }
}
