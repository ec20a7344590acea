use crate::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle status of a registered agent.
///
/// Deserialization is lenient: any unrecognized string becomes
/// [`AgentStatus::Error`] instead of rejecting the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AgentStatus {
    /// Accepting work.
    Active,
    /// Registered but not accepting work.
    Inactive,
    /// Reported or inferred as broken.
    Error,
    /// Registered, not yet confirmed.
    Pending,
    /// Withdrawn from service.
    Retired,
}

impl AgentStatus {
    /// Parse a raw status string, mapping anything unknown to `Error`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => AgentStatus::Active,
            "inactive" => AgentStatus::Inactive,
            "pending" => AgentStatus::Pending,
            "retired" => AgentStatus::Retired,
            _ => AgentStatus::Error,
        }
    }

    /// Collapse into the routing view: `retired` is treated as `inactive`.
    pub fn normalized(self) -> Self {
        match self {
            AgentStatus::Retired => AgentStatus::Inactive,
            other => other,
        }
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
            AgentStatus::Error => "error",
            AgentStatus::Pending => "pending",
            AgentStatus::Retired => "retired",
        }
    }
}

impl From<String> for AgentStatus {
    fn from(raw: String) -> Self {
        Self::parse_lenient(&raw)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health as last reported through a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AgentHealth {
    /// Fully operational.
    Healthy,
    /// Operational with reduced capacity.
    Degraded,
    /// Not operational.
    Error,
}

impl AgentHealth {
    /// Parse a raw health string, mapping anything unknown to `Error`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "healthy" => AgentHealth::Healthy,
            "degraded" => AgentHealth::Degraded,
            _ => AgentHealth::Error,
        }
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentHealth::Healthy => "healthy",
            AgentHealth::Degraded => "degraded",
            AgentHealth::Error => "error",
        }
    }
}

impl From<String> for AgentHealth {
    fn from(raw: String) -> Self {
        Self::parse_lenient(&raw)
    }
}

impl std::fmt::Display for AgentHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The registration record of a single agent.
///
/// The same shape is exchanged with the remote directory, so field names are
/// camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Globally unique identifier.
    pub agent_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
    /// Coarse agent kind, e.g. `"analyzer"` or `"writer"`.
    #[serde(default)]
    pub agent_type: String,
    /// Version string advertised by the agent.
    #[serde(default)]
    pub version: String,
    /// Lifecycle status.
    #[serde(default = "default_status")]
    pub status: AgentStatus,
    /// Coarse-grained functions the agent supports.
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// Fine-grained abilities used for routing.
    #[serde(default)]
    pub skills: BTreeSet<String>,
    /// Last reported health, if any heartbeat was ever received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<AgentHealth>,
    /// Time of the most recent heartbeat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Credentials attached to assignment messages sent to this agent.
    #[serde(default)]
    pub credentials: Metadata,
    /// Authorization grants held by the agent.
    #[serde(default)]
    pub authorization: Metadata,
    /// Named endpoints, e.g. `"rpc" -> "https://..."`.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
    /// Free-form typed metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_status() -> AgentStatus {
    AgentStatus::Pending
}

impl AgentCard {
    /// Creates a card with the given id and type, `pending` status and no
    /// capabilities or skills.
    pub fn new(agent_id: impl Into<String>, agent_type: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        Self {
            display_name: agent_id.clone(),
            agent_id,
            agent_type: agent_type.into(),
            version: "0.1.0".to_string(),
            status: AgentStatus::Pending,
            capabilities: BTreeSet::new(),
            skills: BTreeSet::new(),
            health: None,
            last_heartbeat: None,
            credentials: Metadata::new(),
            authorization: Metadata::new(),
            endpoints: BTreeMap::new(),
            metadata: Metadata::new(),
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Sets the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the lifecycle status.
    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    /// Adds capabilities.
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Adds skills.
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self
    }

    /// Records a heartbeat with the given health at the given time.
    pub fn with_heartbeat(mut self, health: AgentHealth, at: DateTime<Utc>) -> Self {
        self.health = Some(health);
        self.last_heartbeat = Some(at);
        self
    }

    /// Replaces the credential map.
    pub fn with_credentials(mut self, credentials: Metadata) -> Self {
        self.credentials = credentials;
        self
    }

    /// Adds a named endpoint.
    pub fn with_endpoint(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.insert(name.into(), url.into());
        self
    }

    /// Whether the agent advertises `skill`.
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }

    /// Whether the agent advertises `capability`.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}
