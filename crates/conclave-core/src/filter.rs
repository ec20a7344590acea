use crate::agent::{AgentCard, AgentHealth, AgentStatus};
use serde::{Deserialize, Serialize};

/// Query over agent cards. Present fields are AND-combined; absent fields
/// match everything.
///
/// Scalar fields (`agent_type`, `version`, `status`, `health`) match exactly;
/// `capability` and `skill` test set membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFilter {
    /// Exact agent type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    /// Capability the agent must advertise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    /// Skill the agent must advertise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    /// Exact health.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<AgentHealth>,
    /// Exact version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Exact status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
}

impl AgentFilter {
    /// A filter that matches every agent.
    pub fn any() -> Self {
        Self::default()
    }

    /// Filter on agent type only.
    pub fn by_type(agent_type: impl Into<String>) -> Self {
        Self {
            agent_type: Some(agent_type.into()),
            ..Self::default()
        }
    }

    /// Filter on a capability only.
    pub fn by_capability(capability: impl Into<String>) -> Self {
        Self {
            capability: Some(capability.into()),
            ..Self::default()
        }
    }

    /// Filter on a skill only.
    pub fn by_skill(skill: impl Into<String>) -> Self {
        Self {
            skill: Some(skill.into()),
            ..Self::default()
        }
    }

    /// Adds a status constraint.
    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds a health constraint.
    pub fn with_health(mut self, health: AgentHealth) -> Self {
        self.health = Some(health);
        self
    }

    /// Adds a version constraint.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Whether `card` satisfies every present field.
    pub fn matches(&self, card: &AgentCard) -> bool {
        self.agent_type
            .as_deref()
            .map_or(true, |t| card.agent_type == t)
            && self
                .capability
                .as_deref()
                .map_or(true, |c| card.has_capability(c))
            && self.skill.as_deref().map_or(true, |s| card.has_skill(s))
            && self.health.map_or(true, |h| card.health == Some(h))
            && self
                .version
                .as_deref()
                .map_or(true, |v| card.version == v)
            && self.status.map_or(true, |s| card.status == s)
    }

    /// Query parameters for the remote directory, in a stable order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(t) = &self.agent_type {
            params.push(("type", t.clone()));
        }
        if let Some(c) = &self.capability {
            params.push(("capability", c.clone()));
        }
        if let Some(s) = &self.skill {
            params.push(("skill", s.clone()));
        }
        if let Some(h) = self.health {
            params.push(("health", h.as_str().to_string()));
        }
        if let Some(v) = &self.version {
            params.push(("version", v.clone()));
        }
        if let Some(s) = self.status {
            params.push(("status", s.as_str().to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn card() -> AgentCard {
        AgentCard::new("a-1", "analyzer")
            .with_version("1.2.0")
            .with_status(AgentStatus::Active)
            .with_capabilities(["analysis"])
            .with_skills(["summarize", "classify"])
            .with_heartbeat(AgentHealth::Healthy, Utc::now())
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(AgentFilter::any().matches(&card()));
    }

    #[test]
    fn test_and_combination() {
        let filter = AgentFilter::by_skill("classify").with_status(AgentStatus::Active);
        assert!(filter.matches(&card()));

        let filter = AgentFilter::by_skill("classify").with_status(AgentStatus::Inactive);
        assert!(!filter.matches(&card()));
    }

    #[test]
    fn test_health_filter_requires_reported_health() {
        let silent = AgentCard::new("b", "analyzer");
        let filter = AgentFilter::any().with_health(AgentHealth::Healthy);
        assert!(!filter.matches(&silent));
        assert!(filter.matches(&card()));
    }

    #[test]
    fn test_type_and_version_are_exact() {
        assert!(!AgentFilter::by_type("analy").matches(&card()));
        assert!(AgentFilter::by_type("analyzer")
            .with_version("1.2.0")
            .matches(&card()));
        assert!(!AgentFilter::any().with_version("1.2").matches(&card()));
    }

    #[test]
    fn test_to_query_order_and_names() {
        let filter = AgentFilter {
            agent_type: Some("writer".into()),
            skill: Some("draft".into()),
            status: Some(AgentStatus::Active),
            ..AgentFilter::default()
        };
        let query = filter.to_query();
        assert_eq!(
            query,
            vec![
                ("type", "writer".to_string()),
                ("skill", "draft".to_string()),
                ("status", "active".to_string()),
            ]
        );
    }
}
