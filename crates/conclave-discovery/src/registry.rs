use chrono::{DateTime, Utc};
use conclave_core::{AgentCard, AgentFilter, AgentHealth, ConclaveError, ConclaveResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryState {
    cards: HashMap<String, AgentCard>,
    /// Registration order of the ids present in `cards`.
    order: Vec<String>,
}

/// Authoritative local store of agent cards.
///
/// All access goes through the methods below; reads return clones so callers
/// can never mutate a stored card in place.
pub struct AgentRegistry {
    state: RwLock<RegistryState>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Creates a registry seeded with `cards`, skipping duplicate ids.
    pub fn with_agents(cards: impl IntoIterator<Item = AgentCard>) -> Self {
        let registry = Self::new();
        for card in cards {
            // Seed lists may repeat an id; the first one wins.
            let _ = registry.register_agent(card);
        }
        registry
    }

    /// Insert a new card. Fails with `DuplicateAgent` if the id exists.
    pub fn register_agent(&self, card: AgentCard) -> ConclaveResult<()> {
        let mut state = self.state.write();
        if state.cards.contains_key(&card.agent_id) {
            return Err(ConclaveError::DuplicateAgent(card.agent_id));
        }
        info!(agent_id = %card.agent_id, agent_type = %card.agent_type, "Registered agent");
        state.order.push(card.agent_id.clone());
        state.cards.insert(card.agent_id.clone(), card);
        Ok(())
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<AgentCard> {
        self.state.read().cards.get(agent_id).cloned()
    }

    /// Matching cards in registration order.
    pub fn list_agents(&self, filter: &AgentFilter) -> Vec<AgentCard> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|id| state.cards.get(id))
            .filter(|card| filter.matches(card))
            .cloned()
            .collect()
    }

    /// Replace an existing card. Fails with `NotFound` if the id is absent.
    pub fn update_agent(&self, card: AgentCard) -> ConclaveResult<()> {
        let mut state = self.state.write();
        match state.cards.get_mut(&card.agent_id) {
            Some(existing) => {
                debug!(agent_id = %card.agent_id, "Updated agent");
                *existing = card;
                Ok(())
            }
            None => Err(ConclaveError::NotFound(format!("agent {}", card.agent_id))),
        }
    }

    /// Remove a card. Returns whether anything was removed; removing an
    /// unknown id is not an error.
    pub fn remove_agent(&self, agent_id: &str) -> bool {
        let mut state = self.state.write();
        if state.cards.remove(agent_id).is_some() {
            state.order.retain(|id| id != agent_id);
            info!(agent_id = %agent_id, "Removed agent");
            true
        } else {
            false
        }
    }

    /// Record a heartbeat. Returns `false` for an unknown agent.
    pub fn heartbeat(&self, agent_id: &str, health: AgentHealth, at: DateTime<Utc>) -> bool {
        let mut state = self.state.write();
        match state.cards.get_mut(agent_id) {
            Some(card) => {
                card.health = Some(health);
                card.last_heartbeat = Some(at);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
