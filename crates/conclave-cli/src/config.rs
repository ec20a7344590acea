//! `conclave.toml` loading.

use anyhow::{bail, Context};
use conclave_core::AgentCard;
use conclave_discovery::DiscoveryConfig;
use conclave_orchestrator::{LoopConfig, RetryPolicy};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `discovery.bearer_token`.
pub const TOKEN_ENV: &str = "CONCLAVE_REMOTE_TOKEN";

/// Top-level configuration file.
#[derive(Debug, Deserialize)]
pub struct ConclaveConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    /// JSON file holding the recommended actions feed.
    #[serde(default = "default_actions_file")]
    pub actions_file: PathBuf,
    /// Sender id on assignment messages.
    #[serde(default = "default_orchestrator_id")]
    pub orchestrator_id: String,
    /// Agents registered into the local registry at startup.
    #[serde(default)]
    pub agents: Vec<AgentCard>,
}

/// `[queue]` section: retry policy and loop timing side by side.
#[derive(Debug, Default, Deserialize)]
pub struct QueueConfig {
    #[serde(flatten)]
    pub retry: RetryPolicy,
    #[serde(flatten)]
    pub timing: LoopConfig,
}

fn default_actions_file() -> PathBuf {
    PathBuf::from("actions.json")
}

fn default_orchestrator_id() -> String {
    conclave_orchestrator::DEFAULT_ORCHESTRATOR_ID.to_string()
}

impl ConclaveConfig {
    /// Replace the bearer token, ignoring empty values.
    pub fn override_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.discovery.bearer_token = Some(token);
        }
    }

    /// Resolve a relative actions file against the config file's directory.
    fn resolve_paths(&mut self, base: &Path) {
        if self.actions_file.is_relative() {
            self.actions_file = base.join(&self.actions_file);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.queue.retry.validate()?;
        if self.discovery.timeout_ms == 0 {
            bail!("discovery.timeout_ms must be greater than zero");
        }
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.agent_id.as_str()) {
                bail!("agent '{}' is listed more than once", agent.agent_id);
            }
        }
        Ok(())
    }
}

/// Read, parse, and validate the config file at `path`.
pub fn parse_config(path: &Path) -> anyhow::Result<ConclaveConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let mut config: ConclaveConfig = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    config.validate()?;
    Ok(config)
}
