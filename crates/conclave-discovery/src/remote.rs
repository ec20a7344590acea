//! Client side of the remote agent directory.
//!
//! The directory is queried with idempotent `GET {base}/agents` calls carrying
//! the filter as query parameters (`type`, `capability`, `skill`, `health`,
//! `version`, `status`) and a bearer token. A successful response body is a
//! JSON array of agent cards, or an object wrapping one under `"agents"`.
//! The filter is re-applied to the decoded cards, so a directory that ignores
//! a parameter never widens the result.

use async_trait::async_trait;
use conclave_core::{AgentCard, AgentFilter, ConclaveError, ConclaveResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Why a remote directory call did not produce a usable answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteFailure {
    /// Connection refused, DNS failure, reset, and similar transport errors.
    #[error("network error: {0}")]
    Network(String),
    /// No complete answer within the configured bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The directory answered with a non-success HTTP status.
    #[error("unexpected status {0}")]
    Status(u16),
    /// The body could not be decoded into agent cards.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<RemoteFailure> for ConclaveError {
    fn from(failure: RemoteFailure) -> Self {
        ConclaveError::RemoteUnavailable(failure.to_string())
    }
}

/// Outcome of a remote lookup, branched on explicitly by callers.
pub type RemoteOutcome<T> = Result<T, RemoteFailure>;

/// A directory service that mirrors agent registrations.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Fetch the cards matching `filter`.
    async fn fetch_agents(&self, filter: &AgentFilter) -> RemoteOutcome<Vec<AgentCard>>;

    /// Publish (create or replace) a card in the directory.
    async fn publish_agent(&self, card: &AgentCard) -> RemoteOutcome<()>;
}

/// Settings for reaching the remote directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Base URL of the directory, e.g. `https://directory.example/api`.
    /// Discovery runs local-only when unset.
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Hard upper bound on a single remote call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    2_000
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            bearer_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AgentListing {
    Bare(Vec<AgentCard>),
    Wrapped { agents: Vec<AgentCard> },
}

impl AgentListing {
    fn into_cards(self) -> Vec<AgentCard> {
        match self {
            AgentListing::Bare(cards) | AgentListing::Wrapped { agents: cards } => cards,
        }
    }
}

/// HTTP client for the remote directory.
pub struct RemoteRegistryClient {
    base_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
    http: reqwest::Client,
}

impl RemoteRegistryClient {
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> ConclaveResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConclaveError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
            timeout,
            http,
        })
    }

    /// Builds a client from configuration; `None` when no URL is configured.
    pub fn from_config(config: &DiscoveryConfig) -> ConclaveResult<Option<Self>> {
        config
            .remote_url
            .as_ref()
            .map(|url| Self::new(url.clone(), config.bearer_token.clone(), config.timeout()))
            .transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn agents_url(&self) -> String {
        format!("{}/agents", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn classify(&self, err: reqwest::Error) -> RemoteFailure {
        if err.is_timeout() {
            RemoteFailure::Timeout(self.timeout)
        } else {
            RemoteFailure::Network(err.to_string())
        }
    }
}

#[async_trait]
impl RemoteDirectory for RemoteRegistryClient {
    async fn fetch_agents(&self, filter: &AgentFilter) -> RemoteOutcome<Vec<AgentCard>> {
        let url = self.agents_url();
        debug!(url = %url, query = ?filter.to_query(), "Querying remote directory");

        let resp = self
            .authorize(self.http.get(&url).query(&filter.to_query()))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteFailure::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(|e| self.classify(e))?;
        let listing: AgentListing =
            serde_json::from_str(&body).map_err(|e| RemoteFailure::Malformed(e.to_string()))?;

        // The directory may ignore some query parameters; the local filter
        // contract still holds for every card returned.
        let received = listing.into_cards();
        let total = received.len();
        let cards: Vec<AgentCard> = received.into_iter().filter(|c| filter.matches(c)).collect();
        if cards.len() < total {
            debug!(
                dropped = total - cards.len(),
                "Remote directory returned cards outside the filter"
            );
        }
        Ok(cards)
    }

    async fn publish_agent(&self, card: &AgentCard) -> RemoteOutcome<()> {
        let resp = self
            .authorize(self.http.post(self.agents_url()).json(card))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteFailure::Status(status.as_u16()))
        }
    }
}
