/// Top-level error type for the Conclave coordination layer.
///
/// Conditions that callers are expected to observe routinely (an unknown task
/// id, a remote directory that is down) are not reported through this type:
/// lookups return `Option`/`bool` and discovery falls back silently. The
/// variants below cover the cases that must be rejected or surfaced.
#[derive(Debug, thiserror::Error)]
pub enum ConclaveError {
    /// An agent or task id that does not exist, where the caller required it.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A registration collided with an existing `agentId`.
    #[error("Duplicate agent: {0}")]
    DuplicateAgent(String),

    /// The remote directory could not serve a request.
    #[error("Remote directory unavailable: {0}")]
    RemoteUnavailable(String),

    /// An assignment message could not be delivered to an agent.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// A task used up all of its attempts.
    #[error("Retries exhausted for task {0}")]
    RetryExhausted(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The recommended-action feed failed to produce a batch.
    #[error("Action provider error: {0}")]
    Provider(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`ConclaveError`].
pub type ConclaveResult<T> = Result<T, ConclaveError>;
