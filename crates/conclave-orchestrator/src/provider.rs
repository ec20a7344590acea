use crate::types::RecommendedAction;
use async_trait::async_trait;
use conclave_core::{ConclaveError, ConclaveResult};
use parking_lot::Mutex;
use std::path::PathBuf;

/// Source of recommended actions (the external analysis feed).
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Pull the next batch of recommended actions.
    async fn recommended_actions(&self) -> ConclaveResult<Vec<RecommendedAction>>;
}

/// In-memory provider. Each pull drains everything pushed so far.
#[derive(Default)]
pub struct StaticActionProvider {
    pending: Mutex<Vec<RecommendedAction>>,
}

impl StaticActionProvider {
    pub fn new(actions: Vec<RecommendedAction>) -> Self {
        Self {
            pending: Mutex::new(actions),
        }
    }

    pub fn push(&self, action: RecommendedAction) {
        self.pending.lock().push(action);
    }
}

#[async_trait]
impl ActionProvider for StaticActionProvider {
    async fn recommended_actions(&self) -> ConclaveResult<Vec<RecommendedAction>> {
        Ok(std::mem::take(&mut *self.pending.lock()))
    }
}

/// Reads a JSON array of actions from a file on every pull.
///
/// A missing file is an empty batch; the queue's in-flight dedupe keeps
/// repeated reads of the same file from piling up duplicate tasks.
pub struct FileActionProvider {
    path: PathBuf,
}

impl FileActionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ActionProvider for FileActionProvider {
    async fn recommended_actions(&self) -> ConclaveResult<Vec<RecommendedAction>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }
        let data = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&data).map_err(|e| {
            ConclaveError::Provider(format!(
                "Failed to parse actions file {}: {e}",
                self.path.display()
            ))
        })
    }
}
