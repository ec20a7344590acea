use conclave_core::{ConclaveError, ConclaveResult};
use serde::{Deserialize, Serialize};

/// Retry limits and backoff for delegated tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts a task may use before it is permanently failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay in seconds after the first failure.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    /// Cap on the delay in seconds.
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    30
}

fn default_backoff_max_secs() -> u64 {
    3_600
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_secs: default_backoff_base_secs(),
            backoff_max_secs: default_backoff_max_secs(),
        }
    }
}

impl RetryPolicy {
    /// Policy with a constant delay between attempts.
    pub fn fixed(max_attempts: u32, delay_secs: u64) -> Self {
        Self {
            max_attempts,
            backoff_base_secs: delay_secs,
            backoff_max_secs: delay_secs,
        }
    }

    /// Delay in seconds before a task that has failed `attempts` times is due.
    ///
    /// `base * 2^(attempts - 1)` capped at `backoff_max_secs`; zero attempts
    /// means no delay. Non-decreasing in `attempts`.
    pub fn backoff(&self, attempts: u32) -> u64 {
        if attempts == 0 {
            return 0;
        }
        let factor = 2u64.saturating_pow(attempts - 1);
        self.backoff_base_secs
            .saturating_mul(factor)
            .min(self.backoff_max_secs)
    }

    /// Rejects policies that could never run a task.
    pub fn validate(&self) -> ConclaveResult<()> {
        if self.max_attempts == 0 {
            return Err(ConclaveError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
