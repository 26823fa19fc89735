//! Sending-condition seam: an externally-hosted boolean gate checked before an
//! order is dispatched.

use async_trait::async_trait;

/// Errors from the condition endpoint
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    #[error("Condition endpoint transport error: {0}")]
    Transport(String),

    #[error("Condition endpoint returned status {0}")]
    Status(u16),

    #[error("Condition endpoint timed out")]
    Timeout,
}

/// Boolean condition capability
#[async_trait]
pub trait ConditionClient: Send + Sync {
    /// Evaluate the condition hosted at `endpoint`
    async fn check_send_condition(&self, endpoint: &str) -> Result<bool, ConditionError>;
}
