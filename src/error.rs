//! # Structured Error Handling
//!
//! Central error type for the dispatch pipeline. Transient external failures
//! (queue publish, condition endpoint, directory lookup) are recovered locally
//! by the components and never surface through this type; what does surface is
//! repository failures, configuration problems and cooperative cancellation.
//! Data invariant violations (a missing template for the channel being
//! generated, a delivery unit with no recognizable identifier) panic instead —
//! they indicate a broken invariant, not an external condition.

use crate::clients::authorization::AuthorizationError;
use crate::clients::condition::ConditionError;
use crate::clients::profile::ProfileError;
use crate::clients::repository::RepositoryError;

/// Errors surfaced by the dispatch pipeline
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Profile lookup error: {0}")]
    ProfileLookup(#[from] ProfileError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Condition check error: {0}")]
    ConditionCheck(#[from] ConditionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Processing cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, NotifyError>;
