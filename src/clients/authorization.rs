//! Authorization seam: filters user-registered organization contact points to
//! the subset granted access to a resource.

use async_trait::async_trait;

use super::profile::UserContactPoints;

/// Errors from the authorization service
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error("Authorization transport error: {0}")]
    Transport(String),

    #[error("Authorization returned status {0}")]
    Status(u16),
}

/// Resource-scoped access filter for user-level contact points
#[async_trait]
pub trait AuthorizationClient: Send + Sync {
    /// Return the subset of `contact_points` whose users are authorized for
    /// `resource_id` within the given organization
    async fn authorized_user_contact_points(
        &self,
        contact_points: Vec<UserContactPoints>,
        organization_number: &str,
        resource_id: &str,
    ) -> Result<Vec<UserContactPoints>, AuthorizationError>;
}
