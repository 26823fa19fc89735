//! # Profile / Directory Client
//!
//! Batch lookups against the external contact and registry directories:
//! person contact points by national identity number, organization contact
//! points by organization number, and display names for keyword substitution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Errors from the directory services
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Directory transport error: {0}")]
    Transport(String),

    #[error("Directory returned status {0}")]
    Status(u16),

    #[error("Directory response could not be decoded: {0}")]
    Decode(String),
}

/// Contact points registered for a person
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContactPoints {
    pub national_identity_number: String,
    /// Reservation against electronic contact from the register
    pub is_reserved: bool,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
}

/// Contact points registered for an organization: official notification
/// addresses plus the contact points of users registered for the organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationContactPoints {
    pub organization_number: String,
    pub email_addresses: Vec<String>,
    pub mobile_numbers: Vec<String>,
    /// User-registered contact points, subject to resource authorization
    pub user_contact_points: Vec<UserContactPoints>,
}

/// Batch directory lookups consumed by contact-point resolution and keyword
/// substitution
#[async_trait]
pub trait ProfileClient: Send + Sync {
    /// Contact points for the given national identity numbers; unmatched
    /// numbers are absent from the result
    async fn get_user_contact_points(
        &self,
        national_identity_numbers: &[String],
    ) -> Result<Vec<UserContactPoints>, ProfileError>;

    /// Contact points for the given organization numbers; unmatched numbers
    /// are absent from the result
    async fn get_organization_contact_points(
        &self,
        organization_numbers: &[String],
    ) -> Result<Vec<OrganizationContactPoints>, ProfileError>;

    /// Display names keyed by national identity number; unmatched numbers are
    /// absent from the map
    async fn get_user_display_names(
        &self,
        national_identity_numbers: &[String],
    ) -> Result<HashMap<String, String>, ProfileError>;

    /// Display names keyed by organization number; unmatched numbers are
    /// absent from the map
    async fn get_organization_display_names(
        &self,
        organization_numbers: &[String],
    ) -> Result<HashMap<String, String>, ProfileError>;
}
