//! # Order / Notification Repository Seams
//!
//! Durable storage contracts for orders and delivery units. The pipeline never
//! talks SQL; it drives these traits and relies on the documented transactional
//! behavior of each operation (claim-style reads transition state, termination
//! completes the parent order in the same unit of work).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    EmailNotification, EmailNotificationResult, NotificationOrder, OrderProcessingStatus,
    SendingTimePolicy, SmsNotification, SmsNotificationResult,
};

/// Errors from durable storage
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Order {0} not found")]
    OrderNotFound(Uuid),

    #[error("Notification {0} not found")]
    NotificationNotFound(Uuid),
}

/// Identity snapshot of an email delivery unit already registered for an
/// order, used by the idempotent-retry guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredEmailRecipient {
    pub to_address: String,
    pub national_identity_number: Option<String>,
    pub organization_number: Option<String>,
}

/// Identity snapshot of an SMS delivery unit already registered for an order,
/// used by the idempotent-retry guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSmsRecipient {
    pub mobile_number: String,
    pub national_identity_number: Option<String>,
    pub organization_number: Option<String>,
}

/// Order-level storage operations
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Claim a batch of orders whose requested send time has passed,
    /// transitioning each from `Registered` to `Processing`
    async fn claim_past_due_orders(
        &self,
        limit: usize,
    ) -> Result<Vec<NotificationOrder>, RepositoryError>;

    /// Set the processing status of an order
    async fn set_processing_status(
        &self,
        order_id: Uuid,
        status: OrderProcessingStatus,
    ) -> Result<(), RepositoryError>;

    /// Whether every delivery unit belonging to the order has reached a
    /// terminal result; true for an order with no units
    async fn all_notifications_terminal(&self, order_id: Uuid) -> Result<bool, RepositoryError>;

    /// Insert a status-feed entry for an order that reached a terminal status
    async fn insert_status_feed_entry(&self, order_id: Uuid) -> Result<(), RepositoryError>;
}

/// Email delivery-unit storage operations
#[async_trait]
pub trait EmailNotificationRepository: Send + Sync {
    /// Persist a newly generated delivery unit
    async fn insert(&self, notification: EmailNotification) -> Result<(), RepositoryError>;

    /// Identity snapshots of every unit already registered for the order
    async fn registered_recipients(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<RegisteredEmailRecipient>, RepositoryError>;

    /// Claim up to `limit` publish-eligible units, transitioning each from
    /// `New` to `Sending`
    async fn claim_new_notifications(
        &self,
        limit: usize,
    ) -> Result<Vec<EmailNotification>, RepositoryError>;

    /// Set the result of a unit; used by the publish step to revert transient
    /// failures to `New` and by the delivery-report path for terminal results
    async fn set_result(
        &self,
        notification_id: Uuid,
        result: EmailNotificationResult,
    ) -> Result<(), RepositoryError>;

    /// Units past expiry that have not reached a terminal result
    async fn expired_notifications(&self) -> Result<Vec<EmailNotification>, RepositoryError>;

    /// Transition a unit to `FailedTtl`; when it is the last outstanding unit
    /// of its order, the order is completed and a status-feed entry written in
    /// the same unit of work
    async fn terminate(&self, notification_id: Uuid) -> Result<(), RepositoryError>;
}

/// SMS delivery-unit storage operations
#[async_trait]
pub trait SmsNotificationRepository: Send + Sync {
    /// Persist a newly generated delivery unit
    async fn insert(&self, notification: SmsNotification) -> Result<(), RepositoryError>;

    /// Identity snapshots of every unit already registered for the order
    async fn registered_recipients(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<RegisteredSmsRecipient>, RepositoryError>;

    /// Claim up to `limit` publish-eligible units for one sending-time policy,
    /// transitioning each from `New` to `Sending`
    async fn claim_new_notifications(
        &self,
        limit: usize,
        policy: SendingTimePolicy,
    ) -> Result<Vec<SmsNotification>, RepositoryError>;

    /// Set the result of a unit; used by the publish step to revert transient
    /// failures to `New` and by the delivery-report path for terminal results
    async fn set_result(
        &self,
        notification_id: Uuid,
        result: SmsNotificationResult,
    ) -> Result<(), RepositoryError>;

    /// Units past expiry that have not reached a terminal result
    async fn expired_notifications(&self) -> Result<Vec<SmsNotification>, RepositoryError>;

    /// Transition a unit to `FailedTtl`; when it is the last outstanding unit
    /// of its order, the order is completed and a status-feed entry written in
    /// the same unit of work
    async fn terminate(&self, notification_id: Uuid) -> Result<(), RepositoryError>;
}
