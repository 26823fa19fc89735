//! # Delivery Units
//!
//! One `EmailNotification` or `SmsNotification` exists per (order, resolved
//! address). Units are created in state `New`, moved through `Sending`-adjacent
//! outcomes by the publish step, to terminal states by the external
//! delivery-report consumer, and to `FailedTtl` by the expiry sweep once past
//! expiry without a terminal result. A unit is exclusively owned by its parent
//! order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Result states for an email delivery unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailNotificationResult {
    /// Created, not yet handed to the queue producer
    New,
    /// Claimed by a publish cycle
    Sending,
    /// Accepted by the downstream gateway
    Succeeded,
    /// Confirmed delivered
    Delivered,
    /// Failed for an unclassified reason
    Failed,
    /// No email address could be resolved for the recipient
    FailedRecipientNotIdentified,
    /// Recipient is reserved against electronic contact
    FailedRecipientReserved,
    /// Address rejected as malformed by the gateway
    FailedInvalidEmailFormat,
    /// Expired before reaching a terminal result
    FailedTtl,
}

impl EmailNotificationResult {
    /// Check if this is a terminal result (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::New | Self::Sending)
    }

    /// Only `New` units are eligible for the publish step
    pub fn is_publishable(&self) -> bool {
        matches!(self, Self::New)
    }
}

impl fmt::Display for EmailNotificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Sending => "sending",
            Self::Succeeded => "succeeded",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::FailedRecipientNotIdentified => "failed_recipient_not_identified",
            Self::FailedRecipientReserved => "failed_recipient_reserved",
            Self::FailedInvalidEmailFormat => "failed_invalid_email_format",
            Self::FailedTtl => "failed_ttl",
        };
        write!(f, "{s}")
    }
}

/// Result states for an SMS delivery unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsNotificationResult {
    /// Created, not yet handed to the queue producer
    New,
    /// Claimed by a publish cycle
    Sending,
    /// Accepted by the downstream gateway
    Accepted,
    /// Confirmed delivered
    Delivered,
    /// Failed for an unclassified reason
    Failed,
    /// No mobile number could be resolved for the recipient
    FailedRecipientNotIdentified,
    /// Recipient is reserved against electronic contact
    FailedRecipientReserved,
    /// Number rejected as invalid by the gateway
    FailedInvalidRecipient,
    /// Expired before reaching a terminal result
    FailedTtl,
}

impl SmsNotificationResult {
    /// Check if this is a terminal result (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::New | Self::Sending)
    }

    /// Only `New` units are eligible for the publish step
    pub fn is_publishable(&self) -> bool {
        matches!(self, Self::New)
    }
}

impl fmt::Display for SmsNotificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Sending => "sending",
            Self::Accepted => "accepted",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::FailedRecipientNotIdentified => "failed_recipient_not_identified",
            Self::FailedRecipientReserved => "failed_recipient_reserved",
            Self::FailedInvalidRecipient => "failed_invalid_recipient",
            Self::FailedTtl => "failed_ttl",
        };
        write!(f, "{s}")
    }
}

/// Email delivery unit
///
/// Carries a full snapshot of the content and sender fields so the publish
/// step can serialize it without consulting the parent order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailNotification {
    pub id: Uuid,
    /// Parent order
    pub order_id: Uuid,
    pub requested_send_time: DateTime<Utc>,
    /// Past this instant without a terminal result the unit is failed by the
    /// expiry sweep
    pub expiry_time: DateTime<Utc>,
    /// Resolved address; empty for units failed before address selection
    pub to_address: String,
    pub national_identity_number: Option<String>,
    pub organization_number: Option<String>,
    pub from_address: String,
    pub subject: String,
    pub body: String,
    pub content_type: super::order::EmailContentType,
    pub result: EmailNotificationResult,
    pub result_time: DateTime<Utc>,
    /// True when the content was keyword-customized for this recipient
    pub customized: bool,
}

/// SMS delivery unit
///
/// Carries a full snapshot of the content and sender fields so the publish
/// step can serialize it without consulting the parent order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsNotification {
    pub id: Uuid,
    /// Parent order
    pub order_id: Uuid,
    pub requested_send_time: DateTime<Utc>,
    /// Past this instant without a terminal result the unit is failed by the
    /// expiry sweep
    pub expiry_time: DateTime<Utc>,
    /// Resolved mobile number; empty for units failed before address selection
    pub mobile_number: String,
    pub national_identity_number: Option<String>,
    pub organization_number: Option<String>,
    pub sender_number: String,
    pub body: String,
    /// Concatenation segments the gateway will bill for this body
    pub segment_count: i32,
    /// Publish lane inherited from the parent order
    pub sending_time_policy: super::order::SendingTimePolicy,
    pub result: SmsNotificationResult,
    pub result_time: DateTime<Utc>,
    /// True when the content was keyword-customized for this recipient
    pub customized: bool,
}
