//! # Notification Order
//!
//! The persisted order entity and its associated enums: delivery channel,
//! sending-time policy, per-channel message templates and the order processing
//! state machine.
//!
//! An order is immutable after creation except for its processing status. The
//! recipient list may be augmented during contact-point resolution (address
//! points accumulate), never after delivery units have been generated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::recipient::Recipient;

/// Delivery channel requested by an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Email only
    Email,
    /// SMS only
    Sms,
    /// Both email and SMS for every addressable recipient
    EmailAndSms,
    /// Email when available, SMS as fallback
    EmailPreferred,
    /// SMS when available, email as fallback
    SmsPreferred,
}

impl NotificationChannel {
    /// Whether this channel fans out to more than one medium
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::EmailAndSms | Self::EmailPreferred | Self::SmsPreferred
        )
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Sms => write!(f, "sms"),
            Self::EmailAndSms => write!(f, "email_and_sms"),
            Self::EmailPreferred => write!(f, "email_preferred"),
            Self::SmsPreferred => write!(f, "sms_preferred"),
        }
    }
}

impl std::str::FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "email_and_sms" => Ok(Self::EmailAndSms),
            "email_preferred" => Ok(Self::EmailPreferred),
            "sms_preferred" => Ok(Self::SmsPreferred),
            _ => Err(format!("Invalid notification channel: {s}")),
        }
    }
}

/// Governs which publish lane a delivery unit uses and whether SMS sending is
/// deferred to the civil daytime window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendingTimePolicy {
    /// Send as soon as a publish cycle runs
    Anytime,
    /// Hold until the configured daytime window
    Daytime,
}

impl Default for SendingTimePolicy {
    fn default() -> Self {
        Self::Anytime
    }
}

impl fmt::Display for SendingTimePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anytime => write!(f, "anytime"),
            Self::Daytime => write!(f, "daytime"),
        }
    }
}

impl std::str::FromStr for SendingTimePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anytime" => Ok(Self::Anytime),
            "daytime" => Ok(Self::Daytime),
            _ => Err(format!("Invalid sending time policy: {s}")),
        }
    }
}

/// Processing state attached to an order
///
/// `Registered` → `Processing` (optional) → one of `{SendConditionNotMet,
/// Completed}`. The transition to `Completed` is driven by the orchestrator once
/// every delivery unit belonging to the order has reached a terminal result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderProcessingStatus {
    /// Accepted and waiting for its requested send time
    Registered,
    /// Claimed by a processing pass
    Processing,
    /// The configured sending condition evaluated to false
    SendConditionNotMet,
    /// All delivery units reached a terminal result
    Completed,
}

impl OrderProcessingStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SendConditionNotMet | Self::Completed)
    }
}

impl Default for OrderProcessingStatus {
    fn default() -> Self {
        Self::Registered
    }
}

impl fmt::Display for OrderProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Processing => write!(f, "processing"),
            Self::SendConditionNotMet => write!(f, "send_condition_not_met"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for OrderProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "processing" => Ok(Self::Processing),
            "send_condition_not_met" => Ok(Self::SendConditionNotMet),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid order processing status: {s}")),
        }
    }
}

/// Content type of an email body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailContentType {
    Plain,
    Html,
}

impl Default for EmailContentType {
    fn default() -> Self {
        Self::Plain
    }
}

/// Template for email delivery units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub from_address: String,
    pub subject: String,
    pub body: String,
    pub content_type: EmailContentType,
}

/// Template for SMS delivery units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsTemplate {
    /// Sender short code or number shown to the recipient
    pub sender_number: String,
    pub body: String,
}

/// Per-channel message template, keyed by medium
///
/// An order carries at most one template per medium; matching switches on the
/// variant rather than downcasting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationTemplate {
    Email(EmailTemplate),
    Sms(SmsTemplate),
}

/// A notification order: the unit of work the dispatch pipeline consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationOrder {
    /// Order identifier
    pub id: Uuid,
    /// Short name of the creating organization
    pub creator: String,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// Earliest instant the order may be dispatched
    pub requested_send_time: DateTime<Utc>,
    /// Requested delivery channel
    pub notification_channel: NotificationChannel,
    /// Per-channel templates (at most one per medium)
    pub templates: Vec<NotificationTemplate>,
    /// Recipients to fan out to
    pub recipients: Vec<Recipient>,
    /// Optional externally-hosted boolean send condition
    pub condition_endpoint: Option<String>,
    /// When set, reservation flags from the contact register are not honored
    pub ignore_reservation: Option<bool>,
    /// Resource identifier for authorization-scoped directory lookups
    pub resource_id: Option<String>,
    /// Publish lane classification
    pub sending_time_policy: SendingTimePolicy,
    /// Sender-supplied correlation reference
    pub senders_reference: Option<String>,
}

impl NotificationOrder {
    /// The email template, when the order carries one
    pub fn email_template(&self) -> Option<&EmailTemplate> {
        self.templates.iter().find_map(|t| match t {
            NotificationTemplate::Email(template) => Some(template),
            NotificationTemplate::Sms(_) => None,
        })
    }

    /// The SMS template, when the order carries one
    pub fn sms_template(&self) -> Option<&SmsTemplate> {
        self.templates.iter().find_map(|t| match t {
            NotificationTemplate::Sms(template) => Some(template),
            NotificationTemplate::Email(_) => None,
        })
    }

    /// Whether reservation flags should be bypassed for this order
    pub fn ignores_reservation(&self) -> bool {
        self.ignore_reservation.unwrap_or(false)
    }
}
