//! # Data Layer
//!
//! Core domain entities for the order dispatch pipeline: notification orders,
//! recipients with their address points, and the per-recipient per-channel
//! delivery units tracked to a terminal result.

pub mod notification;
pub mod order;
pub mod recipient;

pub use notification::{
    EmailNotification, EmailNotificationResult, SmsNotification, SmsNotificationResult,
};
pub use order::{
    EmailContentType, EmailTemplate, NotificationChannel, NotificationOrder,
    NotificationTemplate, OrderProcessingStatus, SendingTimePolicy, SmsTemplate,
};
pub use recipient::{AddressPoint, ContactMedium, EmailRecipient, Recipient, SmsRecipient};
