//! # Notify Core
//!
//! Order dispatch pipeline for multi-channel notification delivery.
//!
//! ## Overview
//!
//! The crate turns persisted notification orders into per-recipient,
//! per-channel delivery units: it resolves missing contact addresses through
//! external directories, applies conditional-send and reservation rules,
//! performs idempotent retry, and hands serialized payloads to a
//! message-queue producer. Background worker loops throttle and schedule the
//! hand-off per sending-time policy.
//!
//! ## Architecture
//!
//! Durable storage, the queue transport, directory services, authorization
//! and the condition endpoint are all consumed through trait seams in
//! [`clients`] and [`messaging`]; the pipeline owns orchestration only.
//! Worker loops cooperate exclusively through persisted delivery-unit state
//! and the per-policy wake-up lanes — there is no shared mutable state beyond
//! the signal primitive itself.
//!
//! ## Module Organization
//!
//! - [`models`] - Orders, recipients, address points and delivery units
//! - [`clients`] - External collaborator trait seams
//! - [`messaging`] - Queue producer capability and payload records
//! - [`orchestration`] - The dispatch pipeline and its worker loops
//! - [`config`] - Configuration with environment overrides
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing initialization

pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;

pub use config::NotifyConfig;
pub use error::{NotifyError, Result};
pub use models::{
    AddressPoint, ContactMedium, EmailNotification, EmailNotificationResult, NotificationChannel,
    NotificationOrder, NotificationTemplate, OrderProcessingStatus, Recipient, SendingTimePolicy,
    SmsNotification, SmsNotificationResult,
};
pub use orchestration::{
    BackgroundPublisher, DispatchOutcome, OrderDispatcher, PastDueOrderScanner, PublishTaskQueue,
};
