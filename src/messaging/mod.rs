//! # Messaging
//!
//! The queue-producer capability consumed by the publish step, plus the flat
//! payload records serialized onto the queue. The transport itself is external;
//! a publish is a boolean outcome, and a failed publish is compensated by
//! reverting the delivery unit to retry-eligible state rather than by a retry
//! topic.

pub mod message;
pub mod producer;

pub use message::{EmailQueuePayload, SmsQueuePayload};
pub use producer::QueueProducer;
