//! # Order Dispatch Pipeline
//!
//! The orchestration core: turning a persisted order into per-recipient,
//! per-channel delivery units and shepherding those units to the queue
//! producer.
//!
//! ## Core Components
//!
//! - **OrderDispatcher**: top-level state transition — condition gate, channel
//!   dispatch, completion detection, status-feed emission
//! - **SendingConditionEvaluator**: classifies the optional external boolean
//!   gate as met / not met / inconclusive, failing open on retries
//! - **ContactPointResolver**: directory lookups, authorization filtering and
//!   mode-specific address attachment for recipients without an address
//! - **KeywordEngine**: literal placeholder substitution with batch display
//!   name lookups
//! - **EmailNotificationService / SmsNotificationService**: per-channel
//!   delivery-unit generation, idempotent retry, publish and expiry sweeps
//! - **EmailAndSmsOrderProcessor / PreferredChannelProcessor**: recipient
//!   partitioning for the composite channels
//! - **SendWindowScheduler**: civil-time daytime window and expiry math
//! - **PublishTaskQueue / BackgroundPublisher**: per-policy publish lanes with
//!   coalesced wake-ups and at most one in-flight cycle each
//! - **PastDueOrderScanner**: bounded batch loop feeding the dispatcher

pub mod composite_processor;
pub mod condition_evaluator;
pub mod contact_resolver;
pub mod email_processor;
pub mod keywords;
pub mod order_dispatcher;
pub mod order_scanner;
pub mod publish_queue;
pub mod sms_processor;
pub mod sms_scheduler;
pub mod types;

pub use composite_processor::{
    CompositeGenerationResult, EmailAndSmsOrderProcessor, PreferredChannelProcessor,
};
pub use condition_evaluator::{ConditionCheckResult, SendingConditionEvaluator};
pub use contact_resolver::{ContactPointResolver, ResolutionMode};
pub use email_processor::{EmailNotificationService, EmailSendOperationResult};
pub use keywords::{KeywordEngine, RECIPIENT_NAME_TOKEN, RECIPIENT_NUMBER_TOKEN};
pub use order_dispatcher::{DispatchOutcome, OrderDispatcher};
pub use order_scanner::{PastDueOrderScanner, ScanResult};
pub use publish_queue::{BackgroundPublisher, PublishTaskQueue};
pub use sms_processor::{
    calculate_segment_count, SmsNotificationService, SmsSendOperationResult,
};
pub use sms_scheduler::SendWindowScheduler;
pub use types::{GenerationResult, PublishCycleResult};
