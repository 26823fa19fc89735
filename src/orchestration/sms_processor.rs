//! # SMS Notification Generation
//!
//! SMS counterpart of the email generator: reservation and no-address
//! outcomes, per-address delivery units with gateway segment counts, expiry
//! from the send-window scheduler, idempotent retry, and a publish step that
//! drains `New` units per sending-time policy until a short batch signals the
//! queue is empty.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::{debug, info, instrument, warn};

use crate::clients::clock::{Clock, IdGenerator};
use crate::clients::repository::{RegisteredSmsRecipient, SmsNotificationRepository};
use crate::config::SmsConfig;
use crate::error::Result;
use crate::messaging::{QueueProducer, SmsQueuePayload};
use crate::models::{
    NotificationOrder, Recipient, SendingTimePolicy, SmsNotification, SmsNotificationResult,
    SmsRecipient,
};
use crate::orchestration::contact_resolver::{ContactPointResolver, ResolutionMode};
use crate::orchestration::keywords::KeywordEngine;
use crate::orchestration::sms_scheduler::SendWindowScheduler;
use crate::orchestration::types::{GenerationResult, PublishCycleResult};

/// Encoded length that still fits one non-concatenated message
const SINGLE_SEGMENT_LIMIT: usize = 160;

/// Encoded capacity per segment once concatenation headers are needed
const CONCATENATED_SEGMENT_SIZE: usize = 134;

/// The gateway's maximum concatenation limit
const MAX_SEGMENT_COUNT: i32 = 16;

/// Segments the gateway will bill for a message body: the body is URL-encoded
/// and the encoded length measured against the single/concatenated limits.
pub fn calculate_segment_count(body: &str) -> i32 {
    let encoded_length = utf8_percent_encode(body, NON_ALPHANUMERIC).to_string().len();
    if encoded_length <= SINGLE_SEGMENT_LIMIT {
        return 1;
    }
    let segments = encoded_length.div_ceil(CONCATENATED_SEGMENT_SIZE) as i32;
    segments.min(MAX_SEGMENT_COUNT)
}

/// Delivery-report outcome applied to one SMS unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsSendOperationResult {
    pub notification_id: uuid::Uuid,
    pub result: SmsNotificationResult,
}

/// SMS channel generator and publisher
pub struct SmsNotificationService {
    repository: Arc<dyn SmsNotificationRepository>,
    producer: Arc<dyn QueueProducer>,
    resolver: Arc<ContactPointResolver>,
    keyword_engine: Arc<KeywordEngine>,
    scheduler: Arc<SendWindowScheduler>,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
    config: SmsConfig,
}

impl SmsNotificationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn SmsNotificationRepository>,
        producer: Arc<dyn QueueProducer>,
        resolver: Arc<ContactPointResolver>,
        keyword_engine: Arc<KeywordEngine>,
        scheduler: Arc<SendWindowScheduler>,
        clock: Arc<dyn Clock>,
        id_generator: Arc<dyn IdGenerator>,
        config: SmsConfig,
    ) -> Self {
        Self {
            repository,
            producer,
            resolver,
            keyword_engine,
            scheduler,
            clock,
            id_generator,
            config,
        }
    }

    /// First-attempt processing: resolve missing mobile numbers, then
    /// generate delivery units for every recipient
    pub async fn process_order(&self, order: &NotificationOrder) -> Result<GenerationResult> {
        let recipients = self
            .resolver
            .resolve_missing(
                order.recipients.clone(),
                order.resource_id.as_deref(),
                ResolutionMode::SmsOnly,
            )
            .await?;
        self.process_order_without_address_lookup(order, recipients)
            .await
    }

    /// Retry processing: resolve missing mobile numbers, then generate with
    /// the idempotency guard active
    pub async fn process_order_retry(&self, order: &NotificationOrder) -> Result<GenerationResult> {
        let recipients = self
            .resolver
            .resolve_missing(
                order.recipients.clone(),
                order.resource_id.as_deref(),
                ResolutionMode::SmsOnly,
            )
            .await?;
        self.process_order_retry_without_address_lookup(order, recipients)
            .await
    }

    /// Generate delivery units for pre-resolved recipients
    #[instrument(skip(self, order, recipients), fields(order_id = %order.id))]
    pub async fn process_order_without_address_lookup(
        &self,
        order: &NotificationOrder,
        recipients: Vec<Recipient>,
    ) -> Result<GenerationResult> {
        self.generate(order, recipients, &[]).await
    }

    /// Generate delivery units for pre-resolved recipients, skipping any
    /// recipient/number pair already registered for the order
    #[instrument(skip(self, order, recipients), fields(order_id = %order.id))]
    pub async fn process_order_retry_without_address_lookup(
        &self,
        order: &NotificationOrder,
        recipients: Vec<Recipient>,
    ) -> Result<GenerationResult> {
        let registered = self.repository.registered_recipients(order.id).await?;
        self.generate(order, recipients, &registered).await
    }

    async fn generate(
        &self,
        order: &NotificationOrder,
        recipients: Vec<Recipient>,
        registered: &[RegisteredSmsRecipient],
    ) -> Result<GenerationResult> {
        let template = order
            .sms_template()
            .expect("order dispatched to SMS generation must carry an SMS template");

        let content = self
            .keyword_engine
            .customize(None, &template.body, &recipients)
            .await?;

        let mut result = GenerationResult::default();
        for (recipient, content) in recipients.iter().zip(content) {
            let sms_recipient = SmsRecipient {
                mobile_numbers: recipient.mobile_numbers(),
                body: content.body,
                national_identity_number: recipient.national_identity_number.clone(),
                organization_number: recipient.organization_number.clone(),
                is_reserved: recipient.is_reserved(),
                customized: content.customized,
            };
            self.generate_for_recipient(order, sms_recipient, registered, &mut result)
                .await?;
        }

        info!(
            order_id = %order.id,
            created = result.created,
            failed_at_creation = result.failed_at_creation,
            skipped_existing = result.skipped_existing,
            "sms generation complete"
        );
        Ok(result)
    }

    async fn generate_for_recipient(
        &self,
        order: &NotificationOrder,
        recipient: SmsRecipient,
        registered: &[RegisteredSmsRecipient],
        result: &mut GenerationResult,
    ) -> Result<()> {
        let already_registered = |number: &str| {
            registered.iter().any(|r| {
                r.mobile_number == number
                    && r.national_identity_number == recipient.national_identity_number
                    && r.organization_number == recipient.organization_number
            })
        };
        let now = self.clock.utc_now();

        if recipient.is_reserved && !order.ignores_reservation() {
            if already_registered("") {
                result.skipped_existing += 1;
            } else {
                let mut notification = self.build_notification(order, &recipient, String::new(), now);
                notification.result = SmsNotificationResult::FailedRecipientReserved;
                self.repository.insert(notification).await?;
                result.failed_at_creation += 1;
            }
            return Ok(());
        }

        if recipient.mobile_numbers.is_empty() {
            if already_registered("") {
                result.skipped_existing += 1;
            } else {
                let mut notification = self.build_notification(order, &recipient, String::new(), now);
                notification.result = SmsNotificationResult::FailedRecipientNotIdentified;
                self.repository.insert(notification).await?;
                result.failed_at_creation += 1;
            }
            return Ok(());
        }

        for number in recipient.mobile_numbers.clone() {
            if already_registered(&number) {
                debug!(order_id = %order.id, "skipping already registered sms recipient");
                result.skipped_existing += 1;
                continue;
            }
            let mut notification = self.build_notification(order, &recipient, number, now);
            notification.expiry_time = self.scheduler.get_expiry(order.requested_send_time);
            self.repository.insert(notification).await?;
            result.created += 1;
        }

        Ok(())
    }

    fn build_notification(
        &self,
        order: &NotificationOrder,
        recipient: &SmsRecipient,
        mobile_number: String,
        now: chrono::DateTime<chrono::Utc>,
    ) -> SmsNotification {
        let template = order
            .sms_template()
            .expect("order dispatched to SMS generation must carry an SMS template");
        SmsNotification {
            id: self.id_generator.new_id(),
            order_id: order.id,
            requested_send_time: order.requested_send_time,
            // Terminal-at-creation units keep this; `New` units get the
            // scheduler-computed expiry.
            expiry_time: now,
            mobile_number,
            national_identity_number: recipient.national_identity_number.clone(),
            organization_number: recipient.organization_number.clone(),
            sender_number: template.sender_number.clone(),
            body: recipient.body.clone(),
            segment_count: calculate_segment_count(&recipient.body),
            sending_time_policy: order.sending_time_policy,
            result: SmsNotificationResult::New,
            result_time: now,
            customized: recipient.customized,
        }
    }

    /// Drain `New` units for one sending-time policy: claim and publish
    /// batches until a batch comes back smaller than requested
    pub async fn send_notifications(&self, policy: SendingTimePolicy) -> Result<PublishCycleResult> {
        let mut cycle = PublishCycleResult::default();

        loop {
            let batch = self
                .repository
                .claim_new_notifications(self.config.batch_size, policy)
                .await?;
            let batch_len = batch.len();
            cycle.claimed += batch_len;

            for notification in batch {
                let payload = serde_json::to_value(SmsQueuePayload::from(&notification))?;
                if self.producer.publish(&self.config.queue_topic, payload).await {
                    cycle.published += 1;
                } else {
                    warn!(
                        notification_id = %notification.id,
                        "sms publish failed; reverting notification for retry"
                    );
                    self.repository
                        .set_result(notification.id, SmsNotificationResult::New)
                        .await?;
                    cycle.reverted += 1;
                }
            }

            // A short batch means the queue is drained for this policy.
            if batch_len < self.config.batch_size {
                break;
            }
        }

        debug!(
            policy = %policy,
            claimed = cycle.claimed,
            published = cycle.published,
            reverted = cycle.reverted,
            "sms publish cycle complete"
        );
        Ok(cycle)
    }

    /// Apply a delivery-report outcome to one unit
    pub async fn update_send_status(&self, update: SmsSendOperationResult) -> Result<()> {
        self.repository
            .set_result(update.notification_id, update.result)
            .await?;
        Ok(())
    }

    /// Fail every unit past expiry without a terminal result; completing the
    /// parent order when a termination removes its last outstanding unit is
    /// part of the repository's unit of work
    pub async fn terminate_expired_notifications(&self) -> Result<usize> {
        let expired = self.repository.expired_notifications().await?;
        let count = expired.len();
        for notification in expired {
            self.repository.terminate(notification.id).await?;
        }
        if count > 0 {
            info!(count, "terminated expired sms notifications");
        }
        Ok(count)
    }
}
