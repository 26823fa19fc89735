//! # Email Notification Generation
//!
//! Turns an order's recipients into persisted email delivery units, applying
//! the reservation short-circuit and the no-address outcome, and drains newly
//! created units through the queue producer. Retry passes are idempotent: a
//! unit is only created when no equivalent (address + identity) unit is
//! already registered for the order.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::clients::clock::{Clock, IdGenerator};
use crate::clients::repository::{EmailNotificationRepository, RegisteredEmailRecipient};
use crate::config::EmailConfig;
use crate::error::Result;
use crate::messaging::{EmailQueuePayload, QueueProducer};
use crate::models::{
    EmailNotification, EmailNotificationResult, EmailRecipient, NotificationOrder, Recipient,
};
use crate::orchestration::contact_resolver::{ContactPointResolver, ResolutionMode};
use crate::orchestration::keywords::KeywordEngine;
use crate::orchestration::types::{GenerationResult, PublishCycleResult};

/// Delivery-report outcome applied to one email unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSendOperationResult {
    pub notification_id: uuid::Uuid,
    pub result: EmailNotificationResult,
}

/// Email channel generator and publisher
pub struct EmailNotificationService {
    repository: Arc<dyn EmailNotificationRepository>,
    producer: Arc<dyn QueueProducer>,
    resolver: Arc<ContactPointResolver>,
    keyword_engine: Arc<KeywordEngine>,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
    config: EmailConfig,
}

impl EmailNotificationService {
    pub fn new(
        repository: Arc<dyn EmailNotificationRepository>,
        producer: Arc<dyn QueueProducer>,
        resolver: Arc<ContactPointResolver>,
        keyword_engine: Arc<KeywordEngine>,
        clock: Arc<dyn Clock>,
        id_generator: Arc<dyn IdGenerator>,
        config: EmailConfig,
    ) -> Self {
        Self {
            repository,
            producer,
            resolver,
            keyword_engine,
            clock,
            id_generator,
            config,
        }
    }

    /// First-attempt processing: resolve missing email addresses, then
    /// generate delivery units for every recipient
    pub async fn process_order(&self, order: &NotificationOrder) -> Result<GenerationResult> {
        let recipients = self
            .resolver
            .resolve_missing(
                order.recipients.clone(),
                order.resource_id.as_deref(),
                ResolutionMode::EmailOnly,
            )
            .await?;
        self.process_order_without_address_lookup(order, recipients)
            .await
    }

    /// Retry processing: resolve missing email addresses, then generate with
    /// the idempotency guard active
    pub async fn process_order_retry(&self, order: &NotificationOrder) -> Result<GenerationResult> {
        let recipients = self
            .resolver
            .resolve_missing(
                order.recipients.clone(),
                order.resource_id.as_deref(),
                ResolutionMode::EmailOnly,
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
    /// recipient/address pair already registered for the order
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
        registered: &[RegisteredEmailRecipient],
    ) -> Result<GenerationResult> {
        let template = order
            .email_template()
            .expect("order dispatched to email generation must carry an email template");

        let content = self
            .keyword_engine
            .customize(Some(&template.subject), &template.body, &recipients)
            .await?;

        let mut result = GenerationResult::default();
        for (recipient, content) in recipients.iter().zip(content) {
            let email_recipient = EmailRecipient {
                addresses: recipient.email_addresses(),
                subject: content.subject.unwrap_or_default(),
                body: content.body,
                national_identity_number: recipient.national_identity_number.clone(),
                organization_number: recipient.organization_number.clone(),
                is_reserved: recipient.is_reserved(),
                customized: content.customized,
            };
            self.generate_for_recipient(order, email_recipient, registered, &mut result)
                .await?;
        }

        info!(
            order_id = %order.id,
            created = result.created,
            failed_at_creation = result.failed_at_creation,
            skipped_existing = result.skipped_existing,
            "email generation complete"
        );
        Ok(result)
    }

    async fn generate_for_recipient(
        &self,
        order: &NotificationOrder,
        recipient: EmailRecipient,
        registered: &[RegisteredEmailRecipient],
        result: &mut GenerationResult,
    ) -> Result<()> {
        let already_registered = |address: &str| {
            registered.iter().any(|r| {
                r.to_address == address
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
                notification.result = EmailNotificationResult::FailedRecipientReserved;
                self.repository.insert(notification).await?;
                result.failed_at_creation += 1;
            }
            return Ok(());
        }

        if recipient.addresses.is_empty() {
            if already_registered("") {
                result.skipped_existing += 1;
            } else {
                let mut notification = self.build_notification(order, &recipient, String::new(), now);
                notification.result = EmailNotificationResult::FailedRecipientNotIdentified;
                self.repository.insert(notification).await?;
                result.failed_at_creation += 1;
            }
            return Ok(());
        }

        for address in recipient.addresses.clone() {
            if already_registered(&address) {
                debug!(order_id = %order.id, "skipping already registered email recipient");
                result.skipped_existing += 1;
                continue;
            }
            let expiry = order.requested_send_time + chrono::Duration::hours(self.config.ttl_hours);
            let mut notification = self.build_notification(order, &recipient, address, now);
            notification.expiry_time = expiry;
            self.repository.insert(notification).await?;
            result.created += 1;
        }

        Ok(())
    }

    fn build_notification(
        &self,
        order: &NotificationOrder,
        recipient: &EmailRecipient,
        to_address: String,
        now: chrono::DateTime<chrono::Utc>,
    ) -> EmailNotification {
        let template = order
            .email_template()
            .expect("order dispatched to email generation must carry an email template");
        EmailNotification {
            id: self.id_generator.new_id(),
            order_id: order.id,
            requested_send_time: order.requested_send_time,
            // Terminal-at-creation units keep this; `New` units get the TTL.
            expiry_time: now,
            to_address,
            national_identity_number: recipient.national_identity_number.clone(),
            organization_number: recipient.organization_number.clone(),
            from_address: template.from_address.clone(),
            subject: recipient.subject.clone(),
            body: recipient.body.clone(),
            content_type: template.content_type,
            result: EmailNotificationResult::New,
            result_time: now,
            customized: recipient.customized,
        }
    }

    /// Publish one batch of `New` units; failed publishes revert to `New`
    pub async fn send_notifications(&self) -> Result<PublishCycleResult> {
        let batch = self
            .repository
            .claim_new_notifications(self.config.batch_size)
            .await?;
        let mut cycle = PublishCycleResult {
            claimed: batch.len(),
            ..Default::default()
        };

        for notification in batch {
            let payload = serde_json::to_value(EmailQueuePayload::from(&notification))?;
            if self.producer.publish(&self.config.queue_topic, payload).await {
                cycle.published += 1;
            } else {
                warn!(
                    notification_id = %notification.id,
                    "email publish failed; reverting notification for retry"
                );
                self.repository
                    .set_result(notification.id, EmailNotificationResult::New)
                    .await?;
                cycle.reverted += 1;
            }
        }

        debug!(
            claimed = cycle.claimed,
            published = cycle.published,
            reverted = cycle.reverted,
            "email publish cycle complete"
        );
        Ok(cycle)
    }

    /// Apply a delivery-report outcome to one unit
    pub async fn update_send_status(&self, update: EmailSendOperationResult) -> Result<()> {
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
            info!(count, "terminated expired email notifications");
        }
        Ok(count)
    }
}
