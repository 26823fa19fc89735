//! # Order Dispatch Orchestrator
//!
//! The top-level state transition for one order: evaluate the sending
//! condition, dispatch to the channel processor matching the order's channel,
//! check whether every delivery unit has reached a terminal result, and emit a
//! status-feed entry when the order resolved in this call. Feed emission
//! failures are logged and swallowed; they never fail order processing.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::clients::repository::OrderRepository;
use crate::error::Result;
use crate::models::{ContactMedium, NotificationChannel, NotificationOrder, OrderProcessingStatus};
use crate::orchestration::composite_processor::{
    EmailAndSmsOrderProcessor, PreferredChannelProcessor,
};
use crate::orchestration::condition_evaluator::{ConditionCheckResult, SendingConditionEvaluator};
use crate::orchestration::email_processor::EmailNotificationService;
use crate::orchestration::sms_processor::SmsNotificationService;

/// What a processing pass concluded about the order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The order reached a terminal processing status in this call
    Resolved,
    /// Delivery units were generated; completion waits on delivery reports
    Pending,
    /// A first-attempt condition check was inconclusive; requeue the order
    RetryRequired,
}

impl DispatchOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

/// Orchestrates condition evaluation, channel dispatch and completion
/// detection for one order at a time
pub struct OrderDispatcher {
    order_repository: Arc<dyn OrderRepository>,
    condition_evaluator: SendingConditionEvaluator,
    email_service: Arc<EmailNotificationService>,
    sms_service: Arc<SmsNotificationService>,
    email_and_sms_processor: EmailAndSmsOrderProcessor,
    preferred_processor: PreferredChannelProcessor,
}

impl OrderDispatcher {
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        condition_evaluator: SendingConditionEvaluator,
        email_service: Arc<EmailNotificationService>,
        sms_service: Arc<SmsNotificationService>,
        email_and_sms_processor: EmailAndSmsOrderProcessor,
        preferred_processor: PreferredChannelProcessor,
    ) -> Self {
        Self {
            order_repository,
            condition_evaluator,
            email_service,
            sms_service,
            email_and_sms_processor,
            preferred_processor,
        }
    }

    /// First-attempt processing of a persisted order
    #[instrument(skip(self, order), fields(order_id = %order.id, channel = %order.notification_channel))]
    pub async fn process_order(&self, order: &NotificationOrder) -> Result<DispatchOutcome> {
        match self.condition_evaluator.evaluate(order, false).await {
            ConditionCheckResult::NotMet => return self.resolve_condition_not_met(order).await,
            ConditionCheckResult::Inconclusive => {
                debug!(order_id = %order.id, "condition inconclusive; order requeued");
                return Ok(DispatchOutcome::RetryRequired);
            }
            ConditionCheckResult::Met => {}
        }

        self.dispatch(order, false).await?;
        self.check_completion(order).await
    }

    /// Retry processing: the idempotency guard in the generators makes this
    /// safe to run any number of times; an inconclusive condition check is
    /// treated as met
    #[instrument(skip(self, order), fields(order_id = %order.id, channel = %order.notification_channel))]
    pub async fn process_order_retry(&self, order: &NotificationOrder) -> Result<DispatchOutcome> {
        if self.condition_evaluator.evaluate(order, true).await == ConditionCheckResult::NotMet {
            return self.resolve_condition_not_met(order).await;
        }

        self.dispatch(order, true).await?;
        self.check_completion(order).await
    }

    async fn dispatch(&self, order: &NotificationOrder, is_retry: bool) -> Result<()> {
        match (order.notification_channel, is_retry) {
            (NotificationChannel::Email, false) => {
                self.email_service.process_order(order).await?;
            }
            (NotificationChannel::Email, true) => {
                self.email_service.process_order_retry(order).await?;
            }
            (NotificationChannel::Sms, false) => {
                self.sms_service.process_order(order).await?;
            }
            (NotificationChannel::Sms, true) => {
                self.sms_service.process_order_retry(order).await?;
            }
            (NotificationChannel::EmailAndSms, false) => {
                self.email_and_sms_processor.process_order(order).await?;
            }
            (NotificationChannel::EmailAndSms, true) => {
                self.email_and_sms_processor.process_order_retry(order).await?;
            }
            (NotificationChannel::EmailPreferred, false) => {
                self.preferred_processor
                    .process_order(order, ContactMedium::Email)
                    .await?;
            }
            (NotificationChannel::EmailPreferred, true) => {
                self.preferred_processor
                    .process_order_retry(order, ContactMedium::Email)
                    .await?;
            }
            (NotificationChannel::SmsPreferred, false) => {
                self.preferred_processor
                    .process_order(order, ContactMedium::Sms)
                    .await?;
            }
            (NotificationChannel::SmsPreferred, true) => {
                self.preferred_processor
                    .process_order_retry(order, ContactMedium::Sms)
                    .await?;
            }
        }
        Ok(())
    }

    async fn resolve_condition_not_met(
        &self,
        order: &NotificationOrder,
    ) -> Result<DispatchOutcome> {
        info!(order_id = %order.id, "send condition not met; order resolved without dispatch");
        self.order_repository
            .set_processing_status(order.id, OrderProcessingStatus::SendConditionNotMet)
            .await?;
        self.emit_status_feed(order).await;
        Ok(DispatchOutcome::Resolved)
    }

    async fn check_completion(&self, order: &NotificationOrder) -> Result<DispatchOutcome> {
        if self
            .order_repository
            .all_notifications_terminal(order.id)
            .await?
        {
            info!(order_id = %order.id, "all delivery units terminal; completing order");
            self.order_repository
                .set_processing_status(order.id, OrderProcessingStatus::Completed)
                .await?;
            self.emit_status_feed(order).await;
            return Ok(DispatchOutcome::Resolved);
        }
        Ok(DispatchOutcome::Pending)
    }

    /// Best-effort: feed emission must never undo or retry order completion
    async fn emit_status_feed(&self, order: &NotificationOrder) {
        if let Err(e) = self
            .order_repository
            .insert_status_feed_entry(order.id)
            .await
        {
            warn!(
                order_id = %order.id,
                error = %e,
                "status feed emission failed; suppressed"
            );
        }
    }
}
