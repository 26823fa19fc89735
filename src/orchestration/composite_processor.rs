//! # Composite and Preferred Channel Processing
//!
//! Orders on `EmailAndSms` fan out to both mediums: recipients are split into
//! an email-only view and an SMS-only view (a recipient with both address
//! types appears in both, each view filtered to its matching address points)
//! and the two single-channel generators run concurrently. Orders on
//! `EmailPreferred`/`SmsPreferred` split recipients into a preferred list and
//! a fallback list instead, each dispatched to its generator.
//!
//! Both processors resolve contact points up-front for recipients lacking any
//! address, so the generators run without further lookups.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::error::Result;
use crate::models::{ContactMedium, NotificationOrder, Recipient};
use crate::orchestration::contact_resolver::{ContactPointResolver, ResolutionMode};
use crate::orchestration::email_processor::EmailNotificationService;
use crate::orchestration::sms_processor::SmsNotificationService;
use crate::orchestration::types::GenerationResult;

/// Combined outcome of a fan-out to both generators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeGenerationResult {
    pub email: GenerationResult,
    pub sms: GenerationResult,
}

/// Drop duplicate recipients, keyed by national identity number, else
/// organization number, else a synthetic unique key. The key is computed once
/// per recipient so synthetic keys stay stable within the pass.
fn dedupe_recipients(recipients: Vec<Recipient>) -> Vec<Recipient> {
    let mut seen = HashSet::new();
    recipients
        .into_iter()
        .filter(|recipient| seen.insert(recipient.partition_key()))
        .collect()
}

/// Clone the recipients addressable in `medium` (plus those with no address
/// at all, so the generator records their outcome), each view holding only
/// the matching address points
fn channel_view(recipients: &[Recipient], medium: ContactMedium) -> Vec<Recipient> {
    recipients
        .iter()
        .filter(|r| r.has_address_for(medium) || r.has_no_address())
        .map(|r| {
            let mut view = r.clone();
            view.address_points.retain(|p| p.medium() == medium);
            view
        })
        .collect()
}

/// Fan-out processor for the `EmailAndSms` channel
pub struct EmailAndSmsOrderProcessor {
    resolver: Arc<ContactPointResolver>,
    email_service: Arc<EmailNotificationService>,
    sms_service: Arc<SmsNotificationService>,
}

impl EmailAndSmsOrderProcessor {
    pub fn new(
        resolver: Arc<ContactPointResolver>,
        email_service: Arc<EmailNotificationService>,
        sms_service: Arc<SmsNotificationService>,
    ) -> Self {
        Self {
            resolver,
            email_service,
            sms_service,
        }
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn process_order(&self, order: &NotificationOrder) -> Result<CompositeGenerationResult> {
        let recipients = self.resolve(order).await?;
        let (email, sms) = tokio::join!(
            self.email_service.process_order_without_address_lookup(
                order,
                channel_view(&recipients, ContactMedium::Email)
            ),
            self.sms_service.process_order_without_address_lookup(
                order,
                channel_view(&recipients, ContactMedium::Sms)
            )
        );
        Ok(CompositeGenerationResult {
            email: email?,
            sms: sms?,
        })
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn process_order_retry(
        &self,
        order: &NotificationOrder,
    ) -> Result<CompositeGenerationResult> {
        let recipients = self.resolve(order).await?;
        let (email, sms) = tokio::join!(
            self.email_service.process_order_retry_without_address_lookup(
                order,
                channel_view(&recipients, ContactMedium::Email)
            ),
            self.sms_service.process_order_retry_without_address_lookup(
                order,
                channel_view(&recipients, ContactMedium::Sms)
            )
        );
        Ok(CompositeGenerationResult {
            email: email?,
            sms: sms?,
        })
    }

    async fn resolve(&self, order: &NotificationOrder) -> Result<Vec<Recipient>> {
        let recipients = self
            .resolver
            .resolve_missing(
                order.recipients.clone(),
                order.resource_id.as_deref(),
                ResolutionMode::Both,
            )
            .await?;
        Ok(dedupe_recipients(recipients))
    }
}

/// Fallback processor for the `EmailPreferred` and `SmsPreferred` channels
pub struct PreferredChannelProcessor {
    resolver: Arc<ContactPointResolver>,
    email_service: Arc<EmailNotificationService>,
    sms_service: Arc<SmsNotificationService>,
}

impl PreferredChannelProcessor {
    pub fn new(
        resolver: Arc<ContactPointResolver>,
        email_service: Arc<EmailNotificationService>,
        sms_service: Arc<SmsNotificationService>,
    ) -> Self {
        Self {
            resolver,
            email_service,
            sms_service,
        }
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, preferred = ?preferred))]
    pub async fn process_order(
        &self,
        order: &NotificationOrder,
        preferred: ContactMedium,
    ) -> Result<CompositeGenerationResult> {
        let (preferred_list, fallback_list) = self.resolve_and_partition(order, preferred).await?;
        self.dispatch(order, preferred, preferred_list, fallback_list, false)
            .await
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, preferred = ?preferred))]
    pub async fn process_order_retry(
        &self,
        order: &NotificationOrder,
        preferred: ContactMedium,
    ) -> Result<CompositeGenerationResult> {
        let (preferred_list, fallback_list) = self.resolve_and_partition(order, preferred).await?;
        self.dispatch(order, preferred, preferred_list, fallback_list, true)
            .await
    }

    /// Partition recipients by available medium: recipients with an address
    /// point in the preferred medium form the preferred list; recipients with
    /// only the fallback medium form the fallback list; recipients with
    /// neither go to the preferred list so its generator records the
    /// not-identified outcome.
    async fn resolve_and_partition(
        &self,
        order: &NotificationOrder,
        preferred: ContactMedium,
    ) -> Result<(Vec<Recipient>, Vec<Recipient>)> {
        let recipients = self
            .resolver
            .resolve_missing(
                order.recipients.clone(),
                order.resource_id.as_deref(),
                ResolutionMode::Preferred(preferred),
            )
            .await?;
        let recipients = dedupe_recipients(recipients);

        Ok(recipients
            .into_iter()
            .partition(|r| r.has_address_for(preferred) || r.has_no_address()))
    }

    async fn dispatch(
        &self,
        order: &NotificationOrder,
        preferred: ContactMedium,
        preferred_list: Vec<Recipient>,
        fallback_list: Vec<Recipient>,
        is_retry: bool,
    ) -> Result<CompositeGenerationResult> {
        let (email_recipients, sms_recipients) = match preferred {
            ContactMedium::Email => (preferred_list, fallback_list),
            ContactMedium::Sms => (fallback_list, preferred_list),
        };

        let mut result = CompositeGenerationResult::default();
        if is_retry {
            if !email_recipients.is_empty() {
                result.email = self
                    .email_service
                    .process_order_retry_without_address_lookup(order, email_recipients)
                    .await?;
            }
            if !sms_recipients.is_empty() {
                result.sms = self
                    .sms_service
                    .process_order_retry_without_address_lookup(order, sms_recipients)
                    .await?;
            }
        } else {
            if !email_recipients.is_empty() {
                result.email = self
                    .email_service
                    .process_order_without_address_lookup(order, email_recipients)
                    .await?;
            }
            if !sms_recipients.is_empty() {
                result.sms = self
                    .sms_service
                    .process_order_without_address_lookup(order, sms_recipients)
                    .await?;
            }
        }
        Ok(result)
    }
}
