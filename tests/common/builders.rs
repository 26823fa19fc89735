//! Fixture wiring and entity builders for pipeline tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use notify_core::clients::clock::UuidGenerator;
use notify_core::config::{EmailConfig, SmsConfig};
use notify_core::models::{
    AddressPoint, EmailContentType, EmailTemplate, NotificationChannel, NotificationOrder,
    NotificationTemplate, Recipient, SendingTimePolicy, SmsTemplate,
};
use notify_core::orchestration::{
    ContactPointResolver, EmailAndSmsOrderProcessor, EmailNotificationService, KeywordEngine,
    OrderDispatcher, PreferredChannelProcessor, SendWindowScheduler, SendingConditionEvaluator,
    SmsNotificationService,
};

use super::mocks::{
    AllowAllAuthorizer, InMemoryStore, ManualClock, RecordingProducer, ScriptedCondition,
    ScriptedProfile,
};

/// Fixed "now" used by default: 12:00 local time in Europe/Oslo, inside the
/// send window
pub fn test_now() -> DateTime<Utc> {
    "2026-01-15T11:00:00Z".parse().unwrap()
}

/// Everything a pipeline test needs, wired against the in-memory store
pub struct Pipeline {
    pub store: Arc<InMemoryStore>,
    pub producer: Arc<RecordingProducer>,
    pub clock: Arc<ManualClock>,
    pub email_service: Arc<EmailNotificationService>,
    pub sms_service: Arc<SmsNotificationService>,
    pub dispatcher: Arc<OrderDispatcher>,
}

impl Pipeline {
    /// Move both the clock and the store's view of time
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.clock.set(now);
        self.store.set_now(now);
    }
}

pub fn build_pipeline(
    profile: ScriptedProfile,
    condition: ScriptedCondition,
    sms_config: SmsConfig,
    email_config: EmailConfig,
) -> Pipeline {
    let store = Arc::new(InMemoryStore::at(test_now()));
    let producer = Arc::new(RecordingProducer::new());
    let clock = Arc::new(ManualClock::at(test_now()));
    let profile = Arc::new(profile);
    let ids = Arc::new(UuidGenerator);

    let resolver = Arc::new(ContactPointResolver::new(
        profile.clone(),
        Arc::new(AllowAllAuthorizer),
        sms_config.default_country_prefix.clone(),
    ));
    let keywords = Arc::new(KeywordEngine::new(profile));
    let scheduler = Arc::new(
        SendWindowScheduler::from_config(&sms_config, clock.clone()).expect("valid sms config"),
    );

    let email_service = Arc::new(EmailNotificationService::new(
        store.clone(),
        producer.clone(),
        resolver.clone(),
        keywords.clone(),
        clock.clone(),
        ids.clone(),
        email_config,
    ));
    let sms_service = Arc::new(SmsNotificationService::new(
        store.clone(),
        producer.clone(),
        resolver.clone(),
        keywords,
        scheduler,
        clock.clone(),
        ids,
        sms_config,
    ));

    let dispatcher = Arc::new(OrderDispatcher::new(
        store.clone(),
        SendingConditionEvaluator::new(Arc::new(condition)),
        email_service.clone(),
        sms_service.clone(),
        EmailAndSmsOrderProcessor::new(
            resolver.clone(),
            email_service.clone(),
            sms_service.clone(),
        ),
        PreferredChannelProcessor::new(resolver, email_service.clone(), sms_service.clone()),
    ));

    Pipeline {
        store,
        producer,
        clock,
        email_service,
        sms_service,
        dispatcher,
    }
}

pub fn default_pipeline(profile: ScriptedProfile, condition: ScriptedCondition) -> Pipeline {
    build_pipeline(
        profile,
        condition,
        SmsConfig::default(),
        EmailConfig::default(),
    )
}

pub fn email_template() -> NotificationTemplate {
    NotificationTemplate::Email(EmailTemplate {
        from_address: "no-reply@example.com".to_string(),
        subject: "Important notice".to_string(),
        body: "You have a new message.".to_string(),
        content_type: EmailContentType::Plain,
    })
}

pub fn sms_template() -> NotificationTemplate {
    NotificationTemplate::Sms(SmsTemplate {
        sender_number: "Example".to_string(),
        body: "You have a new message.".to_string(),
    })
}

/// Order with both templates attached, requested at the fixture's "now"
pub fn order_with(channel: NotificationChannel, recipients: Vec<Recipient>) -> NotificationOrder {
    NotificationOrder {
        id: Uuid::new_v4(),
        creator: "ttd".to_string(),
        created: test_now(),
        requested_send_time: test_now(),
        notification_channel: channel,
        templates: vec![email_template(), sms_template()],
        recipients,
        condition_endpoint: None,
        ignore_reservation: None,
        resource_id: None,
        sending_time_policy: SendingTimePolicy::Anytime,
        senders_reference: Some("ref-001".to_string()),
    }
}

pub fn person(nin: &str) -> Recipient {
    Recipient {
        national_identity_number: Some(nin.to_string()),
        ..Default::default()
    }
}

pub fn person_with_email(nin: &str, email: &str) -> Recipient {
    let mut recipient = person(nin);
    recipient
        .address_points
        .push(AddressPoint::Email(email.to_string()));
    recipient
}

pub fn person_with_sms(nin: &str, number: &str) -> Recipient {
    let mut recipient = person(nin);
    recipient
        .address_points
        .push(AddressPoint::Sms(number.to_string()));
    recipient
}

pub fn person_with_both(nin: &str, email: &str, number: &str) -> Recipient {
    let mut recipient = person_with_email(nin, email);
    recipient
        .address_points
        .push(AddressPoint::Sms(number.to_string()));
    recipient
}
