//! Mock collaborators for pipeline tests. State is tracked behind mutexes so
//! tests can assert on every call the pipeline made.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use notify_core::clients::authorization::{AuthorizationClient, AuthorizationError};
use notify_core::clients::clock::Clock;
use notify_core::clients::condition::{ConditionClient, ConditionError};
use notify_core::clients::profile::{
    OrganizationContactPoints, ProfileClient, ProfileError, UserContactPoints,
};
use notify_core::clients::repository::{
    EmailNotificationRepository, OrderRepository, RegisteredEmailRecipient,
    RegisteredSmsRecipient, RepositoryError, SmsNotificationRepository,
};
use notify_core::messaging::QueueProducer;
use notify_core::models::{
    EmailNotification, EmailNotificationResult, NotificationOrder, OrderProcessingStatus,
    SendingTimePolicy, SmsNotification, SmsNotificationResult,
};

/// Settable clock shared between the store and the components under test
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn utc_now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// In-memory store implementing every repository seam
pub struct InMemoryStore {
    pub orders: Mutex<HashMap<Uuid, (NotificationOrder, OrderProcessingStatus)>>,
    pub email_notifications: Mutex<Vec<EmailNotification>>,
    pub sms_notifications: Mutex<Vec<SmsNotification>>,
    pub status_feed: Mutex<Vec<Uuid>>,
    pub fail_status_feed: AtomicBool,
    now: Mutex<DateTime<Utc>>,
}

impl InMemoryStore {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
            email_notifications: Mutex::new(Vec::new()),
            sms_notifications: Mutex::new(Vec::new()),
            status_feed: Mutex::new(Vec::new()),
            fail_status_feed: AtomicBool::new(false),
            now: Mutex::new(now),
        }
    }

    pub fn set_now(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn insert_order(&self, order: NotificationOrder) {
        self.orders
            .lock()
            .unwrap()
            .insert(order.id, (order, OrderProcessingStatus::Registered));
    }

    pub fn order_status(&self, order_id: Uuid) -> Option<OrderProcessingStatus> {
        self.orders
            .lock()
            .unwrap()
            .get(&order_id)
            .map(|(_, status)| *status)
    }

    pub fn email_units(&self, order_id: Uuid) -> Vec<EmailNotification> {
        self.email_notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.order_id == order_id)
            .cloned()
            .collect()
    }

    pub fn sms_units(&self, order_id: Uuid) -> Vec<SmsNotification> {
        self.sms_notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.order_id == order_id)
            .cloned()
            .collect()
    }

    fn order_units_terminal(&self, order_id: Uuid) -> bool {
        let emails_terminal = self
            .email_notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.order_id == order_id)
            .all(|n| n.result.is_terminal());
        let sms_terminal = self
            .sms_notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.order_id == order_id)
            .all(|n| n.result.is_terminal());
        emails_terminal && sms_terminal
    }

    fn complete_order_after_termination(&self, order_id: Uuid) {
        if self.order_units_terminal(order_id) {
            if let Some(entry) = self.orders.lock().unwrap().get_mut(&order_id) {
                entry.1 = OrderProcessingStatus::Completed;
            }
            self.status_feed.lock().unwrap().push(order_id);
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn claim_past_due_orders(
        &self,
        limit: usize,
    ) -> Result<Vec<NotificationOrder>, RepositoryError> {
        let now = *self.now.lock().unwrap();
        let mut orders = self.orders.lock().unwrap();
        let mut claimed = Vec::new();
        for (order, status) in orders.values_mut() {
            if claimed.len() >= limit {
                break;
            }
            if *status == OrderProcessingStatus::Registered && order.requested_send_time <= now {
                *status = OrderProcessingStatus::Processing;
                claimed.push(order.clone());
            }
        }
        Ok(claimed)
    }

    async fn set_processing_status(
        &self,
        order_id: Uuid,
        status: OrderProcessingStatus,
    ) -> Result<(), RepositoryError> {
        let mut orders = self.orders.lock().unwrap();
        let entry = orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::OrderNotFound(order_id))?;
        entry.1 = status;
        Ok(())
    }

    async fn all_notifications_terminal(&self, order_id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.order_units_terminal(order_id))
    }

    async fn insert_status_feed_entry(&self, order_id: Uuid) -> Result<(), RepositoryError> {
        if self.fail_status_feed.load(Ordering::Acquire) {
            return Err(RepositoryError::Storage(
                "status feed unavailable".to_string(),
            ));
        }
        self.status_feed.lock().unwrap().push(order_id);
        Ok(())
    }
}

#[async_trait]
impl EmailNotificationRepository for InMemoryStore {
    async fn insert(&self, notification: EmailNotification) -> Result<(), RepositoryError> {
        self.email_notifications.lock().unwrap().push(notification);
        Ok(())
    }

    async fn registered_recipients(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<RegisteredEmailRecipient>, RepositoryError> {
        Ok(self
            .email_notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.order_id == order_id)
            .map(|n| RegisteredEmailRecipient {
                to_address: n.to_address.clone(),
                national_identity_number: n.national_identity_number.clone(),
                organization_number: n.organization_number.clone(),
            })
            .collect())
    }

    async fn claim_new_notifications(
        &self,
        limit: usize,
    ) -> Result<Vec<EmailNotification>, RepositoryError> {
        let mut notifications = self.email_notifications.lock().unwrap();
        let mut claimed = Vec::new();
        for n in notifications.iter_mut() {
            if claimed.len() >= limit {
                break;
            }
            if n.result == EmailNotificationResult::New {
                n.result = EmailNotificationResult::Sending;
                claimed.push(n.clone());
            }
        }
        Ok(claimed)
    }

    async fn set_result(
        &self,
        notification_id: Uuid,
        result: EmailNotificationResult,
    ) -> Result<(), RepositoryError> {
        let now = *self.now.lock().unwrap();
        let mut notifications = self.email_notifications.lock().unwrap();
        let n = notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or(RepositoryError::NotificationNotFound(notification_id))?;
        n.result = result;
        n.result_time = now;
        Ok(())
    }

    async fn expired_notifications(&self) -> Result<Vec<EmailNotification>, RepositoryError> {
        let now = *self.now.lock().unwrap();
        Ok(self
            .email_notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| !n.result.is_terminal() && n.expiry_time < now)
            .cloned()
            .collect())
    }

    async fn terminate(&self, notification_id: Uuid) -> Result<(), RepositoryError> {
        let order_id = {
            let mut notifications = self.email_notifications.lock().unwrap();
            let n = notifications
                .iter_mut()
                .find(|n| n.id == notification_id)
                .ok_or(RepositoryError::NotificationNotFound(notification_id))?;
            n.result = EmailNotificationResult::FailedTtl;
            n.order_id
        };
        self.complete_order_after_termination(order_id);
        Ok(())
    }
}

#[async_trait]
impl SmsNotificationRepository for InMemoryStore {
    async fn insert(&self, notification: SmsNotification) -> Result<(), RepositoryError> {
        self.sms_notifications.lock().unwrap().push(notification);
        Ok(())
    }

    async fn registered_recipients(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<RegisteredSmsRecipient>, RepositoryError> {
        Ok(self
            .sms_notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.order_id == order_id)
            .map(|n| RegisteredSmsRecipient {
                mobile_number: n.mobile_number.clone(),
                national_identity_number: n.national_identity_number.clone(),
                organization_number: n.organization_number.clone(),
            })
            .collect())
    }

    async fn claim_new_notifications(
        &self,
        limit: usize,
        policy: SendingTimePolicy,
    ) -> Result<Vec<SmsNotification>, RepositoryError> {
        let mut notifications = self.sms_notifications.lock().unwrap();
        let mut claimed = Vec::new();
        for n in notifications.iter_mut() {
            if claimed.len() >= limit {
                break;
            }
            if n.result == SmsNotificationResult::New && n.sending_time_policy == policy {
                n.result = SmsNotificationResult::Sending;
                claimed.push(n.clone());
            }
        }
        Ok(claimed)
    }

    async fn set_result(
        &self,
        notification_id: Uuid,
        result: SmsNotificationResult,
    ) -> Result<(), RepositoryError> {
        let now = *self.now.lock().unwrap();
        let mut notifications = self.sms_notifications.lock().unwrap();
        let n = notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or(RepositoryError::NotificationNotFound(notification_id))?;
        n.result = result;
        n.result_time = now;
        Ok(())
    }

    async fn expired_notifications(&self) -> Result<Vec<SmsNotification>, RepositoryError> {
        let now = *self.now.lock().unwrap();
        Ok(self
            .sms_notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| !n.result.is_terminal() && n.expiry_time < now)
            .cloned()
            .collect())
    }

    async fn terminate(&self, notification_id: Uuid) -> Result<(), RepositoryError> {
        let order_id = {
            let mut notifications = self.sms_notifications.lock().unwrap();
            let n = notifications
                .iter_mut()
                .find(|n| n.id == notification_id)
                .ok_or(RepositoryError::NotificationNotFound(notification_id))?;
            n.result = SmsNotificationResult::FailedTtl;
            n.order_id
        };
        self.complete_order_after_termination(order_id);
        Ok(())
    }
}

/// Queue producer that records publishes and can be scripted to fail
#[derive(Default)]
pub struct RecordingProducer {
    pub published: Mutex<Vec<(String, Value)>>,
    /// Number of upcoming publishes that return false
    pub failures_remaining: AtomicUsize,
}

impl RecordingProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::Release);
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl QueueProducer for RecordingProducer {
    async fn publish(&self, topic: &str, payload: Value) -> bool {
        let remaining = self.failures_remaining.load(Ordering::Acquire);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::Release);
            return false;
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        true
    }
}

/// Directory fake scripted with fixed contact points and display names
#[derive(Default)]
pub struct ScriptedProfile {
    pub persons: Vec<UserContactPoints>,
    pub organizations: Vec<OrganizationContactPoints>,
    pub person_names: HashMap<String, String>,
    pub organization_names: HashMap<String, String>,
}

#[async_trait]
impl ProfileClient for ScriptedProfile {
    async fn get_user_contact_points(
        &self,
        national_identity_numbers: &[String],
    ) -> Result<Vec<UserContactPoints>, ProfileError> {
        Ok(self
            .persons
            .iter()
            .filter(|p| national_identity_numbers.contains(&p.national_identity_number))
            .cloned()
            .collect())
    }

    async fn get_organization_contact_points(
        &self,
        organization_numbers: &[String],
    ) -> Result<Vec<OrganizationContactPoints>, ProfileError> {
        Ok(self
            .organizations
            .iter()
            .filter(|o| organization_numbers.contains(&o.organization_number))
            .cloned()
            .collect())
    }

    async fn get_user_display_names(
        &self,
        national_identity_numbers: &[String],
    ) -> Result<HashMap<String, String>, ProfileError> {
        Ok(self
            .person_names
            .iter()
            .filter(|(k, _)| national_identity_numbers.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn get_organization_display_names(
        &self,
        organization_numbers: &[String],
    ) -> Result<HashMap<String, String>, ProfileError> {
        Ok(self
            .organization_names
            .iter()
            .filter(|(k, _)| organization_numbers.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Grants access to every user contact point
pub struct AllowAllAuthorizer;

#[async_trait]
impl AuthorizationClient for AllowAllAuthorizer {
    async fn authorized_user_contact_points(
        &self,
        contact_points: Vec<UserContactPoints>,
        _organization_number: &str,
        _resource_id: &str,
    ) -> Result<Vec<UserContactPoints>, AuthorizationError> {
        Ok(contact_points)
    }
}

/// Condition endpoint fake with a call counter
pub struct ScriptedCondition {
    pub response: Result<bool, ()>,
    pub calls: AtomicUsize,
}

impl ScriptedCondition {
    pub fn met() -> Self {
        Self {
            response: Ok(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn not_met() -> Self {
        Self {
            response: Ok(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConditionClient for ScriptedCondition {
    async fn check_send_condition(&self, _endpoint: &str) -> Result<bool, ConditionError> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        self.response
            .map_err(|_| ConditionError::Transport("connection refused".to_string()))
    }
}
