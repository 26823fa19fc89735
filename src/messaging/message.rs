//! Queue payload records: the serialized form of a delivery unit handed to the
//! queue producer. Flat JSON-able structures; no envelope beyond the topic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{EmailContentType, EmailNotification, SmsNotification};

/// Serialized email delivery unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailQueuePayload {
    pub notification_id: Uuid,
    pub order_id: Uuid,
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    pub body: String,
    pub content_type: EmailContentType,
}

impl From<&EmailNotification> for EmailQueuePayload {
    fn from(notification: &EmailNotification) -> Self {
        Self {
            notification_id: notification.id,
            order_id: notification.order_id,
            from_address: notification.from_address.clone(),
            to_address: notification.to_address.clone(),
            subject: notification.subject.clone(),
            body: notification.body.clone(),
            content_type: notification.content_type,
        }
    }
}

/// Serialized SMS delivery unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsQueuePayload {
    pub notification_id: Uuid,
    pub order_id: Uuid,
    pub sender: String,
    pub mobile_number: String,
    pub message: String,
}

impl From<&SmsNotification> for SmsQueuePayload {
    fn from(notification: &SmsNotification) -> Self {
        Self {
            notification_id: notification.id,
            order_id: notification.order_id,
            sender: notification.sender_number.clone(),
            mobile_number: notification.mobile_number.clone(),
            message: notification.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::SmsNotificationResult;

    #[test]
    fn test_sms_payload_serializes_flat() {
        let notification = SmsNotification {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            requested_send_time: Utc::now(),
            expiry_time: Utc::now(),
            mobile_number: "+4799999999".to_string(),
            national_identity_number: None,
            organization_number: None,
            sender_number: "Example".to_string(),
            body: "hello".to_string(),
            segment_count: 1,
            sending_time_policy: crate::models::SendingTimePolicy::Anytime,
            result: SmsNotificationResult::New,
            result_time: Utc::now(),
            customized: false,
        };

        let payload = SmsQueuePayload::from(&notification);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["sender"], "Example");
        assert_eq!(value["mobile_number"], "+4799999999");
        assert_eq!(value["message"], "hello");
        assert!(value.as_object().unwrap().values().all(|v| !v.is_object()));
    }
}
