//! # Sending Condition Evaluator
//!
//! Checks the optional externally-hosted boolean gate before an order is
//! dispatched. A failed check is classified rather than propagated: first
//! attempts report `Inconclusive` so the caller requeues the order, while
//! retry attempts treat the failure as met and proceed. The fail-open retry
//! policy is deliberate: an endpoint that keeps erroring must not hold an
//! order in the retry loop forever.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clients::condition::ConditionClient;
use crate::models::NotificationOrder;

/// Outcome of a sending-condition check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionCheckResult {
    /// The condition evaluated to true, or no condition is configured
    Met,
    /// The condition evaluated to false; the order must not be dispatched
    NotMet,
    /// The endpoint could not be reached on a first attempt; requeue
    Inconclusive,
}

/// Evaluates the optional send condition attached to an order
pub struct SendingConditionEvaluator {
    condition_client: Arc<dyn ConditionClient>,
}

impl SendingConditionEvaluator {
    pub fn new(condition_client: Arc<dyn ConditionClient>) -> Self {
        Self { condition_client }
    }

    /// Evaluate the order's condition endpoint, if any
    pub async fn evaluate(&self, order: &NotificationOrder, is_retry: bool) -> ConditionCheckResult {
        let Some(endpoint) = order.condition_endpoint.as_deref() else {
            return ConditionCheckResult::Met;
        };

        match self.condition_client.check_send_condition(endpoint).await {
            Ok(true) => ConditionCheckResult::Met,
            Ok(false) => {
                debug!(
                    order_id = %order.id,
                    endpoint,
                    "send condition evaluated to false"
                );
                ConditionCheckResult::NotMet
            }
            Err(e) if is_retry => {
                warn!(
                    order_id = %order.id,
                    endpoint,
                    error = %e,
                    "condition check failed on retry; treating as met"
                );
                ConditionCheckResult::Met
            }
            Err(e) => {
                warn!(
                    order_id = %order.id,
                    endpoint,
                    error = %e,
                    "condition check failed; order must be requeued"
                );
                ConditionCheckResult::Inconclusive
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::clients::condition::ConditionError;
    use crate::models::{NotificationChannel, SendingTimePolicy};

    struct ScriptedCondition(Result<bool, ()>);

    #[async_trait]
    impl ConditionClient for ScriptedCondition {
        async fn check_send_condition(&self, _endpoint: &str) -> Result<bool, ConditionError> {
            self.0
                .map_err(|_| ConditionError::Transport("connection refused".to_string()))
        }
    }

    fn order(endpoint: Option<&str>) -> NotificationOrder {
        NotificationOrder {
            id: Uuid::new_v4(),
            creator: "ttd".to_string(),
            created: Utc::now(),
            requested_send_time: Utc::now(),
            notification_channel: NotificationChannel::Email,
            templates: vec![],
            recipients: vec![],
            condition_endpoint: endpoint.map(str::to_string),
            ignore_reservation: None,
            resource_id: None,
            sending_time_policy: SendingTimePolicy::Anytime,
            senders_reference: None,
        }
    }

    #[tokio::test]
    async fn test_no_endpoint_is_always_met() {
        let evaluator = SendingConditionEvaluator::new(Arc::new(ScriptedCondition(Err(()))));
        assert_eq!(
            evaluator.evaluate(&order(None), false).await,
            ConditionCheckResult::Met
        );
    }

    #[tokio::test]
    async fn test_boolean_outcomes_map_directly() {
        let met = SendingConditionEvaluator::new(Arc::new(ScriptedCondition(Ok(true))));
        let not_met = SendingConditionEvaluator::new(Arc::new(ScriptedCondition(Ok(false))));
        let o = order(Some("https://vg.no/condition"));

        assert_eq!(met.evaluate(&o, false).await, ConditionCheckResult::Met);
        assert_eq!(not_met.evaluate(&o, false).await, ConditionCheckResult::NotMet);
    }

    #[tokio::test]
    async fn test_failure_is_inconclusive_then_fails_open_on_retry() {
        let evaluator = SendingConditionEvaluator::new(Arc::new(ScriptedCondition(Err(()))));
        let o = order(Some("https://vg.no/condition"));

        assert_eq!(
            evaluator.evaluate(&o, false).await,
            ConditionCheckResult::Inconclusive
        );
        assert_eq!(evaluator.evaluate(&o, true).await, ConditionCheckResult::Met);
    }
}
