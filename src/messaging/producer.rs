//! Queue producer capability. A publish yields a boolean outcome: the
//! transport's own guarantees (at-least-once, ordering) are outside the core,
//! and a `false` outcome is compensated by the caller reverting the delivery
//! unit to retry-eligible state.

use async_trait::async_trait;
use serde_json::Value;

/// Boolean-outcome publish capability over the external message queue
#[async_trait]
pub trait QueueProducer: Send + Sync {
    /// Publish one serialized payload; `true` on acceptance by the transport
    async fn publish(&self, topic: &str, payload: Value) -> bool;

    /// Publish a batch of serialized payloads; returns the indexes of the
    /// payloads that failed to publish
    async fn publish_batch(&self, topic: &str, payloads: Vec<Value>) -> Vec<usize> {
        let mut failed = Vec::new();
        for (index, payload) in payloads.into_iter().enumerate() {
            if !self.publish(topic, payload).await {
                failed.push(index);
            }
        }
        failed
    }
}
