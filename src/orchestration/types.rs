//! Shared result types for the orchestration components.

use serde::{Deserialize, Serialize};

/// Summary of one publish cycle over a channel's `New` delivery units
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishCycleResult {
    /// Units claimed from storage in this cycle
    pub claimed: usize,
    /// Units accepted by the queue producer
    pub published: usize,
    /// Units reverted to retry-eligible state after a failed publish
    pub reverted: usize,
}

impl PublishCycleResult {
    pub fn absorb(&mut self, other: PublishCycleResult) {
        self.claimed += other.claimed;
        self.published += other.published;
        self.reverted += other.reverted;
    }
}

/// Summary of one generation pass over an order's recipients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Delivery units persisted in state `New`
    pub created: usize,
    /// Units recording a terminal per-recipient failure (reserved, not
    /// identified)
    pub failed_at_creation: usize,
    /// Creations skipped by the idempotent-retry guard
    pub skipped_existing: usize,
}
