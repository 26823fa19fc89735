//! # Past-Due Order Scanner
//!
//! Batch loop that claims orders whose requested send time has passed and
//! drives each through the dispatcher. A soft wall-clock budget and a minimum
//! batch size bound the work done in one invocation. Cancellation mid-batch
//! rolls orders already claimed into `Processing` back to `Registered` before
//! the cancellation propagates, so no order is left stuck.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::clients::repository::OrderRepository;
use crate::config::ScannerConfig;
use crate::error::{NotifyError, Result};
use crate::models::OrderProcessingStatus;
use crate::orchestration::order_dispatcher::{DispatchOutcome, OrderDispatcher};

/// Summary of one scan invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Orders dispatched in this invocation
    pub orders_processed: usize,
    /// Orders returned to `Registered` for a later retry pass
    pub orders_requeued: usize,
    /// Batches claimed
    pub batches: usize,
    /// Whether the loop stopped because the wall-clock budget ran out
    pub budget_exhausted: bool,
}

/// Claims and dispatches past-due orders in bounded batches
pub struct PastDueOrderScanner {
    order_repository: Arc<dyn OrderRepository>,
    dispatcher: Arc<OrderDispatcher>,
    config: ScannerConfig,
    cancelled: Arc<AtomicBool>,
}

impl PastDueOrderScanner {
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        dispatcher: Arc<OrderDispatcher>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            order_repository,
            dispatcher,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancellation handle shared with the host's shutdown path
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Run one scan: claim batches of past-due orders and dispatch each,
    /// looping while batches come back full and the budget holds
    #[instrument(skip(self))]
    pub async fn scan_once(&self) -> Result<ScanResult> {
        let started = Instant::now();
        let mut result = ScanResult::default();

        loop {
            let batch = self
                .order_repository
                .claim_past_due_orders(self.config.batch_size)
                .await?;
            let batch_len = batch.len();
            if batch_len == 0 {
                break;
            }
            result.batches += 1;

            let mut remaining = batch.into_iter();
            while let Some(order) = remaining.next() {
                if self.cancelled.load(Ordering::Acquire) {
                    // Roll claimed-but-undispatched orders back so none is
                    // stuck in `Processing`.
                    let mut rolled_back = 1;
                    self.order_repository
                        .set_processing_status(order.id, OrderProcessingStatus::Registered)
                        .await?;
                    for pending in remaining {
                        self.order_repository
                            .set_processing_status(pending.id, OrderProcessingStatus::Registered)
                            .await?;
                        rolled_back += 1;
                    }
                    warn!(rolled_back, "scan cancelled; claimed orders rolled back");
                    return Err(NotifyError::Cancelled);
                }

                match self.dispatcher.process_order(&order).await? {
                    DispatchOutcome::RetryRequired => {
                        debug!(order_id = %order.id, "order requeued for retry");
                        self.order_repository
                            .set_processing_status(order.id, OrderProcessingStatus::Registered)
                            .await?;
                        result.orders_requeued += 1;
                    }
                    DispatchOutcome::Resolved | DispatchOutcome::Pending => {
                        result.orders_processed += 1;
                    }
                }
            }

            // A short batch means no more past-due work; a full batch keeps
            // the loop going until the soft budget runs out.
            if batch_len < self.config.batch_size {
                break;
            }
            if started.elapsed().as_secs() >= self.config.budget_seconds {
                result.budget_exhausted = true;
                break;
            }
        }

        info!(
            orders_processed = result.orders_processed,
            orders_requeued = result.orders_requeued,
            batches = result.batches,
            budget_exhausted = result.budget_exhausted,
            "past-due order scan complete"
        );
        Ok(result)
    }
}
