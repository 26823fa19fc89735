//! # Background Publish Queue
//!
//! Worker loops that drain newly created delivery units through the channel
//! generators' publish step: one lane per SMS sending-time policy and one
//! simpler lane for email. Each lane coalesces enqueue requests while a cycle
//! is pending and guarantees at most one in-flight publish cycle; after a
//! cycle the lane is marked available again regardless of outcome. A publish
//! failure is logged and the loop continues; shutdown terminates loops
//! promptly without an error log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::models::SendingTimePolicy;
use crate::orchestration::email_processor::EmailNotificationService;
use crate::orchestration::sms_processor::SmsNotificationService;

/// One publish lane: a pending flag for coalescing plus a wake-up signal
#[derive(Debug, Default)]
struct Lane {
    pending: AtomicBool,
    notify: Notify,
}

impl Lane {
    /// Request a publish cycle; false when one is already pending or running
    fn try_enqueue(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.notify_one();
        true
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }

    fn mark_available(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

/// Signal primitive shared between the orchestrating side (which enqueues
/// after generating delivery units) and the worker loops
#[derive(Debug, Default)]
pub struct PublishTaskQueue {
    sms_anytime: Lane,
    sms_daytime: Lane,
    email: Lane,
}

impl PublishTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an SMS publish cycle for one policy; false when coalesced into
    /// an already-pending cycle
    pub fn try_enqueue_sms(&self, policy: SendingTimePolicy) -> bool {
        self.sms_lane(policy).try_enqueue()
    }

    /// Request an email publish cycle; false when coalesced
    pub fn try_enqueue_email(&self) -> bool {
        self.email.try_enqueue()
    }

    fn sms_lane(&self, policy: SendingTimePolicy) -> &Lane {
        match policy {
            SendingTimePolicy::Anytime => &self.sms_anytime,
            SendingTimePolicy::Daytime => &self.sms_daytime,
        }
    }
}

/// Spawns and supervises the publish worker loops
pub struct BackgroundPublisher {
    queue: Arc<PublishTaskQueue>,
    email_service: Arc<EmailNotificationService>,
    sms_service: Arc<SmsNotificationService>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl BackgroundPublisher {
    pub fn new(
        queue: Arc<PublishTaskQueue>,
        email_service: Arc<EmailNotificationService>,
        sms_service: Arc<SmsNotificationService>,
    ) -> Self {
        Self {
            queue,
            email_service,
            sms_service,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Spawn one loop per SMS sending-time policy plus the email loop
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        self.running.store(true, Ordering::Release);

        let mut handles = Vec::new();
        for policy in [SendingTimePolicy::Anytime, SendingTimePolicy::Daytime] {
            handles.push(self.spawn_sms_loop(policy));
        }
        handles.push(self.spawn_email_loop());
        info!("background publisher started");
        handles
    }

    /// Request cooperative shutdown of every loop
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        self.shutdown.notify_waiters();
        info!("background publisher shutdown requested");
    }

    fn spawn_sms_loop(&self, policy: SendingTimePolicy) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let service = Arc::clone(&self.sms_service);
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);

        tokio::spawn(async move {
            debug!(policy = %policy, "sms publish loop started");
            loop {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = queue.sms_lane(policy).wait() => {}
                }
                if !running.load(Ordering::Acquire) {
                    break;
                }

                if let Err(e) = service.send_notifications(policy).await {
                    error!(policy = %policy, error = %e, "sms publish cycle failed");
                }
                queue.sms_lane(policy).mark_available();
            }
            debug!(policy = %policy, "sms publish loop stopped");
        })
    }

    fn spawn_email_loop(&self) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let service = Arc::clone(&self.email_service);
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);

        tokio::spawn(async move {
            debug!("email publish loop started");
            loop {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = queue.email.wait() => {}
                }
                if !running.load(Ordering::Acquire) {
                    break;
                }

                if let Err(e) = service.send_notifications().await {
                    error!(error = %e, "email publish cycle failed");
                }
                queue.email.mark_available();
            }
            debug!("email publish loop stopped");
        })
    }
}
