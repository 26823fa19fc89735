//! # Structured Logging
//!
//! Environment-aware tracing initialization. Console output always; JSON
//! output when `NOTIFY_LOG_FORMAT=json`, which suits log shipping from the
//! worker loops. Initialization is idempotent so embedding hosts that already
//! installed a subscriber keep theirs.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once for the process
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("notify_core=info,warn"));

        let json_output = std::env::var("NOTIFY_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let result = if json_output {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .try_init()
        };

        if result.is_err() {
            // A global subscriber is already installed by the host; keep it.
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}
