//! Clock and identifier providers, injected wherever the pipeline stamps time
//! or mints identifiers so tests can pin both.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Source of new identifiers
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Uuid;
}

/// Wall-clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random v4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
