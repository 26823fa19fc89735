//! # SMS Send-Window Scheduler
//!
//! Decides whether "now" falls inside the permitted daytime send window and
//! computes expiry timestamps for messages created outside it. All window math
//! happens in one fixed civil time zone; inputs and outputs are UTC, enforced
//! by the type system.

use std::sync::Arc;

use chrono::{DateTime, Duration, LocalResult, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::clients::clock::Clock;
use crate::config::SmsConfig;
use crate::error::{NotifyError, Result};

/// Grace period added on top of the next window start for messages created
/// outside the window
const OUT_OF_WINDOW_TTL_DAYS: i64 = 2;

/// In-window messages expire this long after their reference instant
const IN_WINDOW_TTL_HOURS: i64 = 48;

/// Civil-time send window evaluator
pub struct SendWindowScheduler {
    time_zone: Tz,
    window_start: NaiveTime,
    window_end: NaiveTime,
    start_hour: u32,
    clock: Arc<dyn Clock>,
}

impl SendWindowScheduler {
    /// Build a scheduler from configuration; fails on an unknown zone name or
    /// an inverted window
    pub fn from_config(config: &SmsConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let time_zone: Tz = config.time_zone.parse().map_err(|_| {
            NotifyError::Configuration(format!("Unknown time zone: {}", config.time_zone))
        })?;
        let window_start = NaiveTime::from_hms_opt(config.send_window_start_hour, 0, 0)
            .ok_or_else(|| {
                NotifyError::Configuration(format!(
                    "Invalid send window start hour: {}",
                    config.send_window_start_hour
                ))
            })?;
        let window_end =
            NaiveTime::from_hms_opt(config.send_window_end_hour, 0, 0).ok_or_else(|| {
                NotifyError::Configuration(format!(
                    "Invalid send window end hour: {}",
                    config.send_window_end_hour
                ))
            })?;
        if window_start >= window_end {
            return Err(NotifyError::Configuration(
                "SMS send window start must be before end".to_string(),
            ));
        }

        Ok(Self {
            time_zone,
            window_start,
            window_end,
            start_hour: config.send_window_start_hour,
            clock,
        })
    }

    /// Whether the current instant falls inside the send window, exclusive at
    /// both ends
    pub fn is_within_send_window(&self) -> bool {
        self.instant_within_window(self.clock.utc_now())
    }

    /// Expiry for a message whose processing reference is `reference`.
    ///
    /// Inside the window: reference + 48h. Outside: the next window-start
    /// instant (same day if still before the start hour, else next day),
    /// converted back to UTC, plus two days.
    pub fn get_expiry(&self, reference: DateTime<Utc>) -> DateTime<Utc> {
        if self.instant_within_window(reference) {
            return reference + Duration::hours(IN_WINDOW_TTL_HOURS);
        }

        let local = reference.with_timezone(&self.time_zone);
        let start_date = if local.hour() < self.start_hour {
            local.date_naive()
        } else {
            local.date_naive() + Duration::days(1)
        };
        let next_start = start_date.and_time(self.window_start);

        let next_start_utc = match self.time_zone.from_local_datetime(&next_start) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            // The window start fell in a DST gap; the instant one hour later
            // is the first valid local time.
            LocalResult::None => match self
                .time_zone
                .from_local_datetime(&(next_start + Duration::hours(1)))
            {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                LocalResult::None => reference,
            },
        };

        next_start_utc + Duration::days(OUT_OF_WINDOW_TTL_DAYS)
    }

    fn instant_within_window(&self, instant: DateTime<Utc>) -> bool {
        let local_time = instant.with_timezone(&self.time_zone).time();
        local_time > self.window_start && local_time < self.window_end
    }
}
