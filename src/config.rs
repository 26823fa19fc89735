//! # Configuration
//!
//! Pipeline configuration with sensible defaults and environment overrides
//! (`NOTIFY_` prefix). Values cover queue topics, publish batch sizes, the
//! email TTL, the SMS send window and its civil time zone, the mobile-number
//! country prefix, and the past-due scanner's batch/budget knobs.

use serde::Deserialize;

use crate::error::{NotifyError, Result};

/// SMS-specific settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    /// Topic the SMS publish step hands payloads to
    pub queue_topic: String,
    /// Units claimed per publish batch
    pub batch_size: usize,
    /// IANA zone name the send window is evaluated in
    pub time_zone: String,
    /// Send window start hour, exclusive
    pub send_window_start_hour: u32,
    /// Send window end hour, exclusive
    pub send_window_end_hour: u32,
    /// Prefix assumed for 8-digit national numbers starting with 4 or 9
    pub default_country_prefix: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            queue_topic: "sms.queue".to_string(),
            batch_size: 50,
            time_zone: "Europe/Oslo".to_string(),
            send_window_start_hour: 9,
            send_window_end_hour: 17,
            default_country_prefix: "+47".to_string(),
        }
    }
}

/// Email-specific settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Topic the email publish step hands payloads to
    pub queue_topic: String,
    /// Units claimed per publish batch
    pub batch_size: usize,
    /// Hours after the requested send time before an unsent unit expires
    pub ttl_hours: i64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            queue_topic: "email.queue".to_string(),
            batch_size: 50,
            ttl_hours: 48,
        }
    }
}

/// Past-due order scanner settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Orders claimed per batch
    pub batch_size: usize,
    /// Soft wall-clock budget for one scan invocation, in seconds
    pub budget_seconds: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            budget_seconds: 60,
        }
    }
}

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub sms: SmsConfig,
    pub email: EmailConfig,
    pub scanner: ScannerConfig,
}

impl NotifyConfig {
    /// Load configuration from the environment on top of defaults.
    ///
    /// Nested keys use `__` separators, e.g. `NOTIFY_SMS__BATCH_SIZE=25`.
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("NOTIFY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| NotifyError::Configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| NotifyError::Configuration(e.to_string()))
    }

    /// Validate cross-field invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.sms.send_window_start_hour >= self.sms.send_window_end_hour {
            return Err(NotifyError::Configuration(format!(
                "SMS send window start hour {} must be before end hour {}",
                self.sms.send_window_start_hour, self.sms.send_window_end_hour
            )));
        }
        if self.sms.send_window_end_hour > 24 {
            return Err(NotifyError::Configuration(format!(
                "SMS send window end hour {} is out of range",
                self.sms.send_window_end_hour
            )));
        }
        if self.sms.time_zone.parse::<chrono_tz::Tz>().is_err() {
            return Err(NotifyError::Configuration(format!(
                "Unknown time zone: {}",
                self.sms.time_zone
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NotifyConfig::default();
        assert_eq!(config.sms.batch_size, 50);
        assert_eq!(config.sms.send_window_start_hour, 9);
        assert_eq!(config.sms.send_window_end_hour, 17);
        assert_eq!(config.email.ttl_hours, 48);
        assert_eq!(config.scanner.budget_seconds, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut config = NotifyConfig::default();
        config.sms.send_window_start_hour = 18;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_zone() {
        let mut config = NotifyConfig::default();
        config.sms.time_zone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }
}
