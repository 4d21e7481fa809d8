//! Timezone utilities for date handling
//!
//! This module detects the system's local timezone, parses timezone strings
//! from user input, and interprets the timestamp formats found in session logs.
//! The configured zone is the reference for "today", daily bucket keys and
//! timestamps that carry no offset.

use crate::error::{ClawstatError, Result};
use crate::types::DailyDate;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

/// Layouts accepted for timestamps without an explicit offset
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Configuration for timezone handling
#[derive(Debug, Clone)]
pub struct TimezoneConfig {
    /// The timezone to use for date operations
    pub tz: Tz,
    /// Whether the timezone is UTC
    pub is_utc: bool,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        let tz = get_local_timezone();
        Self {
            is_utc: tz == Tz::UTC,
            tz,
        }
    }
}

impl TimezoneConfig {
    /// Create a configuration pinned to one zone
    pub fn new(tz: Tz) -> Self {
        Self {
            is_utc: tz == Tz::UTC,
            tz,
        }
    }

    /// UTC configuration, mostly useful in tests
    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Create a new timezone configuration from CLI arguments
    pub fn from_cli(timezone_str: Option<&str>, use_utc: bool) -> Result<Self> {
        if use_utc {
            return Ok(Self::utc());
        }

        if let Some(tz_str) = timezone_str {
            let tz = Tz::from_str(tz_str).map_err(|_| {
                ClawstatError::InvalidTimezone(format!(
                    "'{}'. Use format like 'Europe/Berlin', 'Asia/Tokyo', or 'UTC'",
                    tz_str
                ))
            })?;
            Ok(Self::new(tz))
        } else {
            Ok(Self::default())
        }
    }

    /// Get the display name for the configured timezone
    pub fn display_name(&self) -> &str {
        if self.is_utc { "UTC" } else { self.tz.name() }
    }

    /// Calendar date of `now` in the configured zone
    pub fn date_of(&self, now: &DateTime<Utc>) -> DailyDate {
        DailyDate::new(now.with_timezone(&self.tz).date_naive())
    }

    /// Parse an ISO-8601 timestamp from a session log
    ///
    /// Offsets (including `Z`) are honoured. Timestamps without an offset are
    /// taken to be wall-clock time in the configured zone. Returns `None` for
    /// anything unparsable.
    pub fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .and_then(|naive| self.tz.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Convert epoch milliseconds into a UTC timestamp
    ///
    /// Zero is treated as "not set".
    pub fn from_epoch_ms(ms: i64) -> Option<DateTime<Utc>> {
        if ms == 0 {
            return None;
        }
        Utc.timestamp_millis_opt(ms).single()
    }
}

/// Detect the system's local timezone
///
/// This function attempts to detect the local timezone from the system.
/// If detection fails, it falls back to UTC.
pub fn get_local_timezone() -> Tz {
    if let Ok(tz_str) = std::env::var("TZ")
        && let Ok(tz) = Tz::from_str(&tz_str)
    {
        debug!("Using timezone from TZ environment variable: {}", tz_str);
        return tz;
    }

    match iana_time_zone::get_timezone() {
        Ok(tz_str) => match Tz::from_str(&tz_str) {
            Ok(tz) => {
                debug!("Using system timezone from iana-time-zone: {}", tz_str);
                tz
            }
            Err(_) => {
                debug!(
                    "Could not parse timezone from iana-time-zone: '{}', falling back to UTC",
                    tz_str
                );
                Tz::UTC
            }
        },
        Err(e) => {
            debug!(
                "Could not detect local timezone via iana-time-zone: {:?}, falling back to UTC",
                e
            );
            Tz::UTC
        }
    }
}
