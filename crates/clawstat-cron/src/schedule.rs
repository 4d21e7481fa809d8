//! Job schedules
//!
//! A job runs on one of three schedules, decoded from the `schedule` object's
//! `kind` tag:
//!
//! - `cron`: a cron expression, optionally evaluated in a named timezone
//! - `every`: a fixed interval in milliseconds
//! - `at`: a single absolute time in epoch milliseconds
//!
//! # Examples
//!
//! ```
//! use clawstat_cron::Schedule;
//! use clawstat_core::timezone::TimezoneConfig;
//!
//! let schedule: Schedule = serde_json::from_str(r#"{"kind":"every","everyMs":3600000}"#).unwrap();
//! assert_eq!(schedule.describe(&TimezoneConfig::utc()), "every 1h");
//! ```

use chrono::DateTime;
use clawstat_core::timezone::TimezoneConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// Decoded `schedule` object of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Schedule {
    Cron {
        #[serde(default)]
        expr: String,
        #[serde(default)]
        tz: Option<String>,
    },
    Every {
        #[serde(rename = "everyMs", default)]
        every_ms: u64,
    },
    At {
        #[serde(rename = "atMs", default)]
        at_ms: i64,
    },
}

/// Schedule tag without its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Cron,
    Every,
    At,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::Cron => "cron",
            ScheduleKind::Every => "every",
            ScheduleKind::At => "at",
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Schedule {
    pub fn kind(&self) -> ScheduleKind {
        match self {
            Schedule::Cron { .. } => ScheduleKind::Cron,
            Schedule::Every { .. } => ScheduleKind::Every,
            Schedule::At { .. } => ScheduleKind::At,
        }
    }

    /// Timezone the cron expression is evaluated in, if one is configured
    pub fn timezone(&self) -> Option<&str> {
        match self {
            Schedule::Cron { tz, .. } => tz.as_deref(),
            Schedule::Every { .. } | Schedule::At { .. } => None,
        }
    }

    /// Human-readable form of the schedule
    ///
    /// One-shot times are rendered as `%Y-%m-%d %H:%M` in `timezone`, or as
    /// `at <ms>` when the value is out of range.
    pub fn describe(&self, timezone: &TimezoneConfig) -> String {
        match self {
            Schedule::Cron { expr, .. } => expr.clone(),
            Schedule::Every { every_ms } => format_interval(*every_ms),
            Schedule::At { at_ms } => match DateTime::from_timestamp_millis(*at_ms) {
                Some(at) => at
                    .with_timezone(&timezone.tz)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
                None => format!("at {at_ms}"),
            },
        }
    }
}

/// Render an interval using the coarsest unit it reaches
///
/// ```
/// use clawstat_cron::format_interval;
///
/// assert_eq!(format_interval(5_400_000), "every 1h");
/// assert_eq!(format_interval(90_000), "every 1m");
/// assert_eq!(format_interval(999), "every 0s");
/// ```
pub fn format_interval(every_ms: u64) -> String {
    if every_ms >= MS_PER_HOUR {
        format!("every {}h", every_ms / MS_PER_HOUR)
    } else if every_ms >= MS_PER_MINUTE {
        format!("every {}m", every_ms / MS_PER_MINUTE)
    } else {
        format!("every {}s", every_ms / MS_PER_SECOND)
    }
}
