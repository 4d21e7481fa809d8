//! Scheduled job reader for clawstat
//!
//! Reads the agent runtime's job configuration (`cron/jobs.json`), decodes
//! each job's schedule into a [`Schedule`] and derives the upcoming-runs,
//! recent-runs and summary views.

mod config;

pub mod reader;
pub mod schedule;

pub use reader::{CronReader, CronSummary, NextJob, RecentRun, ScheduledJob};
pub use schedule::{Schedule, ScheduleKind, format_interval};
