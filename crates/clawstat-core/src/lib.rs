//! Core types, caches, and configuration for clawstat
//!
//! This crate provides the foundational types, error handling, timezone
//! configuration, data-path resolution and the two cache abstractions used
//! by the session parser, the cron reader and the aggregator.

pub mod aggregation_types;
pub mod cache;
pub mod config;
pub mod error;
pub mod timezone;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{ClawstatError, Result};
pub use types::{DailyDate, ISOTimestamp, SessionId, TokenCounts, UsageRecord};
