//! clawstat - Usage and schedule dashboard for a local agent runtime
//!
//! This library provides functionality to:
//! - Aggregate token and cost usage from the runtime's session logs
//! - Summarize the runtime's scheduled jobs
//! - Render both as tables or JSON, once or in watch mode
//!
//! Parsing lives in `clawstat-sessions`, the job reader in `clawstat-cron`
//! and shared types, caches and configuration in `clawstat-core`.
//!
//! # Examples
//!
//! ```no_run
//! use clawstat::aggregation::StatsAggregator;
//! use clawstat_core::config::DataPaths;
//! use clawstat_core::timezone::TimezoneConfig;
//! use clawstat_sessions::SessionParser;
//! use std::sync::Arc;
//!
//! fn main() -> clawstat::Result<()> {
//!     let paths = DataPaths::resolve(None, None)?;
//!     let parser = Arc::new(SessionParser::new(&paths.sessions_dir, TimezoneConfig::default()));
//!     let aggregator = StatsAggregator::new(parser);
//!
//!     let dashboard = aggregator.dashboard_stats();
//!     println!("{} tokens today", dashboard.today.tokens_total);
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod app;
pub mod cli;
pub mod live_monitor;
pub mod output;

// Re-export commonly used types
pub use clawstat_core::{ClawstatError, DailyDate, ISOTimestamp, Result, SessionId, TokenCounts};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
