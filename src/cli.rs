//! CLI interface for clawstat
//!
//! Usage views and scheduled-job views are subcommands; data locations,
//! timezone and output format are global flags.
//!
//! # Example
//!
//! ```bash
//! # Dashboard (the default when no command is given)
//! clawstat
//!
//! # Last 30 days, one row per day
//! clawstat daily --days 30
//!
//! # Upcoming scheduled jobs as JSON
//! clawstat cron next --count 3 --json
//!
//! # Refresh today's usage every 10 seconds
//! clawstat today --watch --interval 10
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Inspect agent usage and scheduled jobs
#[derive(Parser, Debug, Clone)]
#[command(name = "clawstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Timezone for "today" and daily buckets (e.g. "Europe/Berlin", "UTC")
    /// If not specified, uses the system's local timezone
    #[arg(long, short = 'z', global = true)]
    pub timezone: Option<String>,

    /// Use UTC for date grouping (overrides --timezone)
    #[arg(long, global = true)]
    pub utc: bool,

    /// Directory holding the session logs
    #[arg(long, global = true, env = "CLAWSTAT_SESSIONS_DIR", value_name = "DIR")]
    pub sessions_dir: Option<PathBuf>,

    /// Scheduled jobs configuration file
    #[arg(long, global = true, env = "CLAWSTAT_CRON_FILE", value_name = "FILE")]
    pub cron_file: Option<PathBuf>,

    /// Seconds a computed view stays cached
    #[arg(
        long,
        global = true,
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(0..=3600)
    )]
    pub cache_ttl: u64,

    /// Re-run the command periodically until interrupted
    #[arg(long, short = 'w', global = true)]
    pub watch: bool,

    /// Refresh interval in seconds for watch mode
    #[arg(
        long,
        global = true,
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub interval: u64,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Look-back window in days
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowArgs {
    /// Number of days to include
    #[arg(long, short = 'd', default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=365))]
    pub days: u32,
}

/// Top-level commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Usage for the current day
    Today,

    /// Usage per day
    Daily {
        #[command(flatten)]
        window: WindowArgs,

        /// Include all data instead of a fixed window
        #[arg(long, conflicts_with = "days")]
        all: bool,
    },

    /// Usage over all time
    Total,

    /// Usage per provider and model
    Providers {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Most recently active sessions
    Sessions {
        #[command(flatten)]
        window: WindowArgs,

        /// Maximum number of sessions to show
        #[arg(long, short = 'l', default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..=100))]
        limit: u64,
    },

    /// Message counts by author
    Messages {
        /// Number of days to include
        #[arg(long, short = 'd', default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=365))]
        days: u32,
    },

    /// Today, the last week and today's providers
    Dashboard,

    /// Scheduled jobs
    Cron {
        #[command(subcommand)]
        command: CronCommand,
    },
}

/// Scheduled job views
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CronCommand {
    /// List configured jobs
    List {
        /// Include disabled jobs
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Upcoming runs, soonest first
    Next {
        /// Number of jobs to show
        #[arg(long, short = 'n', default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=50))]
        count: u64,
    },

    /// Latest runs, most recent first
    Recent {
        /// Number of runs to show
        #[arg(long, short = 'n', default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=50))]
        count: u64,
    },

    /// Job counts and the next three runs
    Summary,
}

/// `Some(days)` for a bounded daily window, `None` for `--all`
pub fn daily_window(window: &WindowArgs, all: bool) -> Option<u32> {
    if all { None } else { Some(window.days) }
}
