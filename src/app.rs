//! Service wiring shared by one-shot and watch mode
//!
//! [`Services`] owns the parser, aggregator and cron reader for one run of the
//! binary and renders a [`Command`] through the selected formatter.

use crate::aggregation::StatsAggregator;
use crate::cli::{Cli, Command, CronCommand, daily_window};
use crate::output::{OutputFormatter, get_formatter};
use clawstat_core::config::DataPaths;
use clawstat_core::error::Result;
use clawstat_core::timezone::TimezoneConfig;
use clawstat_cron::CronReader;
use clawstat_sessions::SessionParser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Explicitly constructed services for one invocation
pub struct Services {
    aggregator: StatsAggregator,
    cron: CronReader,
    formatter: Box<dyn OutputFormatter + Send + Sync>,
}

impl Services {
    /// Resolve paths and timezone from the command line and build the services
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let timezone = TimezoneConfig::from_cli(cli.timezone.as_deref(), cli.utc)?;
        info!("Using timezone: {}", timezone.display_name());

        let paths = DataPaths::resolve(cli.sessions_dir.clone(), cli.cron_file.clone())?;
        info!(
            "Sessions: {}, cron jobs: {}",
            paths.sessions_dir.display(),
            paths.cron_file.display()
        );

        Ok(Self::new(
            &paths,
            timezone,
            Duration::from_secs(cli.cache_ttl),
            cli.json,
        ))
    }

    pub fn new(paths: &DataPaths, timezone: TimezoneConfig, ttl: Duration, json: bool) -> Self {
        let formatter = get_formatter(json, timezone.tz);
        let parser = Arc::new(SessionParser::new(&paths.sessions_dir, timezone.clone()));
        Self {
            aggregator: StatsAggregator::with_ttl(parser, ttl),
            cron: CronReader::new(&paths.cron_file, timezone).with_ttl(ttl),
            formatter,
        }
    }

    pub fn aggregator(&self) -> &StatsAggregator {
        &self.aggregator
    }

    pub fn cron(&self) -> &CronReader {
        &self.cron
    }

    /// Run one command and format its result
    pub fn render(&self, command: &Command) -> String {
        let formatter = &self.formatter;
        let aggregator = &self.aggregator;

        match command {
            Command::Today => formatter.format_today(&aggregator.today_stats()),
            Command::Daily { window, all } => {
                formatter.format_daily(&aggregator.daily_stats(daily_window(window, *all)))
            }
            Command::Total => formatter.format_total(&aggregator.total_stats()),
            Command::Providers { window } => {
                formatter.format_providers(&aggregator.provider_stats(window.days))
            }
            Command::Sessions { window, limit } => {
                let limit = usize::try_from(*limit).unwrap_or(usize::MAX);
                formatter.format_sessions(&aggregator.session_stats(window.days, limit))
            }
            Command::Messages { days } => formatter.format_messages(&aggregator.message_counts(*days)),
            Command::Dashboard => formatter.format_dashboard(&aggregator.dashboard_stats()),
            Command::Cron { command } => self.render_cron(command),
        }
    }

    fn render_cron(&self, command: &CronCommand) -> String {
        let count = |n: u64| usize::try_from(n).unwrap_or(usize::MAX);

        match command {
            CronCommand::List { all } => self.formatter.format_jobs(&self.cron.jobs(*all)),
            CronCommand::Next { count: n } => {
                self.formatter.format_next_jobs(&self.cron.next_jobs(count(*n)))
            }
            CronCommand::Recent { count: n } => {
                self.formatter.format_recent_runs(&self.cron.recent_runs(count(*n)))
            }
            CronCommand::Summary => self.formatter.format_cron_summary(&self.cron.summary()),
        }
    }
}
