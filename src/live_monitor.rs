//! Watch mode for clawstat
//!
//! Re-renders one command at a fixed interval until Ctrl+C. Renders go through
//! the shared [`Services`], so refreshes inside the cache TTL are served from
//! cached views and only re-read files after it expires.

use crate::app::Services;
use crate::cli::Command;
use chrono::Local;
use clawstat_core::error::{ClawstatError, Result};
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

/// Live monitoring state
pub struct LiveMonitor {
    services: Arc<Services>,
    command: Command,
    json_output: bool,
    interval_secs: u64,
    /// Whether to use colored output (respects NO_COLOR and non-terminal stdout)
    colored_output: bool,
}

impl LiveMonitor {
    pub fn new(services: Arc<Services>, command: Command, json_output: bool, interval_secs: u64) -> Self {
        Self {
            services,
            command,
            json_output,
            interval_secs,
            colored_output: std::env::var("NO_COLOR").is_err()
                && is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Start the refresh loop
    pub async fn run(self) -> Result<()> {
        let mut interval = interval(Duration::from_secs(self.interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh_display().await?;
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("\nExiting watch mode...");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Render the command off the async runtime; file I/O is blocking
    pub async fn render(&self) -> Result<String> {
        let services = Arc::clone(&self.services);
        let command = self.command.clone();
        tokio::task::spawn_blocking(move || services.render(&command))
            .await
            .map_err(|e| ClawstatError::Io(std::io::Error::other(format!("Render task failed: {e}"))))
    }

    fn header(&self) -> String {
        let title = format!(
            "clawstat watch - Last updated: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let title = if self.colored_output {
            title.bold().to_string()
        } else {
            title
        };
        format!(
            "{title}\nRefresh interval: {}s | Press Ctrl+C to exit\n{}",
            self.interval_secs,
            "-".repeat(80)
        )
    }

    async fn refresh_display(&self) -> Result<()> {
        let output = self.render().await?;

        if !self.json_output {
            print!("\x1B[2J\x1B[1;1H"); // Clear screen and move cursor to top-left
            println!("{}", self.header());
        }
        println!("{output}");

        Ok(())
    }
}
