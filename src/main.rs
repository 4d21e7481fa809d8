//! clawstat - Usage and schedule dashboard for a local agent runtime

use clap::Parser;
use clawstat::{
    Result,
    app::Services,
    cli::{Cli, Command},
    live_monitor::LiveMonitor,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. RUST_LOG wins unless --verbose is given.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("clawstat=info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clawstat=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = cli.command.clone().unwrap_or(Command::Dashboard);
    let services = Arc::new(Services::from_cli(&cli)?);

    if cli.watch {
        info!("Starting watch mode");
        let monitor = LiveMonitor::new(services, command, cli.json, cli.interval);
        monitor.run().await?;
    } else {
        println!("{}", services.render(&command));
    }

    Ok(())
}
