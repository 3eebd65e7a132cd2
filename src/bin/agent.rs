use std::time::Duration;

use clap::Parser;
use feedwatch::{Agent, AgentHandle, config::read_config_file};
use tracing::{error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Log level for the agent (trace, debug, info, warn, error, off)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn init(level: LevelFilter) {
    // the library and the binary share the `feedwatch` target
    let filter = filter::Targets::new().with_target("feedwatch", level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;
    let mut agent = Agent::from_config(&config)?;

    if args.once {
        let report = agent.cycle().await?;
        info!("cycle done: {report:?}");
        return Ok(());
    }

    info!(
        "polling {} every {}s",
        config.source.url, config.source.interval
    );
    let interval = Duration::from_secs(config.source.interval.max(1));
    let handle = AgentHandle::spawn(agent, interval);

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }

    info!("shutting down");
    handle.shutdown().await
}
