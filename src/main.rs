//! narratord - museum artifact narrator daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use narratord::{Config, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Museum artifact narrator
#[derive(Parser, Debug)]
#[command(name = "narratord", version, about = "Narrate museum artifact photos")]
struct Args {
    /// Address to listen on (overrides configuration)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "narratord=info,tower_http=debug".into()),
        )
        .with((!args.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .with(args.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
