//! clashd - clash tracker daemon

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use clashd::{Config, Server, StorageConfig};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Clash tracker daemon
#[derive(Parser, Debug)]
#[command(name = "clashd", version, about = "Tabletop clash tracker daemon")]
struct Args {
    /// Config file (defaults to ./clashd.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Persist state to this JSON document
    #[arg(long, conflicts_with = "database")]
    json: Option<PathBuf>,

    /// Persist state to this SQLite database
    #[arg(short, long)]
    database: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clashd=info,tower_http=debug".into());

    // CLASHD_LOG_JSON=1 switches to structured output
    let json = std::env::var("CLASHD_LOG_JSON").is_ok_and(|v| v != "0" && !v.is_empty());
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(path) = args.json {
        config.storage = StorageConfig::Json { path };
    }
    if let Some(path) = args.database {
        config.storage = StorageConfig::Sqlite { path };
    }
    if config.gm_ids.is_empty() {
        warn!("No GM ids configured; GM-only commands will be refused");
    }
    info!("Storage: {:?}", config.storage);

    let server = Arc::new(Server::new(config).await?);

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            signal_server.shutdown();
        }
    });

    server.run().await?;

    Ok(())
}
