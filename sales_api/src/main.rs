use anyhow::{Context, Result};
use clap::Parser;
use demand_forecast::telemetry;
use sales_api::{router, AppState, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "sales-api", about = "Serve demand predictions over HTTP")]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(long, env = "SALES_API_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "SALES_API_BIND")]
    bind: Option<SocketAddr>,

    /// Artifact root directory
    #[arg(long, env = "DEMAND_ARTIFACTS")]
    artifacts: Option<PathBuf>,

    /// Training-format CSV to import as market data at start
    #[arg(long)]
    market_data: Option<PathBuf>,

    /// Log level filter
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(artifacts) = args.artifacts {
        config.artifact_root = artifacts;
    }
    if let Some(market_data) = args.market_data {
        config.market_data = Some(market_data);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.log_json {
        config.logging.json = true;
    }
    config.validate()?;

    telemetry::init(&config.logging)?;

    let state = AppState::from_config(&config);

    if let Some(path) = config.market_data.clone() {
        let market = Arc::clone(&state.market);
        let batch_size = config.import_batch_size;
        let summary = tokio::task::spawn_blocking(move || market.import_csv(&path, batch_size))
            .await?
            .context("importing market data")?;
        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            "Market data ready"
        );
    }

    let app = router(state);
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Sales API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
