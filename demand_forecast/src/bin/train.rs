//! Batch job: train on a sales CSV and publish a new artifact bundle

use anyhow::{Context, Result};
use clap::Parser;
use demand_forecast::{
    telemetry, ArtifactStore, BuilderConfig, DataLoader, EncodingOptions, SchemaBuilder,
    TrainingConfig,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "demand-train", about = "Train the demand model and publish its artifacts")]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(long, env = "DEMAND_CONFIG")]
    config: Option<PathBuf>,

    /// Historical sales CSV
    #[arg(long, env = "DEMAND_DATA")]
    data: Option<PathBuf>,

    /// Artifact root directory
    #[arg(long, env = "DEMAND_ARTIFACTS")]
    artifacts: Option<PathBuf>,

    /// Share of records held out for evaluation
    #[arg(long)]
    eval_ratio: Option<f64>,

    /// Seed of the evaluation split
    #[arg(long)]
    seed: Option<u64>,

    /// Add a day-of-week feature
    #[arg(long)]
    day_of_week: bool,

    /// Log level filter
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(artifacts) = args.artifacts {
        config.artifact_root = artifacts;
    }
    if let Some(ratio) = args.eval_ratio {
        config.eval_ratio = ratio;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.day_of_week {
        config.include_day_of_week = true;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.log_json {
        config.logging.json = true;
    }
    config.validate()?;

    telemetry::init(&config.logging)?;

    let records = DataLoader::from_csv(&config.data_path)
        .with_context(|| format!("reading {}", config.data_path.display()))?;

    let builder = SchemaBuilder::new(BuilderConfig {
        eval_ratio: config.eval_ratio,
        seed: config.seed,
        ridge_alphas: config.ridge_alphas.clone(),
        encoding: EncodingOptions {
            include_day_of_week: config.include_day_of_week,
        },
    })?;
    let trained = builder.build(&records).context("training failed")?;

    for candidate in &trained.report.candidates {
        println!("{:<32} R²: {:.4}", candidate.name, candidate.r2);
    }

    let store = ArtifactStore::new(config.artifact_root.clone());
    let bundle = store.publish(trained).context("publishing artifacts failed")?;

    info!("Bundle {} is now current", bundle.version);
    println!(
        "Published {} ({}, evaluation {})",
        bundle.version, bundle.manifest.model_name, bundle.manifest.report.evaluation
    );
    Ok(())
}
