//! Visa Processing Time Estimator - Main Entry Point
//!
//! Trains the processing-days model, answers one-off predictions from the
//! command line, or serves predictions over NATS.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use visa_processing_estimator::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    service, ArtifactStore, Dataset, EstimatorError, PredictionRequest, Predictor, Trainer,
};

/// Visa processing time estimator
#[derive(Parser)]
#[command(name = "visa-estimator")]
#[command(about = "Estimate visa processing time from country, visa type and application date")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model and write the artifacts
    Train {
        /// CSV dataset (defaults to training.dataset_path)
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// Predict processing days for one application
    Predict {
        /// Application date (YYYY-MM-DD); unparsable dates fall back to today
        #[arg(short, long)]
        date: String,

        /// Country of application
        #[arg(short, long)]
        country: String,

        /// Visa type
        #[arg(long)]
        visa_type: String,

        /// Processing office, overriding the country mapping
        #[arg(long)]
        office: Option<String>,
    },

    /// List the countries and visa types known to the trained model
    Options,

    /// Serve predictions over NATS
    Serve,
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("visa_processing_estimator={0},visa_estimator={0}", level)))
        .context("Invalid log level")?;

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// Load artifacts, turning a missing file into operator guidance.
fn load_predictor(store: &ArtifactStore) -> Result<Predictor> {
    match Predictor::load(store) {
        Ok(predictor) => Ok(predictor),
        Err(e @ EstimatorError::MissingArtifact { .. }) => {
            error!(error = %e, "Model files not found");
            anyhow::bail!("{}. Train the model with `visa-estimator train` first.", e)
        }
        Err(e) => Err(e).context("Failed to load artifacts"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)?;
    init_logging(&config.logging, cli.verbose)?;

    let store = ArtifactStore::from_config(&config.artifacts);

    match cli.command {
        Commands::Train { dataset } => {
            let path = dataset.unwrap_or_else(|| config.training.dataset_path.clone());
            let dataset = Dataset::from_csv(&path)?;

            let artifacts = Trainer::new()
                .train(&dataset)
                .context("Training failed")?;
            store.save(&artifacts.model, &artifacts.preprocessing)?;

            info!(
                rows_used = artifacts.report.rows_used,
                rows_dropped = artifacts.report.rows_dropped,
                features = artifacts.report.feature_count,
                r_squared = artifacts.report.r_squared,
                "Model trained"
            );
            println!("{}", serde_json::to_string_pretty(&artifacts.report)?);
        }
        Commands::Predict {
            date,
            country,
            visa_type,
            office,
        } => {
            let predictor = load_predictor(&store)?;

            let mut request = PredictionRequest::new(date, country, visa_type);
            request.processing_office = office;

            let result = predictor.predict(&request)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Options => {
            let predictor = load_predictor(&store)?;
            let info = predictor.preprocessing();

            println!("Countries:  {}", info.countries().join(", "));
            println!("Visa types: {}", info.visa_types().join(", "));
        }
        Commands::Serve => {
            info!("Starting Visa Processing Prediction Service");
            let predictor = load_predictor(&store)?;
            info!(
                features = predictor.preprocessing().feature_count(),
                model_type = %predictor.model_type(),
                "Predictor ready"
            );
            service::run(config, predictor).await?;
        }
    }

    Ok(())
}
