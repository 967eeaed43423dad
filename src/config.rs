//! Configuration management for the visa processing estimator

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub artifacts: ArtifactsConfig,
    pub training: TrainingConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub request_subject: String,
    /// Subject used for replies when a request carries no reply inbox
    pub reply_subject: String,
    /// Queue group shared by service instances; unset means every
    /// instance receives every request
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// Where the trained artifacts live
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding both artifact files
    pub dir: String,
    /// File name of the serialized regression model
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// File name of the serialized preprocessing info
    #[serde(default = "default_preprocessing_file")]
    pub preprocessing_file: String,
}

fn default_model_file() -> String {
    "visa_processing_model.json".to_string()
}

fn default_preprocessing_file() -> String {
    "preprocessing_info.json".to_string()
}

/// Training input configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// CSV file with historical applications
    pub dataset_path: PathBuf,
}

/// Prediction service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Maximum number of requests processed concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// Values can be overridden with `VISA_ESTIMATOR__<SECTION>__<KEY>`
    /// environment variables, e.g. `VISA_ESTIMATOR__NATS__URL`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("VISA_ESTIMATOR")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "visa.predict".to_string(),
                reply_subject: "visa.predictions".to_string(),
                queue_group: Some("visa-estimator".to_string()),
            },
            artifacts: ArtifactsConfig {
                dir: "models".to_string(),
                model_file: default_model_file(),
                preprocessing_file: default_preprocessing_file(),
            },
            training: TrainingConfig {
                dataset_path: PathBuf::from("data/sample_applications.csv"),
            },
            service: ServiceConfig {
                workers: 4,
                report_interval_secs: default_report_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.request_subject, "visa.predict");
        assert_eq!(config.artifacts.model_file, "visa_processing_model.json");
        assert_eq!(config.artifacts.preprocessing_file, "preprocessing_info.json");
        assert_eq!(config.service.workers, 4);
    }

    #[test]
    fn test_load_from_file_applies_serde_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[nats]
url = "nats://broker:4222"
request_subject = "visa.predict"
reply_subject = "visa.predictions"

[artifacts]
dir = "/var/lib/visa"

[training]
dataset_path = "data/applications.csv"

[service]
workers = 2

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.nats.url, "nats://broker:4222");
        assert_eq!(config.nats.queue_group, None);
        assert_eq!(config.artifacts.dir, "/var/lib/visa");
        assert_eq!(config.artifacts.model_file, "visa_processing_model.json");
        assert_eq!(config.service.report_interval_secs, 60);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_or_default_without_file() {
        let config = AppConfig::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config.artifacts.dir, "models");
    }
}
