//! Visa Processing Time Estimator
//!
//! Trains a linear regression on historical visa applications and predicts
//! processing time in days from an application's date, country and visa
//! type.

pub mod config;
pub mod consumer;
pub mod dataset;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use dataset::Dataset;
pub use error::{ErrorKind, EstimatorError, Result};
pub use feature_extractor::{FeatureExtractor, Season};
pub use models::inference::Predictor;
pub use models::loader::ArtifactStore;
pub use models::trainer::{TrainedArtifacts, Trainer, TrainingReport};
pub use types::{PredictionRequest, PredictionResult, PreprocessingInfo};
