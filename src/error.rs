//! Error types for training and prediction

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the estimator library.
///
/// Recoverable data-quality issues (unparsable dates, unseen categories,
/// missing labels) never show up here; they are handled where they occur.
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// A model or preprocessing artifact is absent from the artifact store.
    #[error("artifact not found at {}: run `visa-estimator train` first", path.display())]
    MissingArtifact { path: PathBuf },

    /// No row survived cleaning with a usable processing-days label.
    #[error("no valid labeled rows in training set ({rows} rows read)")]
    EmptyTrainingSet { rows: usize },

    /// The least-squares solver could not produce coefficients.
    #[error("model fit failed: {0}")]
    Fit(String),

    /// A feature vector does not match the width the model was fitted on.
    #[error("feature vector has {actual} columns, model expects {expected}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("invalid dataset: {0}")]
    Dataset(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse classification reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Actionable: the operator must run training.
    MissingArtifact,
    /// Fatal at training time.
    EmptyTrainingSet,
    /// Anything else; detail is kept for diagnostics only.
    Unexpected,
}

impl EstimatorError {
    /// Classify the error for callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            EstimatorError::MissingArtifact { .. } => ErrorKind::MissingArtifact,
            EstimatorError::EmptyTrainingSet { .. } => ErrorKind::EmptyTrainingSet,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Check if the operator must run training
    pub fn is_missing_artifact(&self) -> bool {
        self.kind() == ErrorKind::MissingArtifact
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
