//! Linear regression trainer
//!
//! Cleans the historical dataset, builds the training matrix and fits the
//! model, producing the artifact pair consumed by the predictor.

use crate::dataset::Dataset;
use crate::error::{EstimatorError, Result};
use crate::feature_extractor::build_training_matrix;
use crate::models::regression::LinearRegressionModel;
use crate::types::preprocessing::PreprocessingInfo;
use serde::Serialize;
use tracing::{info, warn};

/// Training statistics reported after a successful fit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows_read: usize,
    pub rows_used: usize,
    /// Rows without a valid processing-days label
    pub rows_dropped: usize,
    pub feature_count: usize,
    pub mean_processing_days: f64,
    pub r_squared: f64,
    pub mean_absolute_error: f64,
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub model: LinearRegressionModel,
    pub preprocessing: PreprocessingInfo,
    pub report: TrainingReport,
}

/// Trainer for the processing-days regression
#[derive(Debug, Clone, Default)]
pub struct Trainer;

impl Trainer {
    /// Create a new trainer
    pub fn new() -> Self {
        Self
    }

    /// Train on a historical dataset.
    ///
    /// Fails with [`EstimatorError::EmptyTrainingSet`] when no row has a
    /// valid label after cleaning; nothing is fitted in that case.
    pub fn train(&self, dataset: &Dataset) -> Result<TrainedArtifacts> {
        let records = dataset.clean();

        let labels: Vec<f64> = records
            .iter()
            .filter_map(|r| r.processing_days)
            .map(|d| d as f64)
            .collect();
        if labels.is_empty() {
            warn!(rows = records.len(), "No valid processing-days labels");
            return Err(EstimatorError::EmptyTrainingSet {
                rows: records.len(),
            });
        }
        let mean_processing_days = labels.iter().sum::<f64>() / labels.len() as f64;

        let matrix = build_training_matrix(&records, mean_processing_days);
        let rows_dropped = matrix.unlabeled_count();
        let (x, y) = matrix.labeled();

        info!(
            rows = records.len(),
            used = y.len(),
            dropped = rows_dropped,
            features = matrix.feature_names.len(),
            "Fitting linear regression"
        );

        let mut model = LinearRegressionModel::fit(&x, &y)?;
        model.summary.rows_dropped = rows_dropped;

        let report = TrainingReport {
            rows_read: records.len(),
            rows_used: y.len(),
            rows_dropped,
            feature_count: matrix.feature_names.len(),
            mean_processing_days,
            r_squared: model.summary.r_squared,
            mean_absolute_error: model.summary.mean_absolute_error,
        };

        info!(
            r_squared = report.r_squared,
            mae = report.mean_absolute_error,
            mean_days = report.mean_processing_days,
            "Training complete"
        );

        let preprocessing = PreprocessingInfo {
            feature_names: matrix.feature_names,
            country_avg: matrix.country_avg,
            visa_avg: matrix.visa_avg,
            office_map: matrix.office_map,
            mean_processing_days,
        };

        Ok(TrainedArtifacts {
            model,
            preprocessing,
            report,
        })
    }
}
