//! Ordinary least squares linear regression
//!
//! Fits `y = intercept + x · coefficients` by centering the data and solving
//! the least-squares system through an SVD pseudo-inverse. Rank-deficient
//! designs (every one-hot block sums to one) get the minimum-norm solution
//! instead of a singular-matrix failure.

use crate::error::{EstimatorError, Result};
use chrono::{DateTime, Utc};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Display label for the fitted model family
pub const LINEAR_REGRESSION: &str = "Linear Regression";

/// A fitted model mapping a feature vector to a real number.
pub trait Regressor: Send + Sync {
    /// Predict from one feature vector in schema order
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Human-readable model family
    fn model_type(&self) -> &str;
}

/// Goodness-of-fit on the training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub samples: usize,
    /// Width of the feature vectors the model was fitted on
    #[serde(default)]
    pub feature_count: usize,
    /// Training rows left out for lacking a valid label
    #[serde(default)]
    pub rows_dropped: usize,
    pub r_squared: f64,
    pub mean_absolute_error: f64,
    pub trained_at: DateTime<Utc>,
}

/// Linear regression model with intercept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub intercept: f64,
    /// One weight per feature column
    pub coefficients: Vec<f64>,
    pub summary: FitSummary,
}

impl LinearRegressionModel {
    /// Fit on row-major features `x` and targets `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let n = y.len();
        if n == 0 {
            return Err(EstimatorError::Fit("no samples to fit".to_string()));
        }
        if x.len() != n {
            return Err(EstimatorError::Fit(format!(
                "{} feature rows for {} targets",
                x.len(),
                n
            )));
        }

        let p = x[0].len();
        if let Some(row) = x.iter().find(|row| row.len() != p) {
            return Err(EstimatorError::SchemaMismatch {
                expected: p,
                actual: row.len(),
            });
        }

        let n_f = n as f64;
        let x_mean: Vec<f64> = (0..p)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n_f)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n_f;

        let centered = DMatrix::from_fn(n, p, |i, j| x[i][j] - x_mean[j]);

        let coefficients = if centered.iter().all(|v| *v == 0.0) {
            // Constant features carry no signal; the intercept is the mean.
            vec![0.0; p]
        } else {
            let target = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));

            let svd = centered.svd(true, true);
            // Same relative cutoff as LAPACK-style lstsq
            let cutoff = svd.singular_values.max() * n.max(p) as f64 * f64::EPSILON;
            let solution = svd
                .solve(&target, cutoff)
                .map_err(|e| EstimatorError::Fit(e.to_string()))?;

            solution.iter().copied().collect::<Vec<f64>>()
        };

        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(EstimatorError::Fit("non-finite coefficient".to_string()));
        }

        let intercept = y_mean
            - x_mean
                .iter()
                .zip(&coefficients)
                .map(|(m, c)| m * c)
                .sum::<f64>();

        let mut model = Self {
            intercept,
            coefficients,
            summary: FitSummary {
                samples: n,
                feature_count: p,
                rows_dropped: 0,
                r_squared: 0.0,
                mean_absolute_error: 0.0,
                trained_at: Utc::now(),
            },
        };

        let predictions: Vec<f64> = x.iter().map(|row| model.evaluate(row)).collect();
        model.summary.r_squared = r_squared(y, &predictions, y_mean);
        model.summary.mean_absolute_error = predictions
            .iter()
            .zip(y)
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / n_f;

        Ok(model)
    }

    /// Get the number of features the model expects
    pub fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

impl Regressor for LinearRegressionModel {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(EstimatorError::SchemaMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        Ok(self.evaluate(features))
    }

    fn model_type(&self) -> &str {
        LINEAR_REGRESSION
    }
}

fn r_squared(y: &[f64], predictions: &[f64], y_mean: f64) -> f64 {
    let ss_tot: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let ss_res: f64 = y
        .iter()
        .zip(predictions)
        .map(|(v, p)| (v - p).powi(2))
        .sum();

    if ss_tot > 1e-10 {
        1.0 - ss_res / ss_tot
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_fit_exact_linear_relationship() {
        // y = 3 + 2a - b
        let x = vec![
            vec![1.0, 0.0],
            vec![2.0, 1.0],
            vec![3.0, 5.0],
            vec![4.0, 2.0],
            vec![5.0, 3.0],
        ];
        let y: Vec<f64> = x.iter().map(|r| 3.0 + 2.0 * r[0] - r[1]).collect();

        let model = LinearRegressionModel::fit(&x, &y).unwrap();

        assert_close(model.intercept, 3.0);
        assert_close(model.coefficients[0], 2.0);
        assert_close(model.coefficients[1], -1.0);
        assert_close(model.summary.r_squared, 1.0);
        assert_close(model.summary.mean_absolute_error, 0.0);
        assert_eq!(model.summary.samples, 5);
        assert_eq!(model.summary.feature_count, 2);
        assert_close(model.predict(&[10.0, 4.0]).unwrap(), 19.0);
    }

    #[test]
    fn test_fit_collinear_one_hot_columns() {
        // Two one-hot columns that always sum to one: the design is rank
        // deficient but group means are still reproduced.
        let x = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ];
        let y = vec![10.0, 12.0, 30.0, 32.0];

        let model = LinearRegressionModel::fit(&x, &y).unwrap();

        assert_close(model.predict(&[1.0, 0.0]).unwrap(), 11.0);
        assert_close(model.predict(&[0.0, 1.0]).unwrap(), 31.0);
        // Minimum-norm solution splits the contrast symmetrically
        assert_close(model.coefficients[0], -model.coefficients[1]);
    }

    #[test]
    fn test_fit_more_features_than_samples() {
        let x = vec![vec![1.0, 0.0, 1.0, 3.0], vec![0.0, 1.0, 1.0, 7.0]];
        let y = vec![5.0, 9.0];

        let model = LinearRegressionModel::fit(&x, &y).unwrap();

        assert_close(model.predict(&x[0]).unwrap(), 5.0);
        assert_close(model.predict(&x[1]).unwrap(), 9.0);
    }

    #[test]
    fn test_fit_single_sample_predicts_its_label() {
        let model = LinearRegressionModel::fit(&[vec![4.0, 1.0]], &[17.0]).unwrap();

        assert_close(model.intercept, 17.0);
        assert!(model.coefficients.iter().all(|c| *c == 0.0));
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        let err = LinearRegressionModel::fit(&[], &[]).unwrap_err();
        assert!(matches!(err, EstimatorError::Fit(_)));
    }

    #[test]
    fn test_fit_rejects_ragged_rows() {
        let err = LinearRegressionModel::fit(&[vec![1.0, 2.0], vec![1.0]], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            EstimatorError::SchemaMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_predict_checks_width() {
        let model = LinearRegressionModel::fit(&[vec![1.0], vec![2.0]], &[1.0, 2.0]).unwrap();

        assert!(model.predict(&[1.0, 2.0]).is_err());
        assert_eq!(model.model_type(), "Linear Regression");
    }

    #[test]
    fn test_model_serialization() {
        let model = LinearRegressionModel::fit(&[vec![1.0], vec![2.0], vec![4.0]], &[2.0, 4.0, 8.0]).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: LinearRegressionModel = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.coefficients.len(), 1);
        assert_close(restored.predict(&[3.0]).unwrap(), 6.0);
    }
}
