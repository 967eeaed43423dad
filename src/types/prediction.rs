//! Prediction result and service reply structures

use crate::error::{ErrorKind, EstimatorError};
use crate::feature_extractor::Season;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a single prediction, echoed back with its derived context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Estimated processing time in days, clamped at zero and rounded to 0.1
    pub predicted_days: f64,

    /// Application date as supplied by the caller
    pub application_date: String,

    pub country: String,

    pub visa_type: String,

    /// Season derived from the application month
    pub season: Season,

    /// Office expected to handle the application
    pub processing_office: String,

    /// Display label of the fitted model family
    pub model_type: String,
}

/// Reply status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// Error payload returned to service callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&EstimatorError> for ReplyError {
    fn from(error: &EstimatorError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Envelope published by the prediction service for every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReply {
    /// Unique reply identifier
    pub prediction_id: String,

    pub status: ReplyStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PredictionResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,

    /// Reply generation timestamp
    pub generated_at: DateTime<Utc>,
}

impl PredictionReply {
    /// Successful reply carrying a prediction
    pub fn ok(result: PredictionResult) -> Self {
        Self {
            prediction_id: Uuid::new_v4().to_string(),
            status: ReplyStatus::Ok,
            result: Some(result),
            error: None,
            generated_at: Utc::now(),
        }
    }

    /// Failed reply
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            prediction_id: Uuid::new_v4().to_string(),
            status: ReplyStatus::Error,
            result: None,
            error: Some(ReplyError {
                kind,
                message: message.into(),
            }),
            generated_at: Utc::now(),
        }
    }

    /// Create an error reply classified from an estimator error
    pub fn from_error(error: &EstimatorError) -> Self {
        let payload = ReplyError::from(error);
        Self::error(payload.kind, payload.message)
    }

    /// Check if the reply carries a prediction
    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}
