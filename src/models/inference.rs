//! Prediction over the trained artifacts

use crate::error::Result;
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::ArtifactStore;
use crate::models::regression::{LinearRegressionModel, Regressor};
use crate::types::application::PredictionRequest;
use crate::types::prediction::PredictionResult;
use crate::types::preprocessing::PreprocessingInfo;
use chrono::{Local, NaiveDate};
use tracing::debug;

/// Clamp a raw model output at zero and round to one decimal place.
///
/// Rounding works on the exact binary value with ties to even, so `0.15`
/// (stored just below the midpoint) becomes `0.1` and `0.25` becomes `0.2`.
pub fn clamp_days(raw: f64) -> f64 {
    let clamped = raw.max(0.0);
    format!("{:.1}", clamped).parse().unwrap_or(clamped)
}

/// Immutable handle over a fitted model and its preprocessing info.
///
/// Holds no mutable state, so one instance can be shared behind an `Arc`
/// by any number of concurrent callers.
pub struct Predictor<M = LinearRegressionModel> {
    model: M,
    extractor: FeatureExtractor,
}

impl Predictor<LinearRegressionModel> {
    /// Load both artifacts from the store.
    ///
    /// Returns [`crate::EstimatorError::MissingArtifact`] when either file is
    /// absent; callers should ask the operator to run training.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let (model, info) = store.load()?;
        Ok(Self::new(model, info))
    }
}

impl<M: Regressor> Predictor<M> {
    /// Create a predictor from a fitted model and its preprocessing info
    pub fn new(model: M, info: PreprocessingInfo) -> Self {
        Self {
            model,
            extractor: FeatureExtractor::new(info),
        }
    }

    /// Get the preprocessing info the predictor encodes against
    pub fn preprocessing(&self) -> &PreprocessingInfo {
        self.extractor.preprocessing()
    }

    /// Get the model family label
    pub fn model_type(&self) -> &str {
        self.model.model_type()
    }

    /// Predict processing days for an application date, country and visa type.
    pub fn predict_days(
        &self,
        application_date: &str,
        country: &str,
        visa_type: &str,
    ) -> Result<PredictionResult> {
        self.predict(&PredictionRequest::new(application_date, country, visa_type))
    }

    /// Predict for a request, resolving unparsable dates to today.
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        self.predict_on(request, Local::now().date_naive())
    }

    /// Predict with an explicit fallback date for unparsable input.
    pub fn predict_on(&self, request: &PredictionRequest, today: NaiveDate) -> Result<PredictionResult> {
        let features = self.extractor.extract(request, today);
        let raw = self.model.predict(&features.values)?;
        let predicted_days = clamp_days(raw);

        debug!(
            country = %request.country,
            visa_type = %request.visa_type,
            season = %features.season,
            raw_prediction = raw,
            predicted_days,
            "Prediction complete"
        );

        Ok(PredictionResult {
            predicted_days,
            application_date: request.application_date.clone(),
            country: request.country.clone(),
            visa_type: request.visa_type.clone(),
            season: features.season,
            processing_office: features.processing_office,
            model_type: self.model.model_type().to_string(),
        })
    }
}
