//! Preprocessing info artifact

use crate::feature_extractor::UNKNOWN;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of everything needed to reproduce the training-time encoding.
///
/// Produced once by the trainer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingInfo {
    /// Exact column layout the model was fitted on
    pub feature_names: Vec<String>,
    /// Mean processing days per country
    pub country_avg: BTreeMap<String, f64>,
    /// Mean processing days per visa type
    pub visa_avg: BTreeMap<String, f64>,
    /// Country to processing office
    pub office_map: BTreeMap<String, String>,
    /// Global mean, used for categories without history
    pub mean_processing_days: f64,
}

impl PreprocessingInfo {
    /// Get the number of feature columns
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Average processing days for a country, or the global mean if unseen
    pub fn country_average(&self, country: &str) -> f64 {
        self.country_avg
            .get(country)
            .copied()
            .unwrap_or(self.mean_processing_days)
    }

    /// Average processing days for a visa type, or the global mean if unseen
    pub fn visa_average(&self, visa_type: &str) -> f64 {
        self.visa_avg
            .get(visa_type)
            .copied()
            .unwrap_or(self.mean_processing_days)
    }

    /// Office for a country; unmapped countries resolve to "Unknown".
    pub fn office_for(&self, country: &str) -> &str {
        self.office_map
            .get(country)
            .map(String::as_str)
            .unwrap_or(UNKNOWN)
    }

    /// Countries with historical averages, sorted
    pub fn countries(&self) -> Vec<&str> {
        self.country_avg.keys().map(String::as_str).collect()
    }

    /// Visa types with historical averages, sorted
    pub fn visa_types(&self) -> Vec<&str> {
        self.visa_avg.keys().map(String::as_str).collect()
    }
}
