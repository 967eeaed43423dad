//! Historical application dataset loading and cleaning
//!
//! Reads CSV files with `application_date`, `decision_date`, `country` and
//! `visa_type` columns, fills missing values and derives the
//! processing-days label.

use crate::error::{EstimatorError, Result};
use crate::feature_extractor::clean_category;
use crate::types::application::{parse_date, ApplicationRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Raw historical applications
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ApplicationRecord>,
}

/// A training row after missing-value imputation
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub application_date: Option<NaiveDate>,
    pub decision_date: Option<NaiveDate>,
    pub country: String,
    pub visa_type: String,
    /// Decision minus application date; `None` when missing or negative
    pub processing_days: Option<i64>,
}

impl Dataset {
    /// Create a dataset from already-parsed records
    pub fn new(records: Vec<ApplicationRecord>) -> Self {
        Self { records }
    }

    /// Load a dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            EstimatorError::Dataset(format!("cannot open {}: {}", path.display(), e))
        })?;

        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            "Loaded training dataset"
        );
        Ok(dataset)
    }

    /// Load a dataset from any CSV reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let records = csv_reader
            .deserialize::<ApplicationRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { records })
    }

    /// Get the raw records
    pub fn records(&self) -> &[ApplicationRecord] {
        &self.records
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Impute missing values and compute labels.
    ///
    /// Missing or unparsable dates take the most frequent date of their
    /// column (earliest date on ties). Missing categories become "Unknown".
    /// Negative processing times are kept as missing labels.
    pub fn clean(&self) -> Vec<CleanRecord> {
        let application_dates: Vec<Option<NaiveDate>> = self
            .records
            .iter()
            .map(|r| r.application_date.as_deref().and_then(parse_date))
            .collect();
        let decision_dates: Vec<Option<NaiveDate>> = self
            .records
            .iter()
            .map(|r| r.decision_date.as_deref().and_then(parse_date))
            .collect();

        let application_mode = modal_date(&application_dates);
        let decision_mode = modal_date(&decision_dates);

        debug!(
            application_mode = ?application_mode,
            decision_mode = ?decision_mode,
            "Imputing missing dates"
        );

        self.records
            .iter()
            .zip(application_dates)
            .zip(decision_dates)
            .map(|((record, application_date), decision_date)| {
                let application_date = application_date.or(application_mode);
                let decision_date = decision_date.or(decision_mode);

                CleanRecord {
                    application_date,
                    decision_date,
                    country: clean_category(record.country.as_deref()),
                    visa_type: clean_category(record.visa_type.as_deref()),
                    processing_days: processing_days(application_date, decision_date),
                }
            })
            .collect()
    }
}

/// Days between application and decision; negative spans are invalid.
pub fn processing_days(
    application_date: Option<NaiveDate>,
    decision_date: Option<NaiveDate>,
) -> Option<i64> {
    let days = (decision_date? - application_date?).num_days();
    (days >= 0).then_some(days)
}

/// Most frequent date, earliest first on ties.
pub fn modal_date(dates: &[Option<NaiveDate>]) -> Option<NaiveDate> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in dates.iter().flatten() {
        *counts.entry(*date).or_insert(0) += 1;
    }

    // BTreeMap iterates ascending, so keeping only strictly larger counts
    // leaves the earliest of the tied dates.
    let mut best: Option<(NaiveDate, usize)> = None;
    for (date, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((date, count));
        }
    }
    best.map(|(date, _)| date)
}
