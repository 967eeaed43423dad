//! Feature extraction for visa processing time estimation.
//!
//! Training mode derives the column schema and per-category statistics from
//! the cleaned dataset. Inference mode encodes a single request against the
//! schema stored in [`PreprocessingInfo`], so the vector layout always
//! matches the one the model was fitted on.

use crate::dataset::CleanRecord;
use crate::types::application::{parse_date, PredictionRequest};
use crate::types::preprocessing::PreprocessingInfo;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Fallback category value
pub const UNKNOWN: &str = "Unknown";

pub const APPLICATION_MONTH: &str = "application_month";
pub const COUNTRY_AVG: &str = "country_avg";
pub const VISA_AVG: &str = "visa_avg";

pub const COUNTRY_FIELD: &str = "country";
pub const VISA_TYPE_FIELD: &str = "visa_type";
pub const SEASON_FIELD: &str = "season";
pub const OFFICE_FIELD: &str = "processing_office";

/// Months with peak application volume
pub const PEAK_MONTHS: [u32; 3] = [1, 2, 12];

/// Trim a category value; blank or missing values become [`UNKNOWN`].
pub fn clean_category(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Known processing offices, keyed by country
const OFFICES: [(&str, &str); 10] = [
    ("India", "New Delhi"),
    ("United States", "Washington DC"),
    ("United Kingdom", "London"),
    ("Canada", "Ottawa"),
    ("Australia", "Canberra"),
    ("Germany", "Berlin"),
    ("France", "Paris"),
    ("Japan", "Tokyo"),
    ("Brazil", "Brasilia"),
    (UNKNOWN, UNKNOWN),
];

/// Application season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Peak")]
    Peak,
    #[serde(rename = "Off-Peak")]
    OffPeak,
}

impl Season {
    /// Peak for January, February and December; Off-Peak otherwise.
    pub fn from_month(month: u32) -> Self {
        if PEAK_MONTHS.contains(&month) {
            Season::Peak
        } else {
            Season::OffPeak
        }
    }

    /// Get the label used in column names and replies
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Peak => "Peak",
            Season::OffPeak => "Off-Peak",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing office for a country from the built-in mapping.
pub fn office_for_country(country: &str) -> &'static str {
    OFFICES
        .iter()
        .find(|(c, _)| *c == country)
        .map(|(_, office)| *office)
        .unwrap_or(UNKNOWN)
}

/// The built-in country to office mapping
pub fn default_office_map() -> BTreeMap<String, String> {
    OFFICES
        .iter()
        .map(|(country, office)| (country.to_string(), office.to_string()))
        .collect()
}

/// One-hot column name for a category value, e.g. `country_India`.
pub fn indicator_name(field: &str, value: &str) -> String {
    format!("{}_{}", field, value)
}

/// Column name to position lookup over a fixed schema.
#[derive(Debug, Clone)]
struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(feature_names: &[String]) -> Self {
        let positions = feature_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { positions }
    }

    /// Write `value` into the named column. Returns false when the schema has
    /// no such column, which leaves the row untouched.
    fn set(&self, row: &mut [f64], column: &str, value: f64) -> bool {
        match self.positions.get(column) {
            Some(&i) => {
                row[i] = value;
                true
            }
            None => false,
        }
    }

    fn set_indicator(&self, row: &mut [f64], field: &str, value: &str) -> bool {
        self.set(row, &indicator_name(field, value), 1.0)
    }
}

/// Engineered attributes of one application, before encoding.
#[derive(Debug, Clone, PartialEq)]
struct EngineeredRow<'a> {
    /// 0 when the application date is unknown
    month: u32,
    country_avg: f64,
    visa_avg: f64,
    country: &'a str,
    visa_type: &'a str,
    season: Season,
    office: &'a str,
}

/// Encode engineered attributes into a zero-initialized row over the schema.
///
/// Shared by training and inference so both produce identical layouts.
fn encode(index: &ColumnIndex, width: usize, row: &EngineeredRow<'_>) -> (Vec<f64>, bool, bool) {
    let mut values = vec![0.0; width];

    index.set(&mut values, APPLICATION_MONTH, f64::from(row.month));
    index.set(&mut values, COUNTRY_AVG, row.country_avg);
    index.set(&mut values, VISA_AVG, row.visa_avg);

    let country_seen = index.set_indicator(&mut values, COUNTRY_FIELD, row.country);
    let visa_seen = index.set_indicator(&mut values, VISA_TYPE_FIELD, row.visa_type);
    index.set_indicator(&mut values, SEASON_FIELD, row.season.as_str());
    index.set_indicator(&mut values, OFFICE_FIELD, row.office);

    (values, country_seen, visa_seen)
}

/// Feature matrix produced in training mode
#[derive(Debug, Clone)]
pub struct TrainingMatrix {
    /// Column order of `rows`
    pub feature_names: Vec<String>,
    /// One encoded row per cleaned record, labeled or not
    pub rows: Vec<Vec<f64>>,
    /// Processing days per row; `None` rows cannot supervise the model
    pub labels: Vec<Option<f64>>,
    pub country_avg: BTreeMap<String, f64>,
    pub visa_avg: BTreeMap<String, f64>,
    pub office_map: BTreeMap<String, String>,
}

impl TrainingMatrix {
    /// Rows with a valid label, paired with their targets
    pub fn labeled(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        self.rows
            .iter()
            .zip(&self.labels)
            .filter_map(|(row, label)| label.map(|y| (row.clone(), y)))
            .unzip()
    }

    /// Number of rows without a valid label
    pub fn unlabeled_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }
}

/// Mean of valid labels per category
fn category_means<'a>(pairs: impl Iterator<Item = (&'a str, Option<i64>)>) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (category, label) in pairs {
        if let Some(days) = label {
            let entry = sums.entry(category.to_string()).or_insert((0.0, 0));
            entry.0 += days as f64;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(category, (sum, count))| (category, sum / count as f64))
        .collect()
}

/// Build the training matrix from cleaned records.
///
/// `mean_processing_days` is the global mean of valid labels and stands in
/// for categories that have no labeled history.
///
/// Columns: `application_month`, `country_avg`, `visa_avg`, then one-hot
/// blocks for country, visa type, season and processing office, each block
/// sorted by value. One-hot columns cover every record, including records
/// whose label is missing.
pub fn build_training_matrix(records: &[CleanRecord], mean_processing_days: f64) -> TrainingMatrix {
    let office_map = default_office_map();

    let country_avg = category_means(records.iter().map(|r| (r.country.as_str(), r.processing_days)));
    let visa_avg = category_means(records.iter().map(|r| (r.visa_type.as_str(), r.processing_days)));

    let engineered: Vec<EngineeredRow<'_>> = records
        .iter()
        .map(|record| {
            let month = record.application_date.map_or(0, |d| d.month());
            EngineeredRow {
                month,
                country_avg: country_avg
                    .get(&record.country)
                    .copied()
                    .unwrap_or(mean_processing_days),
                visa_avg: visa_avg
                    .get(&record.visa_type)
                    .copied()
                    .unwrap_or(mean_processing_days),
                country: &record.country,
                visa_type: &record.visa_type,
                season: Season::from_month(month),
                office: office_for_country(&record.country),
            }
        })
        .collect();

    let mut countries = BTreeSet::new();
    let mut visa_types = BTreeSet::new();
    let mut seasons = BTreeSet::new();
    let mut offices = BTreeSet::new();
    for row in &engineered {
        countries.insert(row.country);
        visa_types.insert(row.visa_type);
        seasons.insert(row.season.as_str());
        offices.insert(row.office);
    }

    let mut feature_names = vec![
        APPLICATION_MONTH.to_string(),
        COUNTRY_AVG.to_string(),
        VISA_AVG.to_string(),
    ];
    for (field, values) in [
        (COUNTRY_FIELD, &countries),
        (VISA_TYPE_FIELD, &visa_types),
        (SEASON_FIELD, &seasons),
        (OFFICE_FIELD, &offices),
    ] {
        feature_names.extend(values.iter().map(|value| indicator_name(field, value)));
    }

    let index = ColumnIndex::new(&feature_names);
    let rows = engineered
        .iter()
        .map(|row| encode(&index, feature_names.len(), row).0)
        .collect();
    let labels = records
        .iter()
        .map(|r| r.processing_days.map(|d| d as f64))
        .collect();

    debug!(
        features = feature_names.len(),
        countries = countries.len(),
        visa_types = visa_types.len(),
        "Built training feature matrix"
    );

    TrainingMatrix {
        feature_names,
        rows,
        labels,
        country_avg,
        visa_avg,
        office_map,
    }
}

/// Features extracted for one prediction request
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFeatures {
    /// Row in `feature_names` order
    pub values: Vec<f64>,
    /// Date actually used, after fallback
    pub application_date: NaiveDate,
    pub season: Season,
    pub processing_office: String,
}

/// Resolve a request date, substituting `today` when it cannot be parsed.
pub fn resolve_application_date(raw: &str, today: NaiveDate) -> NaiveDate {
    parse_date(raw).unwrap_or_else(|| {
        warn!(
            application_date = %raw,
            fallback = %today,
            "Unparsable application date, using current date"
        );
        today
    })
}

/// Feature extractor that encodes requests against a trained schema.
///
/// The column index is built once; extraction never adds or reorders
/// columns, and categories unseen at training time encode as all-zero
/// indicators.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    info: PreprocessingInfo,
    index: ColumnIndex,
}

impl FeatureExtractor {
    /// Create an extractor over the schema captured at training time.
    pub fn new(info: PreprocessingInfo) -> Self {
        let index = ColumnIndex::new(&info.feature_names);
        Self { info, index }
    }

    /// Extract features from a request.
    ///
    /// Returns exactly one row whose length and order equal
    /// `feature_names`.
    pub fn extract(&self, request: &PredictionRequest, today: NaiveDate) -> ExtractedFeatures {
        let application_date = resolve_application_date(&request.application_date, today);
        let month = application_date.month();
        let season = Season::from_month(month);

        // Categories are matched the way the training rows were cleaned
        let country = clean_category(Some(request.country.as_str()));
        let visa_type = clean_category(Some(request.visa_type.as_str()));

        let office = request
            .processing_office
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| self.info.office_for(&country));

        let row = EngineeredRow {
            month,
            country_avg: self.info.country_average(&country),
            visa_avg: self.info.visa_average(&visa_type),
            country: &country,
            visa_type: &visa_type,
            season,
            office,
        };

        let (values, country_seen, visa_seen) = encode(&self.index, self.feature_count(), &row);

        if !country_seen {
            debug!(country = %country, "Country unseen at training time");
        }
        if !visa_seen {
            debug!(visa_type = %visa_type, "Visa type unseen at training time");
        }

        ExtractedFeatures {
            values,
            application_date,
            season,
            processing_office: office.to_string(),
        }
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.info.feature_names.len()
    }

    /// Get feature names in model order.
    pub fn feature_names(&self) -> &[String] {
        &self.info.feature_names
    }

    /// Get the preprocessing info backing this extractor
    pub fn preprocessing(&self) -> &PreprocessingInfo {
        &self.info
    }
}
