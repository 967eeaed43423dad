//! Visa application data structures

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One historical visa application as read from the training dataset.
///
/// Every field may be missing; cleaning happens in [`crate::dataset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// Date the application was filed
    #[serde(default, alias = "Application_Date")]
    pub application_date: Option<String>,

    /// Date a decision was issued (label source)
    #[serde(default, alias = "Decision_Date")]
    pub decision_date: Option<String>,

    /// Country of application
    #[serde(default, alias = "Country")]
    pub country: Option<String>,

    /// Visa category (Student, Tourist, Work, ...)
    #[serde(default, alias = "Visa_Type")]
    pub visa_type: Option<String>,
}

impl ApplicationRecord {
    /// Create a record from optional raw values
    pub fn new(
        application_date: Option<&str>,
        decision_date: Option<&str>,
        country: Option<&str>,
        visa_type: Option<&str>,
    ) -> Self {
        Self {
            application_date: application_date.map(str::to_string),
            decision_date: decision_date.map(str::to_string),
            country: country.map(str::to_string),
            visa_type: visa_type.map(str::to_string),
        }
    }
}

/// A single prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Application date as a date string (ISO 8601 preferred)
    pub application_date: String,

    pub country: String,

    pub visa_type: String,

    /// Explicit processing office, overriding the country mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_office: Option<String>,
}

impl PredictionRequest {
    /// Create a new prediction request
    pub fn new(
        application_date: impl Into<String>,
        country: impl Into<String>,
        visa_type: impl Into<String>,
    ) -> Self {
        Self {
            application_date: application_date.into(),
            country: country.into(),
            visa_type: visa_type.into(),
            processing_office: None,
        }
    }

    /// Override the processing office derived from the country
    pub fn with_processing_office(mut self, office: impl Into<String>) -> Self {
        self.processing_office = Some(office.into());
        self
    }
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and
/// RFC 3339 timestamps. Returns `None` for blank or malformed input.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|datetime| datetime.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        assert_eq!(parse_date("2024-01-15"), Some(expected));
        assert_eq!(parse_date(" 2024-01-15 "), Some(expected));
        assert_eq!(parse_date("2024-01-15 08:30:00"), Some(expected));
        assert_eq!(parse_date("2024-01-15T08:30:00"), Some(expected));
        assert_eq!(parse_date("2024-01-15T08:30:00+02:00"), Some(expected));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"application_date":"2024-01-15","country":"India","visa_type":"Student"}"#;
        let request: PredictionRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.country, "India");
        assert_eq!(request.processing_office, None);

        let request = request.with_processing_office("Mumbai");
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"processing_office\":\"Mumbai\""));
    }
}
