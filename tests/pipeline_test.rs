//! End-to-end tests: train, persist, reload and predict.

use chrono::NaiveDate;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};
use visa_processing_estimator::{
    ArtifactStore, Dataset, ErrorKind, EstimatorError, PredictionRequest, Predictor, Season,
    Trainer,
};

const HISTORY: &str = "\
application_date,decision_date,country,visa_type
2024-01-01,2024-02-01,India,Student
2024-01-20,2024-02-28,India,Work
2024-02-15,2024-03-20,United States,Tourist
2024-03-03,2024-03-30,Canada,Tourist
2024-05-12,2024-06-20,Australia,Student
2024-06-01,2024-06-25,Germany,Work
2024-07-02,2024-08-05,France,Tourist
2024-08-10,2024-10-01,Brazil,Work
2024-11-05,2024-12-19,Japan,Student
2024-12-01,2025-01-10,United Kingdom,Work
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn train_and_save(csv: &str, dir: &Path) -> ArtifactStore {
    let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
    let artifacts = Trainer::new().train(&dataset).unwrap();

    let store = ArtifactStore::new(dir);
    store.save(&artifacts.model, &artifacts.preprocessing).unwrap();
    store
}

#[test]
fn test_train_save_load_predict() {
    let dir = tempdir().unwrap();
    let store = train_and_save(HISTORY, dir.path());
    assert!(store.exists());

    let predictor = Predictor::load(&store).unwrap();
    let request = PredictionRequest::new("2024-01-15", "India", "Student");

    let result = predictor.predict_on(&request, today()).unwrap();

    assert_eq!(result.season, Season::Peak);
    assert_eq!(result.processing_office, "New Delhi");
    assert_eq!(result.model_type, "Linear Regression");
    assert!(result.predicted_days >= 0.0);
    assert_eq!(result.predicted_days, (result.predicted_days * 10.0).round() / 10.0);
}

#[test]
fn test_unseen_country_is_answered() {
    let dir = tempdir().unwrap();
    let store = train_and_save(HISTORY, dir.path());
    let predictor = Predictor::load(&store).unwrap();

    let request = PredictionRequest::new("2024-05-01", "Atlantis", "Diplomatic");
    let result = predictor.predict_on(&request, today()).unwrap();

    assert_eq!(result.processing_office, "Unknown");
    assert_eq!(result.season, Season::OffPeak);
    assert!(result.predicted_days >= 0.0);
}

#[test]
fn test_reloaded_predictor_matches() {
    let dir = tempdir().unwrap();
    let store = train_and_save(HISTORY, dir.path());

    let first = Predictor::load(&store).unwrap();
    let second = Predictor::load(&store).unwrap();
    let request = PredictionRequest::new("2024-12-03", "Germany", "Work");

    let a = first.predict_on(&request, today()).unwrap();
    let b = first.predict_on(&request, today()).unwrap();
    let c = second.predict_on(&request, today()).unwrap();

    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn test_unparsable_date_uses_fallback() {
    let dir = tempdir().unwrap();
    let store = train_and_save(HISTORY, dir.path());
    let predictor = Predictor::load(&store).unwrap();

    let garbage = PredictionRequest::new("next tuesday", "France", "Tourist");
    let explicit = PredictionRequest::new("2024-06-10", "France", "Tourist");

    let a = predictor.predict_on(&garbage, today()).unwrap();
    let b = predictor.predict_on(&explicit, today()).unwrap();

    assert_eq!(a.predicted_days, b.predicted_days);
    assert_eq!(a.application_date, "next tuesday");
}

#[test]
fn test_missing_artifacts() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());

    let err = match Predictor::load(&store) {
        Ok(_) => panic!("loading from an empty directory should fail"),
        Err(e) => e,
    };

    assert!(err.is_missing_artifact());
    assert_eq!(err.kind(), ErrorKind::MissingArtifact);
}

#[test]
fn test_no_valid_labels() {
    let csv = "\
application_date,decision_date,country,visa_type
2024-03-01,2024-02-01,India,Student
2024-05-10,2024-05-01,France,Work
";
    let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();

    let err = Trainer::new().train(&dataset).unwrap_err();

    assert!(matches!(err, EstimatorError::EmptyTrainingSet { .. }));
    assert_eq!(err.kind(), ErrorKind::EmptyTrainingSet);
}

#[test]
fn test_train_from_csv_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(HISTORY.as_bytes()).unwrap();

    let dataset = Dataset::from_csv(file.path()).unwrap();
    assert_eq!(dataset.len(), 10);

    let artifacts = Trainer::new().train(&dataset).unwrap();
    assert_eq!(artifacts.report.rows_used, 10);
    assert_eq!(artifacts.report.rows_dropped, 0);
}

#[test]
fn test_bundled_sample_dataset() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample_applications.csv");
    let dataset = Dataset::from_csv(path).unwrap();

    let artifacts = Trainer::new().train(&dataset).unwrap();

    assert_eq!(artifacts.report.rows_read, 10);
    assert!(artifacts.report.rows_used > 0);
    assert_eq!(
        artifacts.report.rows_used + artifacts.report.rows_dropped,
        artifacts.report.rows_read
    );

    let names = &artifacts.preprocessing.feature_names;
    assert_eq!(names[0], "application_month");
    assert_eq!(names[1], "country_avg");
    assert_eq!(names[2], "visa_avg");
    assert!(names.contains(&"country_Unknown".to_string()));
    assert!(names.contains(&"visa_type_Unknown".to_string()));
}

#[test]
fn test_missing_dataset_file() {
    let dir = tempdir().unwrap();
    let err = Dataset::from_csv(dir.path().join("nope.csv")).unwrap_err();

    assert!(matches!(err, EstimatorError::Dataset(_)));
}
