//! Artifact store for the trained model and preprocessing info

use crate::config::ArtifactsConfig;
use crate::error::{EstimatorError, Result};
use crate::models::regression::LinearRegressionModel;
use crate::types::preprocessing::PreprocessingInfo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory-backed store for the two training artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    model_file: String,
    preprocessing_file: String,
}

impl ArtifactStore {
    /// Store with the default file names
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            model_file: "visa_processing_model.json".to_string(),
            preprocessing_file: "preprocessing_info.json".to_string(),
        }
    }

    /// Create a store from the artifacts configuration
    pub fn from_config(config: &ArtifactsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            model_file: config.model_file.clone(),
            preprocessing_file: config.preprocessing_file.clone(),
        }
    }

    /// Get the model artifact path
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    /// Get the preprocessing artifact path
    pub fn preprocessing_path(&self) -> PathBuf {
        self.dir.join(&self.preprocessing_file)
    }

    /// Whether both artifacts are present
    pub fn exists(&self) -> bool {
        self.model_path().is_file() && self.preprocessing_path().is_file()
    }

    /// Persist both artifacts.
    ///
    /// Each file is written to a temporary sibling and renamed into place,
    /// so a concurrent reader sees either the old or the new artifact.
    pub fn save(&self, model: &LinearRegressionModel, info: &PreprocessingInfo) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        write_json_atomic(&self.model_path(), model)?;
        write_json_atomic(&self.preprocessing_path(), info)?;

        info!(
            dir = %self.dir.display(),
            features = info.feature_count(),
            "Artifacts saved"
        );
        Ok(())
    }

    /// Load both artifacts.
    ///
    /// Fails with [`EstimatorError::MissingArtifact`] naming the first
    /// absent file.
    pub fn load(&self) -> Result<(LinearRegressionModel, PreprocessingInfo)> {
        let model_path = self.model_path();
        let preprocessing_path = self.preprocessing_path();

        for path in [&model_path, &preprocessing_path] {
            if !path.is_file() {
                return Err(EstimatorError::MissingArtifact { path: path.clone() });
            }
        }

        let model: LinearRegressionModel = read_json(&model_path)?;
        let info: PreprocessingInfo = read_json(&preprocessing_path)?;

        if model.feature_count() != info.feature_count() {
            return Err(EstimatorError::SchemaMismatch {
                expected: info.feature_count(),
                actual: model.feature_count(),
            });
        }

        info!(
            model = %model_path.display(),
            preprocessing = %preprocessing_path.display(),
            features = info.feature_count(),
            "Artifacts loaded"
        );

        Ok((model, info))
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn artifacts() -> (LinearRegressionModel, PreprocessingInfo) {
        let model = LinearRegressionModel::fit(
            &[vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 25.0]],
            &[5.0, 8.0, 12.0],
        )
        .unwrap();
        let info = PreprocessingInfo {
            feature_names: vec!["application_month".to_string(), "country_avg".to_string()],
            country_avg: BTreeMap::from([("India".to_string(), 20.0)]),
            visa_avg: BTreeMap::new(),
            office_map: BTreeMap::from([("India".to_string(), "New Delhi".to_string())]),
            mean_processing_days: 8.3,
        };
        (model, info)
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("models"));
        let (model, info) = artifacts();

        assert!(!store.exists());
        store.save(&model, &info).unwrap();
        assert!(store.exists());
        assert!(!store.model_path().with_extension("json.tmp").exists());

        let (loaded_model, loaded_info) = store.load().unwrap();
        assert_eq!(loaded_info, info);
        assert_eq!(loaded_model.coefficients, model.coefficients);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.load().unwrap_err();
        assert!(err.is_missing_artifact());
        match err {
            EstimatorError::MissingArtifact { path } => assert_eq!(path, store.model_path()),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_preprocessing_info_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (model, info) = artifacts();
        store.save(&model, &info).unwrap();
        fs::remove_file(store.preprocessing_path()).unwrap();

        match store.load().unwrap_err() {
            EstimatorError::MissingArtifact { path } => {
                assert_eq!(path, store.preprocessing_path())
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_rejects_mismatched_widths() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (model, mut info) = artifacts();
        info.feature_names.push("visa_avg".to_string());
        store.save(&model, &info).unwrap();

        match store.load().unwrap_err() {
            EstimatorError::SchemaMismatch { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_fit_summary_survives_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (mut model, info) = artifacts();
        model.summary.rows_dropped = 4;
        store.save(&model, &info).unwrap();

        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded.summary.samples, 3);
        assert_eq!(loaded.summary.rows_dropped, 4);
        assert_eq!(loaded.summary.feature_count, 2);
        assert_eq!(loaded.summary.trained_at, model.summary.trained_at);
    }

    #[test]
    fn test_from_config_uses_file_names() {
        let config = ArtifactsConfig {
            dir: "/srv/artifacts".to_string(),
            model_file: "model.json".to_string(),
            preprocessing_file: "prep.json".to_string(),
        };
        let store = ArtifactStore::from_config(&config);

        assert_eq!(store.model_path(), PathBuf::from("/srv/artifacts/model.json"));
        assert_eq!(store.preprocessing_path(), PathBuf::from("/srv/artifacts/prep.json"));
    }
}
