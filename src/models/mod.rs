//! Model training, persistence and inference

pub mod inference;
pub mod loader;
pub mod regression;
pub mod trainer;

pub use inference::Predictor;
pub use loader::ArtifactStore;
pub use regression::{LinearRegressionModel, Regressor};
pub use trainer::Trainer;
