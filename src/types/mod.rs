//! Type definitions for the visa processing estimator

pub mod application;
pub mod prediction;
pub mod preprocessing;

pub use application::{parse_date, ApplicationRecord, PredictionRequest};
pub use prediction::{PredictionReply, PredictionResult, ReplyError, ReplyStatus};
pub use preprocessing::PreprocessingInfo;
