//! Regression model collaborator: the `Predictor` seam and the XGBoost JSON evaluator behind it.

use std::path::{Path, PathBuf};

use thiserror::Error;

mod xgboost;

pub use xgboost::XgboostModel;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("failed to read model file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse model json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported booster '{0}': only gbtree and dart models can be evaluated")]
    UnsupportedBooster(String),
    #[error("unsupported objective '{0}'")]
    UnsupportedObjective(String),
    #[error("invalid tree {tree}: {reason}")]
    InvalidTree { tree: usize, reason: String },
    #[error("expected {expected} features per row, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
    #[error("predictor returned no output")]
    EmptyOutput,
}

/// A loaded model. Shared read-only across requests, so implementations must be `Send + Sync`.
pub trait Predictor: Send + Sync {
    /// Scores each row, returning one value per row in input order.
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>, PredictorError>;
}

pub fn load_predictor(path: &Path) -> Result<XgboostModel, PredictorError> {
    XgboostModel::from_path(path)
}
