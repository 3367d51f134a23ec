use std::path::PathBuf;

use thiserror::Error;

/// Configuration and I/O failures. All of them end the current invocation.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Column {0} doesn't exist.")]
    UnknownColumn(String),

    #[error("Learning rate should be greater than 0 and at most 1 (got {0}).")]
    LearningRate(f64),

    #[error("Accuracy split should be between 0.01 and 0.99 (got {0}).")]
    AccuracySplit(f64),

    #[error("Feature column name {0} is reserved for the bias weight.")]
    ReservedFeature(String),

    #[error("Column {0} has no mean to replace missing values with.")]
    NoFeatureMean(String),

    #[error("No labelled rows available for training.")]
    EmptyTrainingSet,

    #[error("Model file {} doesn't exist.", .0.display())]
    MissingModel(PathBuf),

    #[error("Invalid model file {}: {}", .path.display(), .source)]
    InvalidModel {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MlError>;
