//! Feature matrix assembly, one-vs-all logistic regression and the model artifact.

pub mod artifact;
pub mod classifier;
pub mod matrix;
pub mod metrics;

pub use artifact::{ClassWeights, FeatureStats, ModelArtifact};
pub use classifier::{predict, predict_proba, train_one_vs_all, TrainOptions};
pub use matrix::{FeatureMatrix, ScalingSource};
