//! One-vs-all logistic regression trained with batch gradient descent.

use indexmap::IndexMap;

use super::artifact::{ClassWeights, ModelArtifact};
use super::matrix::{FeatureMatrix, ScalingSource};
use crate::data::condition::TrainConditions;
use crate::error::{MlError, Result};

/// Gradient descent passes per class when not configured otherwise.
pub const DEFAULT_EPOCHS: usize = 1000;

/// Accepted range of the held-out split fraction.
pub const SPLIT_RANGE: (f64, f64) = (0.01, 0.99);

/// Training options for the one-vs-all classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// Gradient descent step, in (0, 1].
    pub learning_rate: f64,
    pub epochs: usize,
    /// Fraction of shuffled rows kept for training; the rest measures accuracy.
    pub accuracy_split: Option<f64>,
    /// Fixed shuffle seed. `None` draws a fresh permutation every run.
    pub seed: Option<u64>,
    pub scaling_source: ScalingSource,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: DEFAULT_EPOCHS,
            accuracy_split: None,
            seed: None,
            scaling_source: ScalingSource::default(),
        }
    }
}

impl TrainOptions {
    pub fn validate(&self) -> Result<()> {
        validate_learning_rate(self.learning_rate)?;
        if let Some(split) = self.accuracy_split {
            let (low, high) = SPLIT_RANGE;
            if !(low..=high).contains(&split) {
                return Err(MlError::AccuracySplit(split));
            }
        }
        Ok(())
    }
}

pub fn validate_learning_rate(learning_rate: f64) -> Result<()> {
    if learning_rate > 0.0 && learning_rate <= 1.0 {
        Ok(())
    } else {
        Err(MlError::LearningRate(learning_rate))
    }
}

/// Logistic function, bounded in (0, 1).
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn score(bias: f64, weights: &[f64], row: &[f64]) -> f64 {
    bias + weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>()
}

/// Fit one binary model on `rows` against 0/1 `targets`.
///
/// Every epoch applies θ ← θ − η·(1/m)·Xᵗ(σ(Xθ) − y) over the full batch, with the
/// bias as the weight of an implicit column of ones. Weights start at zero.
/// Returns `(bias, weights)`.
pub fn fit_binary(
    rows: &[Vec<f64>],
    targets: &[f64],
    learning_rate: f64,
    epochs: usize,
) -> (f64, Vec<f64>) {
    let n_features = rows.first().map_or(0, Vec::len);
    let mut bias = 0.0;
    let mut weights = vec![0.0; n_features];
    if rows.is_empty() {
        return (bias, weights);
    }

    let step = learning_rate / rows.len() as f64;
    let mut gradient = vec![0.0; n_features];

    for _ in 0..epochs {
        let mut bias_gradient = 0.0;
        gradient.iter_mut().for_each(|g| *g = 0.0);

        for (row, &y) in rows.iter().zip(targets) {
            let error = sigmoid(score(bias, &weights, row)) - y;
            bias_gradient += error;
            for (g, x) in gradient.iter_mut().zip(row) {
                *g += error * x;
            }
        }

        bias -= step * bias_gradient;
        for (w, g) in weights.iter_mut().zip(&gradient) {
            *w -= step * g;
        }
    }

    (bias, weights)
}

/// Train one binary model per class of `conditions`, each on its own features.
///
/// `matrix` must already be standardized and hold every feature the conditions
/// name.
pub fn train_one_vs_all(
    matrix: &FeatureMatrix,
    conditions: &TrainConditions,
    learning_rate: f64,
    epochs: usize,
) -> Result<IndexMap<String, ClassWeights>> {
    validate_learning_rate(learning_rate)?;
    if matrix.is_empty() {
        return Err(MlError::EmptyTrainingSet);
    }

    let mut classes = IndexMap::with_capacity(conditions.len());
    for (label, features) in conditions.iter() {
        let indices = features
            .iter()
            .map(|f| {
                matrix
                    .feature_index(f)
                    .ok_or_else(|| MlError::UnknownColumn(f.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows: Vec<Vec<f64>> = matrix
            .rows
            .iter()
            .map(|row| indices.iter().map(|&j| row[j]).collect())
            .collect();
        let targets: Vec<f64> = matrix
            .labels
            .iter()
            .map(|l| if l == label { 1.0 } else { 0.0 })
            .collect();

        let (bias, fitted) = fit_binary(&rows, &targets, learning_rate, epochs);
        log::debug!("trained class {label}: bias {bias:.6}, {} weights", fitted.len());

        let weights = features.iter().cloned().zip(fitted).collect();
        classes.insert(label.to_string(), ClassWeights { bias, weights });
    }
    Ok(classes)
}

/// Probability of every class for one standardized row.
///
/// `row` is aligned with [`ModelArtifact::feature_names`]. A `None` cell is
/// replaced with the feature's training mean before standardization.
pub fn predict_proba<'a>(artifact: &'a ModelArtifact, row: &[Option<f64>]) -> Vec<(&'a str, f64)> {
    let scaling = artifact.scaling();
    let value_of = |feature: &str| -> f64 {
        let Some((index, _, stats)) = scaling.get_full(feature) else {
            return 0.0;
        };
        row.get(index)
            .copied()
            .flatten()
            .unwrap_or_else(|| stats.apply(stats.mean))
    };

    artifact
        .classes()
        .map(|(label, class)| {
            let z = class.bias
                + class
                    .weights
                    .iter()
                    .map(|(feature, w)| w * value_of(feature))
                    .sum::<f64>();
            (label, sigmoid(z))
        })
        .collect()
}

/// Most probable class for one standardized row. Ties go to the class trained
/// first.
pub fn predict<'a>(artifact: &'a ModelArtifact, row: &[Option<f64>]) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for (label, p) in predict_proba(artifact, row) {
        if best.map_or(true, |(_, best_p)| p > best_p) {
            best = Some((label, p));
        }
    }
    best.map(|(label, _)| label)
}

/// Predict every row of a standardized matrix.
pub fn predict_matrix<'a>(artifact: &'a ModelArtifact, matrix: &FeatureMatrix) -> Vec<Option<&'a str>> {
    let positions: Vec<Option<usize>> = artifact
        .feature_names()
        .iter()
        .map(|f| matrix.feature_index(f))
        .collect();

    matrix
        .rows
        .iter()
        .map(|row| {
            let aligned: Vec<Option<f64>> = positions
                .iter()
                .map(|p| p.map(|j| row[j]))
                .collect();
            predict(artifact, &aligned)
        })
        .collect()
}
