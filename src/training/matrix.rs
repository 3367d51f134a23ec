use std::borrow::Cow;

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::Rng;

use super::artifact::FeatureStats;
use crate::data::model::DataTable;
use crate::error::{MlError, Result};
use crate::stats::attributes::ColumnAttributes;

/// Which partition the standardization statistics are fitted on when the rows
/// are split into train and held-out parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingSource {
    /// Fit on the training partition.
    #[default]
    Training,
    /// Fit on the held-out partition.
    HeldOut,
}

/// Dense feature rows paired with their class labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl FeatureMatrix {
    /// Assemble the matrix for `features` against the `target` column.
    ///
    /// Absent or uninterpretable feature cells are replaced with the column mean.
    /// When a type mismatch left the column without a mean, the mean of its
    /// interpretable cells is used instead. Rows with an absent target are dropped.
    pub fn build(table: &DataTable, target: &str, features: &[String]) -> Result<Self> {
        let target_column = table.require_column(target)?;

        let mut columns = Vec::with_capacity(features.len());
        for feature in features {
            let column = table.require_column(feature)?;
            let attributes = match column.attributes() {
                Some(a) => Cow::Borrowed(a),
                None => Cow::Owned(ColumnAttributes::compute(&column.name, &column.values).0),
            };
            let mean = attributes
                .mean
                .or_else(|| interpretable_mean(&column.values, &attributes))
                .ok_or_else(|| MlError::NoFeatureMean(feature.clone()))?;
            columns.push((column, attributes, mean));
        }

        let mut matrix = Self {
            feature_names: features.to_vec(),
            ..Self::default()
        };
        let mut dropped = 0usize;

        for (row, label) in target_column.values.iter().enumerate() {
            let Some(label) = label else {
                dropped += 1;
                continue;
            };
            let values = columns
                .iter()
                .map(|(column, attributes, mean)| {
                    column
                        .values
                        .get(row)
                        .and_then(Option::as_deref)
                        .and_then(|v| attributes.numeric_value_for_value(v))
                        .unwrap_or(*mean)
                })
                .collect();
            matrix.rows.push(values);
            matrix.labels.push(label.clone());
        }

        if dropped > 0 {
            log::warn!("dropped {dropped} rows without a value in {target}");
        }
        Ok(matrix)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn feature_index(&self, feature: &str) -> Option<usize> {
        self.feature_names.iter().position(|f| f == feature)
    }

    /// Permute rows, keeping every feature row with its label.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut paired: Vec<(Vec<f64>, String)> = std::mem::take(&mut self.rows)
            .into_iter()
            .zip(std::mem::take(&mut self.labels))
            .collect();
        paired.shuffle(rng);
        (self.rows, self.labels) = paired.into_iter().unzip();
    }

    /// Split into (first ⌊fraction·N⌋ rows, remaining rows).
    pub fn split(mut self, fraction: f64) -> (Self, Self) {
        let at = ((self.len() as f64 * fraction).floor() as usize).min(self.len());
        let held_out = Self {
            feature_names: self.feature_names.clone(),
            rows: self.rows.split_off(at),
            labels: self.labels.split_off(at),
        };
        (self, held_out)
    }

    /// Population mean/std of every feature. A constant feature gets std 1 so it
    /// standardizes to zero instead of NaN.
    pub fn fit_scaling(&self) -> IndexMap<String, FeatureStats> {
        let n = self.len() as f64;
        self.feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                if self.is_empty() {
                    return (name.clone(), FeatureStats { mean: 0.0, std: 1.0 });
                }
                let mean = self.rows.iter().map(|r| r[j]).sum::<f64>() / n;
                let variance = self.rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                let std = if std > 0.0 { std } else { 1.0 };
                (name.clone(), FeatureStats { mean, std })
            })
            .collect()
    }

    /// Standardize in place. Features missing from `scaling` are left untouched.
    pub fn standardize(&mut self, scaling: &IndexMap<String, FeatureStats>) {
        for (j, name) in self.feature_names.iter().enumerate() {
            let Some(stats) = scaling.get(name) else {
                continue;
            };
            for row in &mut self.rows {
                row[j] = stats.apply(row[j]);
            }
        }
    }
}

/// Mean over the cells `attributes` can interpret, `None` when there are none.
fn interpretable_mean(values: &[Option<String>], attributes: &ColumnAttributes) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .filter_map(|v| attributes.numeric_value_for_value(v))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
