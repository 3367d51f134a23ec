use indexmap::IndexMap;

use super::model::{Column, DataTable};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Train conditions: which feature columns each class is trained on
// ---------------------------------------------------------------------------

/// Maps each class label of the target column to the feature columns used to
/// train its binary model. Iteration order is the order classes were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainConditions {
    conditions: IndexMap<String, Vec<String>>,
}

impl TrainConditions {
    /// Use the same features for every class found in `target`.
    ///
    /// Fails when the target or one of the features is not a column of `table`.
    pub fn for_target(table: &DataTable, target: &str, features: &[String]) -> Result<Self> {
        let target_column = table.require_column(target)?;
        for feature in features {
            table.require_column(feature)?;
        }

        let mut conditions = Self::default();
        for label in class_labels(target_column) {
            conditions.add(label, features.to_vec());
        }
        Ok(conditions)
    }

    /// Set the features for a single class, replacing any previous entry.
    pub fn add(&mut self, label: impl Into<String>, features: Vec<String>) {
        self.conditions.insert(label.into(), features);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.conditions
            .iter()
            .map(|(label, features)| (label.as_str(), features.as_slice()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    pub fn features_for(&self, label: &str) -> Option<&[String]> {
        self.conditions.get(label).map(Vec::as_slice)
    }

    /// Every feature used by at least one class, in first-use order.
    pub fn all_features(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for feature in self.conditions.values().flatten() {
            if !all.contains(feature) {
                all.push(feature.clone());
            }
        }
        all
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Distinct non-absent values of a column, in order of first appearance.
pub fn class_labels(column: &Column) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for value in column.values.iter().flatten() {
        if !labels.contains(value) {
            labels.push(value.clone());
        }
    }
    labels
}
