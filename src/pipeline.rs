//! Training and prediction over a loaded [`DataTable`].

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::condition::TrainConditions;
use crate::data::model::DataTable;
use crate::error::{MlError, Result};
use crate::stats::attributes::AttributeWarning;
use crate::training::artifact::{ModelArtifact, BIAS_KEY};
use crate::training::classifier::{self, TrainOptions};
use crate::training::matrix::{FeatureMatrix, ScalingSource};
use crate::training::metrics::{accuracy_score, ConfusionMatrix};

/// Prediction file name used when none is given.
pub const DEFAULT_PREDICTIONS_FILE: &str = "houses.csv";

/// Header of the row index column in the prediction file.
pub const INDEX_HEADER: &str = "Index";

/// Everything a training run produces.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub artifact: ModelArtifact,
    /// Standardized held-out rows, present when an accuracy split was requested.
    pub held_out: Option<FeatureMatrix>,
    pub evaluation: Option<Evaluation>,
    pub warnings: Vec<AttributeWarning>,
}

/// Accuracy of an artifact on held-out rows.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
}

/// Compute attributes for every column and log the type warnings.
pub fn compute_attributes(
    table: &mut DataTable,
    model: Option<&ModelArtifact>,
) -> Vec<AttributeWarning> {
    let warnings = table.compute_attributes(model);
    for warning in &warnings {
        log::warn!("{warning}");
    }
    warnings
}

/// Train a one-vs-all model predicting `target` from `features`.
///
/// Configuration errors (learning rate, split fraction, unknown or reserved
/// columns) are reported before any computation.
pub fn train(
    table: &mut DataTable,
    target: &str,
    features: &[String],
    options: &TrainOptions,
) -> Result<TrainOutcome> {
    options.validate()?;
    let conditions = TrainConditions::for_target(table, target, features)?;
    train_with_conditions(table, target, &conditions, options)
}

/// Like [`train`], with an explicit feature list per class.
pub fn train_with_conditions(
    table: &mut DataTable,
    target: &str,
    conditions: &TrainConditions,
    options: &TrainOptions,
) -> Result<TrainOutcome> {
    options.validate()?;
    table.require_column(target)?;
    let features = conditions.all_features();
    for feature in &features {
        if feature == BIAS_KEY {
            return Err(MlError::ReservedFeature(feature.clone()));
        }
        table.require_column(feature)?;
    }

    let warnings = compute_attributes(table, None);

    let mut matrix = FeatureMatrix::build(table, target, &features)?;
    if matrix.is_empty() {
        return Err(MlError::EmptyTrainingSet);
    }
    match options.seed {
        Some(seed) => matrix.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => matrix.shuffle(&mut rand::rng()),
    }

    let (mut train_rows, held_out) = match options.accuracy_split {
        Some(fraction) => {
            let (train_rows, held_out) = matrix.split(fraction);
            (train_rows, Some(held_out))
        }
        None => (matrix, None),
    };

    let scaling = match (&held_out, options.scaling_source) {
        (Some(held_out), ScalingSource::HeldOut) => held_out.fit_scaling(),
        _ => train_rows.fit_scaling(),
    };
    train_rows.standardize(&scaling);
    let held_out = held_out.map(|mut rows| {
        rows.standardize(&scaling);
        rows
    });

    log::info!(
        "training {} classes on {} rows with {} features",
        conditions.len(),
        train_rows.len(),
        features.len()
    );
    let classes = classifier::train_one_vs_all(
        &train_rows,
        conditions,
        options.learning_rate,
        options.epochs,
    )?;
    let artifact = ModelArtifact::new(classes, scaling);

    let evaluation = held_out.as_ref().map(|rows| evaluate(&artifact, rows));
    if let Some(evaluation) = &evaluation {
        log::info!("held-out accuracy: {:.4}", evaluation.accuracy);
    }

    Ok(TrainOutcome {
        artifact,
        held_out,
        evaluation,
        warnings,
    })
}

/// Accuracy of `artifact` on standardized rows.
pub fn evaluate(artifact: &ModelArtifact, rows: &FeatureMatrix) -> Evaluation {
    let predicted: Vec<&str> = classifier::predict_matrix(artifact, rows)
        .into_iter()
        .map(|p| p.unwrap_or_default())
        .collect();
    let truth: Vec<&str> = rows.labels.iter().map(String::as_str).collect();

    let mut confusion = ConfusionMatrix::new(artifact.class_labels());
    for (t, p) in truth.iter().zip(&predicted) {
        confusion.add(t, p);
    }

    Evaluation {
        accuracy: accuracy_score(&truth, &predicted),
        confusion,
    }
}

/// Overwrite `target` with the labels `artifact` predicts for every row.
///
/// Feature cells are standardized with the artifact's statistics; absent cells
/// are replaced with the training mean. Returns the predicted labels.
pub fn predict(table: &mut DataTable, target: &str, artifact: &ModelArtifact) -> Result<Vec<String>> {
    table.require_column(target)?;
    let features = artifact.feature_names();
    for feature in &features {
        table.require_column(feature)?;
    }

    compute_attributes(table, Some(artifact));

    let rows = table.row_count();
    let mut predicted = Vec::with_capacity(rows);
    for row in 0..rows {
        let cells: Vec<Option<f64>> = features
            .iter()
            .map(|f| {
                table
                    .column(f)
                    .and_then(|c| c.scaled_values.get(row).copied().flatten())
            })
            .collect();
        let label = classifier::predict(artifact, &cells).unwrap_or_default();
        predicted.push(label.to_string());
    }

    if let Some(column) = table.column_mut(target) {
        column.values = predicted.iter().cloned().map(Some).collect();
    }
    log::info!("predicted {} rows of {target}", predicted.len());
    Ok(predicted)
}

/// Resolve the prediction file name: the default when `None`, `.csv` appended
/// when missing.
pub fn predictions_path(file_name: Option<&Path>) -> PathBuf {
    let Some(path) = file_name else {
        return PathBuf::from(DEFAULT_PREDICTIONS_FILE);
    };
    if path.extension().is_some_and(|ext| ext == "csv") {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".csv");
        PathBuf::from(name)
    }
}

/// Write `Index,<target>` rows for the target column. Returns the path written.
pub fn save_predictions(table: &DataTable, target: &str, file_name: Option<&Path>) -> Result<PathBuf> {
    let column = table.require_column(target)?;
    let path = predictions_path(file_name);

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([INDEX_HEADER, target])?;
    for (index, value) in column.values.iter().enumerate() {
        writer.write_record([index.to_string().as_str(), value.as_deref().unwrap_or("")])?;
    }
    writer.flush()?;

    log::info!("saved predictions in {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn small_table() -> DataTable {
        let house = ["A", "A", "B", "B", "A", "B"];
        let score = ["1", "2", "8", "9", "1.5", "8.5"];
        DataTable::from_columns(vec![
            Column::new("House", house.iter().map(|v| Some(v.to_string())).collect()),
            Column::new("Score", score.iter().map(|v| Some(v.to_string())).collect()),
        ])
    }

    #[test]
    fn reserved_feature_name_is_rejected() {
        let mut table = DataTable::from_columns(
            small_table()
                .columns()
                .cloned()
                .chain([Column::new(BIAS_KEY, vec![Some("1".into()); 6])])
                .collect(),
        );
        let err = train(&mut table, "House", &[BIAS_KEY.to_string()], &TrainOptions::default())
            .unwrap_err();
        assert!(matches!(err, MlError::ReservedFeature(_)));
    }

    #[test]
    fn held_out_scaling_source_fits_on_held_out_rows() {
        let options = TrainOptions {
            accuracy_split: Some(0.5),
            seed: Some(3),
            scaling_source: ScalingSource::HeldOut,
            epochs: 50,
            ..TrainOptions::default()
        };
        let outcome = train(&mut small_table(), "House", &["Score".to_string()], &options).unwrap();
        let held_out = outcome.held_out.unwrap();
        // Standardized with its own statistics, the held-out column has zero mean.
        let mean: f64 = held_out.rows.iter().map(|r| r[0]).sum::<f64>() / held_out.len() as f64;
        assert!(mean.abs() < 1e-9);
        assert!(outcome.evaluation.is_some());
    }

    #[test]
    fn predictions_path_defaults_and_extension() {
        assert_eq!(predictions_path(None), PathBuf::from(DEFAULT_PREDICTIONS_FILE));
        assert_eq!(predictions_path(Some(Path::new("out"))), PathBuf::from("out.csv"));
        assert_eq!(predictions_path(Some(Path::new("out.csv"))), PathBuf::from("out.csv"));
    }
}
