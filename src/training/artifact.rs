//! Persisted output of training: per-class weights and feature standardization.
//!
//! On disk the artifact is a JSON document with the `.mlmodel` extension:
//!
//! ```json
//! {
//!   "rows": { "Ravenclaw": { "t0": -0.41, "Astronomy": 1.93, "Herbology": -0.22 } },
//!   "attributes": {
//!     "mean": { "Astronomy": 39.8, "Herbology": 1.14 },
//!     "std": { "Astronomy": 520.1, "Herbology": 5.21 }
//!   }
//! }
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MlError, Result};

/// Key of the bias weight inside a class's weight map.
pub const BIAS_KEY: &str = "t0";

pub const MODEL_EXTENSION: &str = "mlmodel";

// ---------------------------------------------------------------------------
// In-memory representation
// ---------------------------------------------------------------------------

/// Standardization parameters of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
}

impl FeatureStats {
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }
}

/// Learned parameters of one binary (class vs rest) model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassWeights {
    pub bias: f64,
    /// Feature name → weight, in the order the features were trained.
    pub weights: IndexMap<String, f64>,
}

/// Immutable result of training, consumed unchanged at prediction time.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    classes: IndexMap<String, ClassWeights>,
    scaling: IndexMap<String, FeatureStats>,
}

impl ModelArtifact {
    pub fn new(
        classes: IndexMap<String, ClassWeights>,
        scaling: IndexMap<String, FeatureStats>,
    ) -> Self {
        Self { classes, scaling }
    }

    /// Classes with their weights, in training order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &ClassWeights)> {
        self.classes.iter().map(|(label, w)| (label.as_str(), w))
    }

    pub fn class_labels(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// Features the model standardizes, in training order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.scaling.keys().map(String::as_str).collect()
    }

    pub fn scaling(&self) -> &IndexMap<String, FeatureStats> {
        &self.scaling
    }

    pub fn scaling_for(&self, feature: &str) -> Option<&FeatureStats> {
        self.scaling.get(feature)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&ArtifactFile::from(self))?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(parse_artifact(text)?)
    }

    /// Write the artifact, appending `.mlmodel` to `path` unless it already has it.
    /// Returns the path written.
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        let path = with_model_extension(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MlError::MissingModel(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        parse_artifact(&text).map_err(|source| MlError::InvalidModel {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `train` → `train.mlmodel`; `train.mlmodel` is left alone.
pub fn with_model_extension(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == MODEL_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(MODEL_EXTENSION);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// File layout
// ---------------------------------------------------------------------------

/// Deserialize and validate an artifact document.
fn parse_artifact(text: &str) -> serde_json::Result<ModelArtifact> {
    let file: ArtifactFile = serde_json::from_str(text)?;
    ModelArtifact::try_from(file).map_err(serde::de::Error::custom)
}

#[derive(Serialize, Deserialize)]
struct ArtifactFile {
    rows: IndexMap<String, IndexMap<String, f64>>,
    attributes: ScalingFile,
}

#[derive(Serialize, Deserialize)]
struct ScalingFile {
    mean: IndexMap<String, f64>,
    std: IndexMap<String, f64>,
}

impl From<&ModelArtifact> for ArtifactFile {
    fn from(artifact: &ModelArtifact) -> Self {
        let rows = artifact
            .classes
            .iter()
            .map(|(label, class)| {
                let mut weights = IndexMap::with_capacity(class.weights.len() + 1);
                weights.insert(BIAS_KEY.to_string(), class.bias);
                weights.extend(class.weights.iter().map(|(f, w)| (f.clone(), *w)));
                (label.clone(), weights)
            })
            .collect();

        let attributes = ScalingFile {
            mean: artifact
                .scaling
                .iter()
                .map(|(f, s)| (f.clone(), s.mean))
                .collect(),
            std: artifact
                .scaling
                .iter()
                .map(|(f, s)| (f.clone(), s.std))
                .collect(),
        };

        Self { rows, attributes }
    }
}

impl TryFrom<ArtifactFile> for ModelArtifact {
    type Error = String;

    fn try_from(file: ArtifactFile) -> std::result::Result<Self, Self::Error> {
        let classes = file
            .rows
            .into_iter()
            .map(|(label, mut weights)| {
                let bias = weights.shift_remove(BIAS_KEY).unwrap_or(0.0);
                (label, ClassWeights { bias, weights })
            })
            .collect();

        let ScalingFile { mean, std } = file.attributes;
        // Standardization divides by std, so it must be present and positive.
        let scaling = mean
            .into_iter()
            .map(|(feature, mean)| match std.get(&feature).copied() {
                Some(std) if std.is_finite() && std > 0.0 => {
                    Ok((feature, FeatureStats { mean, std }))
                }
                Some(std) => Err(format!("feature {feature} has invalid std {std}")),
                None => Err(format!("feature {feature} has no std")),
            })
            .collect::<std::result::Result<_, _>>()?;

        Ok(Self { classes, scaling })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ModelArtifact {
        let mut classes = IndexMap::new();
        for (label, bias) in [("Ravenclaw", -0.5), ("Gryffindor", 0.25)] {
            let weights = [("Astronomy".to_string(), 1.5), ("Herbology".to_string(), -2.0)]
                .into_iter()
                .collect();
            classes.insert(label.to_string(), ClassWeights { bias, weights });
        }
        let scaling = [
            ("Astronomy".to_string(), FeatureStats { mean: 10.0, std: 2.0 }),
            ("Herbology".to_string(), FeatureStats { mean: -1.0, std: 0.5 }),
        ]
        .into_iter()
        .collect();
        ModelArtifact::new(classes, scaling)
    }

    #[test]
    fn json_layout_uses_bias_key_and_attributes() {
        let json: serde_json::Value = serde_json::from_str(&artifact().to_json().unwrap()).unwrap();
        assert_eq!(json["rows"]["Ravenclaw"][BIAS_KEY], -0.5);
        assert_eq!(json["rows"]["Gryffindor"]["Herbology"], -2.0);
        assert_eq!(json["attributes"]["mean"]["Astronomy"], 10.0);
        assert_eq!(json["attributes"]["std"]["Herbology"], 0.5);
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let original = artifact();
        let restored = ModelArtifact::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(restored, original);
        assert_eq!(restored.class_labels(), vec!["Ravenclaw", "Gryffindor"]);
        assert_eq!(restored.feature_names(), vec!["Astronomy", "Herbology"]);
    }

    #[test]
    fn save_appends_extension_and_load_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let written = artifact().save(&dir.path().join("train")).unwrap();
        assert_eq!(written, dir.path().join("train.mlmodel"));
        assert_eq!(ModelArtifact::load(&written).unwrap(), artifact());
    }

    #[test]
    fn missing_model_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent.mlmodel")).unwrap_err();
        assert!(matches!(err, MlError::MissingModel(_)));
    }

    #[test]
    fn corrupt_model_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.mlmodel");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ModelArtifact::load(&path),
            Err(MlError::InvalidModel { .. })
        ));
    }

    #[test]
    fn non_positive_or_missing_std_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let documents = [
            r#"{"rows":{"A":{"t0":0.5,"x":1.0}},"attributes":{"mean":{"x":2.0},"std":{"x":0.0}}}"#,
            r#"{"rows":{"A":{"t0":0.5,"x":1.0}},"attributes":{"mean":{"x":2.0},"std":{"x":-1.0}}}"#,
            r#"{"rows":{"A":{"t0":0.5,"x":1.0}},"attributes":{"mean":{"x":2.0},"std":{}}}"#,
        ];
        for (i, document) in documents.iter().enumerate() {
            let path = dir.path().join(format!("m{i}.mlmodel"));
            std::fs::write(&path, document).unwrap();
            assert!(matches!(
                ModelArtifact::load(&path),
                Err(MlError::InvalidModel { .. })
            ));
            assert!(matches!(ModelArtifact::from_json(document), Err(MlError::Json(_))));
        }
    }

    #[test]
    fn extension_is_not_duplicated() {
        assert_eq!(with_model_extension(Path::new("m.mlmodel")), PathBuf::from("m.mlmodel"));
        assert_eq!(with_model_extension(Path::new("m.v2")), PathBuf::from("m.v2.mlmodel"));
    }

    #[test]
    fn standardization_applies_mean_and_std() {
        let stats = FeatureStats { mean: 10.0, std: 2.0 };
        assert_eq!(stats.apply(14.0), 2.0);
        assert_eq!(stats.apply(stats.mean), 0.0);
    }
}
