use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{MlError, Result};
use crate::stats::attributes::{AttributeWarning, ColumnAttributes};
use crate::training::artifact::ModelArtifact;

// ---------------------------------------------------------------------------
// AttributeValue – a single cell seen through its column's attributes
// ---------------------------------------------------------------------------

/// A cell interpreted against the type its column settled on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Numeric(f64),
    /// Code assigned by the column's categorical encoding.
    Categorical(usize),
    Absent,
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Numeric(v) => write!(f, "{v:.6}"),
            AttributeValue::Categorical(code) => write!(f, "#{code}"),
            AttributeValue::Absent => write!(f, "<absent>"),
        }
    }
}

impl AttributeValue {
    /// The numeric representation used by every aggregate and by the feature matrix.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Numeric(v) => Some(*v),
            AttributeValue::Categorical(code) => Some(*code as f64),
            AttributeValue::Absent => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one named column of the source table
// ---------------------------------------------------------------------------

/// A named column: raw cells, computed attributes and standardized values.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Raw cells in row order, `None` for an empty cell.
    pub values: Vec<Option<String>>,
    /// Standardized cells. Only filled when a model carries mean/std for this column.
    pub scaled_values: Vec<Option<f64>>,
    attributes: Option<ColumnAttributes>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values,
            scaled_values: Vec::new(),
            attributes: None,
        }
    }

    /// Attributes from the last [`Column::compute_attributes`] call.
    pub fn attributes(&self) -> Option<&ColumnAttributes> {
        self.attributes.as_ref()
    }

    /// Compute the column attributes. When `model` was trained with this column as a
    /// feature, the cells are also standardized with the model's mean/std.
    pub fn compute_attributes(&mut self, model: Option<&ModelArtifact>) -> Option<AttributeWarning> {
        let (attributes, warning) = ColumnAttributes::compute(&self.name, &self.values);

        self.scaled_values = match model.and_then(|m| m.scaling_for(&self.name)) {
            Some(stats) => self
                .values
                .iter()
                .map(|value| {
                    value
                        .as_deref()
                        .and_then(|v| attributes.numeric_value_for_value(v))
                        .map(|v| stats.apply(v))
                })
                .collect(),
            None => Vec::new(),
        };

        self.attributes = Some(attributes);
        warning
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DataTable – the complete loaded table
// ---------------------------------------------------------------------------

/// Ordered, named columns of a loaded file.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    columns: IndexMap<String, Column>,
    source: Option<PathBuf>,
}

impl DataTable {
    /// Build a table from columns. A later column with a repeated name replaces the
    /// earlier one but keeps its position.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let columns = columns
            .into_iter()
            .map(|column| (column.name.clone(), column))
            .collect();
        Self {
            columns,
            source: None,
        }
    }

    /// Transpose row-major records into columns. Short records are padded with
    /// absent cells.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<Option<String>>>) -> Self {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(records.len())))
            .collect();

        for record in records {
            let mut cells = record.into_iter();
            for column in &mut columns {
                column.values.push(cells.next().flatten());
            }
        }

        Self::from_columns(columns)
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// File the table was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// Like [`DataTable::column`], but a missing column is a configuration error.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| MlError::UnknownColumn(name.to_string()))
    }

    /// Number of rows (length of the longest column).
    pub fn row_count(&self) -> usize {
        self.columns.values().map(Column::len).max().unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Compute the attributes of every column, collecting type warnings instead of
    /// stopping on them.
    pub fn compute_attributes(&mut self, model: Option<&ModelArtifact>) -> Vec<AttributeWarning> {
        self.columns
            .values_mut()
            .filter_map(|column| column.compute_attributes(model))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| (!v.is_empty()).then(|| v.to_string()))
            .collect()
    }

    #[test]
    fn records_are_transposed_and_padded() {
        let table = DataTable::from_records(
            vec!["a".into(), "b".into()],
            vec![cells(&["1", "x"]), cells(&["2"])],
        );
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.row_count(), 2);
        let b = table.column("b").unwrap();
        assert_eq!(b.values, vec![Some("x".to_string()), None]);
    }

    #[test]
    fn missing_column_is_a_configuration_error() {
        let table = DataTable::from_columns(vec![Column::new("a", cells(&["1"]))]);
        assert!(matches!(
            table.require_column("nope"),
            Err(MlError::UnknownColumn(name)) if name == "nope"
        ));
    }

    #[test]
    fn warnings_are_collected_per_column() {
        let mut table = DataTable::from_columns(vec![
            Column::new("mixed", cells(&["1", "two", "3"])),
            Column::new("clean", cells(&["1", "2", "3"])),
        ]);
        let warnings = table.compute_attributes(None);
        assert_eq!(warnings.len(), 1);
        let clean = table.column("clean").unwrap().attributes().unwrap();
        assert_eq!(clean.max, Some(3.0));
    }

    #[test]
    fn attribute_value_numeric_representation() {
        assert_eq!(AttributeValue::Numeric(1.5).as_f64(), Some(1.5));
        assert_eq!(AttributeValue::Categorical(2).as_f64(), Some(2.0));
        assert_eq!(AttributeValue::Absent.as_f64(), None);
    }
}
