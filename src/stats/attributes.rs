use std::fmt;

use indexmap::IndexMap;

use crate::data::model::AttributeValue;

/// Row labels of the describe table, in display order.
pub const ATTRIBUTE_NAMES: [&str; 9] = [
    "Type", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max",
];

/// Textual marker accepted in any column without affecting its type.
pub const NAN_SENTINEL: &str = "Nan";

// ---------------------------------------------------------------------------
// ColumnType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

impl ColumnType {
    /// Numeric when the value parses as a float, categorical otherwise.
    pub fn of_value(value: &str) -> Self {
        if parse_numeric(value).is_some() {
            ColumnType::Numeric
        } else {
            ColumnType::Categorical
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Numeric => "Numeric",
            ColumnType::Categorical => "Categorical",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn is_nan_sentinel(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(NAN_SENTINEL)
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Data-quality problems found while computing attributes. They never abort a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttributeWarning {
    #[error("Column {column} contains different value types (row {row}: expected {expected}, found {found}).")]
    MixedTypes {
        column: String,
        row: usize,
        expected: ColumnType,
        found: ColumnType,
    },
}

// ---------------------------------------------------------------------------
// ColumnAttributes
// ---------------------------------------------------------------------------

/// One entry of the describe table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeField {
    Type(ColumnType),
    Count(usize),
    Value(f64),
}

/// Descriptive statistics of one column, computed on numeric values or on the
/// categorical codes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnAttributes {
    /// Fixed by the first non-absent value; `None` for a column without values.
    pub column_type: Option<ColumnType>,
    pub count: usize,
    pub mean: Option<f64>,
    /// Population standard deviation.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub percentile_25: Option<f64>,
    pub percentile_50: Option<f64>,
    pub percentile_75: Option<f64>,
    pub max: Option<f64>,
    encoding: IndexMap<String, usize>,
}

impl ColumnAttributes {
    /// Compute the attributes of a column in a single pass over its cells.
    ///
    /// A value whose type disagrees with the column type stops the pass: the count
    /// and encoding gathered so far are kept, every other aggregate is left unset and
    /// a warning is returned.
    pub fn compute(name: &str, values: &[Option<String>]) -> (Self, Option<AttributeWarning>) {
        let mut pass = EncodingPass::default();
        let mut numeric = Vec::with_capacity(values.len());

        for (row, value) in values.iter().enumerate() {
            let Some(value) = value.as_deref() else {
                continue;
            };
            if let Err((expected, found)) = pass.admit(value, &mut numeric) {
                let warning = AttributeWarning::MixedTypes {
                    column: name.to_string(),
                    row,
                    expected,
                    found,
                };
                let attributes = Self {
                    count: numeric.len(),
                    ..pass.freeze()
                };
                return (attributes, Some(warning));
            }
        }

        (pass.freeze().with_aggregates(numeric), None)
    }

    fn with_aggregates(mut self, mut values: Vec<f64>) -> Self {
        self.count = values.len();
        if values.is_empty() {
            return self;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        values.sort_by(f64::total_cmp);

        self.mean = Some(mean);
        self.std = Some(variance.sqrt());
        self.min = values.first().copied();
        self.max = values.last().copied();
        self.percentile_25 = nearest_rank(&values, 0.25);
        self.percentile_50 = nearest_rank(&values, 0.5);
        self.percentile_75 = nearest_rank(&values, 0.75);
        self
    }

    /// Numeric representation of a raw cell: the parsed float for numeric columns,
    /// the code for categorical ones.
    pub fn numeric_value_for_value(&self, value: &str) -> Option<f64> {
        self.attribute_value(Some(value)).as_f64()
    }

    pub fn attribute_value(&self, value: Option<&str>) -> AttributeValue {
        let Some(value) = value else {
            return AttributeValue::Absent;
        };
        match self.column_type {
            Some(ColumnType::Numeric) => parse_numeric(value)
                .map(AttributeValue::Numeric)
                .unwrap_or(AttributeValue::Absent),
            Some(ColumnType::Categorical) => self
                .encoding
                .get(value)
                .map(|&code| AttributeValue::Categorical(code))
                .unwrap_or(AttributeValue::Absent),
            None => AttributeValue::Absent,
        }
    }

    /// Distinct categorical values and their codes, in order of first appearance.
    pub fn encoding(&self) -> &IndexMap<String, usize> {
        &self.encoding
    }

    pub fn label_for_code(&self, code: usize) -> Option<&str> {
        self.encoding
            .get_index(code)
            .map(|(label, _)| label.as_str())
    }

    /// Look up an attribute by its describe-table name (see [`ATTRIBUTE_NAMES`]).
    pub fn value_for_key(&self, key: &str) -> Option<AttributeField> {
        let value = match key {
            "Type" => return self.column_type.map(AttributeField::Type),
            "Count" => return Some(AttributeField::Count(self.count)),
            "Mean" => self.mean,
            "Std" => self.std,
            "Min" => self.min,
            "25%" => self.percentile_25,
            "50%" => self.percentile_50,
            "75%" => self.percentile_75,
            "Max" => self.max,
            _ => None,
        };
        value.map(AttributeField::Value)
    }
}

/// Nearest-rank percentile on an ascending slice.
fn nearest_rank(sorted: &[f64], fraction: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let index = (sorted.len() as f64 * fraction).round() as usize;
    Some(sorted[index.min(last)])
}

/// Type and encoding state while a column is being scanned.
#[derive(Default)]
struct EncodingPass {
    column_type: Option<ColumnType>,
    encoding: IndexMap<String, usize>,
    /// Sentinels seen before the type was fixed.
    leading_sentinels: Vec<String>,
}

impl EncodingPass {
    /// Push the numeric representation of `value` onto `out`, or return the
    /// (expected, found) types on a mismatch. Sentinels ahead of the first typed
    /// value are held back and encoded once the column turns out categorical.
    fn admit(&mut self, value: &str, out: &mut Vec<f64>) -> Result<(), (ColumnType, ColumnType)> {
        if is_nan_sentinel(value) {
            match self.column_type {
                Some(ColumnType::Categorical) => out.push(self.encode(value)),
                Some(ColumnType::Numeric) => {}
                None => self.leading_sentinels.push(value.to_string()),
            }
            return Ok(());
        }

        let parsed = parse_numeric(value);
        let found = if parsed.is_some() {
            ColumnType::Numeric
        } else {
            ColumnType::Categorical
        };
        let expected = match self.column_type {
            Some(expected) => expected,
            None => {
                self.column_type = Some(found);
                let sentinels = std::mem::take(&mut self.leading_sentinels);
                if found == ColumnType::Categorical {
                    for sentinel in sentinels {
                        out.push(self.encode(&sentinel));
                    }
                }
                found
            }
        };

        match (expected, parsed) {
            (ColumnType::Numeric, Some(v)) => out.push(v),
            (ColumnType::Categorical, None) => out.push(self.encode(value)),
            _ => return Err((expected, found)),
        }
        Ok(())
    }

    fn encode(&mut self, value: &str) -> f64 {
        let next = self.encoding.len();
        *self.encoding.entry(value.to_string()).or_insert(next) as f64
    }

    fn freeze(self) -> ColumnAttributes {
        ColumnAttributes {
            column_type: self.column_type,
            encoding: self.encoding,
            ..ColumnAttributes::default()
        }
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
    fn numeric_column_keeps_float_values() {
        let values = cells(&["1.5", "-2", "3e2", "", "0.25"]);
        let (attributes, warning) = ColumnAttributes::compute("n", &values);
        assert!(warning.is_none());
        assert_eq!(attributes.column_type, Some(ColumnType::Numeric));
        assert_eq!(attributes.count, 4);
        for value in values.iter().flatten() {
            assert_eq!(
                attributes.numeric_value_for_value(value),
                Some(value.parse::<f64>().unwrap())
            );
        }
    }

    #[test]
    fn population_std_of_reference_sample() {
        let values = cells(&["2", "4", "4", "4", "5", "5", "7", "9"]);
        let (attributes, _) = ColumnAttributes::compute("n", &values);
        assert_eq!(attributes.mean, Some(5.0));
        assert_eq!(attributes.std, Some(2.0));
        assert_eq!(attributes.min, Some(2.0));
        assert_eq!(attributes.max, Some(9.0));
    }

    #[test]
    fn nearest_rank_percentiles() {
        // Shuffled on purpose: percentiles read the sorted values.
        let values = cells(&["7", "1", "10", "3", "5", "2", "9", "4", "8", "6"]);
        let (attributes, _) = ColumnAttributes::compute("n", &values);
        assert_eq!(attributes.percentile_25, Some(4.0));
        assert_eq!(attributes.percentile_50, Some(6.0));
        assert_eq!(attributes.percentile_75, Some(9.0));
    }

    #[test]
    fn percentile_index_is_clamped_for_tiny_columns() {
        let (attributes, _) = ColumnAttributes::compute("n", &cells(&["1", "2"]));
        assert_eq!(attributes.percentile_75, Some(2.0));
        let (single, _) = ColumnAttributes::compute("n", &cells(&["4"]));
        assert_eq!(single.percentile_25, Some(4.0));
        assert_eq!(single.percentile_75, Some(4.0));
        assert_eq!(single.std, Some(0.0));
    }

    #[test]
    fn categorical_encoding_follows_first_appearance() {
        let values = cells(&["Ravenclaw", "Slytherin", "", "Ravenclaw", "Gryffindor"]);
        let (attributes, warning) = ColumnAttributes::compute("house", &values);
        assert!(warning.is_none());
        assert_eq!(attributes.column_type, Some(ColumnType::Categorical));
        let codes: Vec<_> = attributes.encoding().iter().map(|(k, &v)| (k.as_str(), v)).collect();
        assert_eq!(codes, vec![("Ravenclaw", 0), ("Slytherin", 1), ("Gryffindor", 2)]);
        assert_eq!(attributes.count, 4);
        assert_eq!(attributes.label_for_code(1), Some("Slytherin"));
        assert_eq!(
            attributes.attribute_value(Some("Gryffindor")),
            AttributeValue::Categorical(2)
        );
    }

    #[test]
    fn categorical_encoding_is_deterministic() {
        let values = cells(&["b", "a", "c", "a", "d", "b", "e"]);
        let (first, _) = ColumnAttributes::compute("c", &values);
        let (second, _) = ColumnAttributes::compute("c", &values);
        assert_eq!(first.encoding(), second.encoding());

        let distinct = first.encoding().len();
        let mut codes: Vec<usize> = first.encoding().values().copied().collect();
        codes.sort_unstable();
        assert_eq!(codes, (0..distinct).collect::<Vec<_>>());
    }

    #[test]
    fn mixed_types_invalidate_aggregates() {
        let values = cells(&["1", "2", "three", "4"]);
        let (attributes, warning) = ColumnAttributes::compute("mixed", &values);
        assert_eq!(
            warning,
            Some(AttributeWarning::MixedTypes {
                column: "mixed".to_string(),
                row: 2,
                expected: ColumnType::Numeric,
                found: ColumnType::Categorical,
            })
        );
        assert_eq!(attributes.count, 2);
        assert_eq!(attributes.min, None);
        assert_eq!(attributes.max, None);
        assert_eq!(attributes.mean, None);
        assert_eq!(attributes.percentile_50, None);
    }

    #[test]
    fn mixed_types_keep_accumulated_encoding() {
        let values = cells(&["x", "y", "3"]);
        let (attributes, warning) = ColumnAttributes::compute("mixed", &values);
        assert!(warning.is_some());
        assert_eq!(attributes.encoding().len(), 2);
    }

    #[test]
    fn nan_sentinel_does_not_fix_or_break_type() {
        let (numeric, warning) = ColumnAttributes::compute("n", &cells(&["Nan", "1", "Nan", "3"]));
        assert!(warning.is_none());
        assert_eq!(numeric.column_type, Some(ColumnType::Numeric));
        assert_eq!(numeric.count, 2);
        assert_eq!(numeric.mean, Some(2.0));
        assert_eq!(numeric.numeric_value_for_value("Nan"), None);

        let (categorical, warning) = ColumnAttributes::compute("c", &cells(&["a", "Nan", "b"]));
        assert!(warning.is_none());
        assert_eq!(categorical.column_type, Some(ColumnType::Categorical));
        assert_eq!(categorical.encoding().get("Nan"), Some(&1));
    }

    #[test]
    fn leading_nan_sentinel_is_encoded_in_categorical_column() {
        let (attributes, warning) = ColumnAttributes::compute("c", &cells(&["Nan", "a", "Nan"]));
        assert!(warning.is_none());
        assert_eq!(attributes.column_type, Some(ColumnType::Categorical));
        assert_eq!(attributes.encoding().get("Nan"), Some(&0));
        assert_eq!(attributes.encoding().get("a"), Some(&1));
        // Every cell, the first one included, is counted and encoded.
        assert_eq!(attributes.count, 3);
        assert_eq!(attributes.mean, Some(1.0 / 3.0));
        assert_eq!(attributes.numeric_value_for_value("Nan"), Some(0.0));
    }

    #[test]
    fn empty_column_has_no_aggregates() {
        let (attributes, warning) = ColumnAttributes::compute("e", &cells(&["", ""]));
        assert!(warning.is_none());
        assert_eq!(attributes.count, 0);
        assert_eq!(attributes.column_type, None);
        assert_eq!(attributes.mean, None);
        assert_eq!(attributes.percentile_25, None);
        assert_eq!(attributes.value_for_key("Type"), None);
        assert_eq!(attributes.value_for_key("Count"), Some(AttributeField::Count(0)));
    }

    #[test]
    fn value_for_key_covers_every_attribute_name() {
        let (attributes, _) = ColumnAttributes::compute("n", &cells(&["1", "2", "3"]));
        for key in ATTRIBUTE_NAMES {
            assert!(attributes.value_for_key(key).is_some(), "{key}");
        }
        assert_eq!(attributes.value_for_key("Median"), None);
        assert_eq!(
            attributes.value_for_key("Type"),
            Some(AttributeField::Type(ColumnType::Numeric))
        );
    }
}
