use std::fmt::Write;
use std::ops::Range;

use crate::data::model::DataTable;
use crate::stats::attributes::{AttributeField, ATTRIBUTE_NAMES};

const LABEL_WIDTH: usize = 10;
const COLUMN_WIDTH: usize = 20;

/// Render the attribute table of every column.
pub fn describe(table: &DataTable) -> String {
    describe_range(table, 0..table.column_count())
}

/// Render the attribute table for the columns whose index falls in `range`.
/// Columns without computed attributes show `-` in every cell.
pub fn describe_range(table: &DataTable, range: Range<usize>) -> String {
    let columns: Vec<_> = table
        .columns()
        .enumerate()
        .filter(|(index, _)| range.contains(index))
        .map(|(_, column)| column)
        .collect();

    let width = LABEL_WIDTH + COLUMN_WIDTH * columns.len();
    let rule = format!("{:<LABEL_WIDTH$}{}", "", "-".repeat(width - LABEL_WIDTH));

    let mut out = String::new();
    let mut header = sized("", LABEL_WIDTH);
    for column in &columns {
        header.push_str(&sized(&format!("{} ", column.name), COLUMN_WIDTH));
    }
    let _ = writeln!(out, "{}", header.trim_end());
    let _ = writeln!(out, "{rule}");

    for name in ATTRIBUTE_NAMES {
        let mut line = sized(&format!("{name}|"), LABEL_WIDTH);
        for column in &columns {
            let field = column.attributes().and_then(|a| a.value_for_key(name));
            line.push_str(&sized(&format_field(field), COLUMN_WIDTH));
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let _ = writeln!(out, "{rule}");
    out
}

fn format_field(field: Option<AttributeField>) -> String {
    match field {
        Some(AttributeField::Type(column_type)) => format!("{column_type}|"),
        Some(AttributeField::Count(count)) => format!("{count}|"),
        Some(AttributeField::Value(v)) if v.is_finite() => format!("{v:.6}|"),
        _ => "-|".to_string(),
    }
}

/// Right-align `text` in `width` characters, truncating from the left when too long.
fn sized(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.chars().skip(len - width).collect()
    } else {
        format!("{text:>width$}")
    }
}
