use std::collections::BTreeSet;
use std::io::Write;

use polars::prelude::*;

/// Keeps the listed columns that exist, in list order. Missing ones are left out.
pub fn project(df: &DataFrame, columns: &[String]) -> Result<DataFrame, PolarsError> {
    let mut selected: Vec<&str> = Vec::with_capacity(columns.len());
    for name in columns {
        if df.column(name).is_ok() && !selected.contains(&name.as_str()) {
            selected.push(name.as_str());
        }
    }
    df.select(selected)
}

/// UTF-8 CSV with a header row and no index column; nulls become empty fields.
pub fn write_csv<W: Write>(df: &DataFrame, writer: &mut W) -> Result<(), PolarsError> {
    let mut frame = df.clone();
    CsvWriter::new(writer)
        .include_header(true)
        .finish(&mut frame)
}

pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>, PolarsError> {
    let mut buffer = Vec::new();
    write_csv(df, &mut buffer)?;
    Ok(buffer)
}

/// Sorted distinct non-null values of a column, rendered as text. Used to
/// offer the values a filter can take.
pub fn distinct_values(df: &DataFrame, column: &str) -> Result<Vec<String>, PolarsError> {
    let Ok(values) = df.column(column) else {
        return Ok(Vec::new());
    };
    let rendered = values.cast(&DataType::String)?;
    let text = rendered.str()?;

    let unique: BTreeSet<String> = text.into_iter().flatten().map(str::to_string).collect();
    Ok(unique.into_iter().collect())
}

/// Renders one cell for display; nulls are blank.
pub fn cell_text(column: &Column, idx: usize) -> Result<String, PolarsError> {
    Ok(match column.get(idx)? {
        AnyValue::Null => String::new(),
        AnyValue::String(text) => text.to_string(),
        other => other.to_string(),
    })
}
