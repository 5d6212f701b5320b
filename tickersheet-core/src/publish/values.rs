//! DataFrame → spreadsheet value grid.

use crate::data::schema;
use polars::prelude::*;
use serde_json::{Number, Value};

/// Header row of column names followed by one row per record.
///
/// Every cell is a plain JSON scalar: dates as `YYYY-MM-DD` strings, numbers
/// as JSON numbers, and nulls or non-finite floats as empty strings.
pub fn to_sheet_values(df: &DataFrame) -> PolarsResult<Vec<Vec<Value>>> {
    let mut grid = Vec::with_capacity(df.height() + 1);
    grid.push(
        df.get_column_names()
            .iter()
            .map(|name| Value::String(name.to_string()))
            .collect(),
    );

    let columns = df.get_columns();
    for row in 0..df.height() {
        let cells = columns
            .iter()
            .map(|c| c.get(row).map(|v| cell_value(&v)))
            .collect::<PolarsResult<Vec<_>>>()?;
        grid.push(cells);
    }

    Ok(grid)
}

/// Unwrap one columnar value into a native JSON scalar.
pub fn cell_value(value: &AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => blank(),
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Date(days) => schema::days_to_date(*days)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or_else(blank),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => float(f64::from(*v)),
        AnyValue::Float64(v) => float(*v),
        other => Value::String(other.to_string()),
    }
}

/// Render a cell the way it appears in the sheet, for logs and previews.
pub fn cell_text(value: &AnyValue<'_>) -> String {
    match cell_value(value) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or_else(blank)
}

fn blank() -> Value {
    Value::String(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "Ticker" => &[Some("AAPL"), None],
            "Date" => &[Some(19724i32), None],
            "Close" => &[Some(98.5), None],
            "Volume" => &[1000i64, 1100],
            "Daily_Change_Pct" => &[0.0, f64::INFINITY],
        )
        .unwrap()
        .lazy()
        .with_column(col("Date").cast(DataType::Date))
        .collect()
        .unwrap()
    }

    #[test]
    fn header_row_lists_column_names() {
        let grid = to_sheet_values(&frame()).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(
            grid[0],
            vec!["Ticker", "Date", "Close", "Volume", "Daily_Change_Pct"]
        );
    }

    #[test]
    fn dates_nulls_and_numbers_are_json_scalars() {
        let grid = to_sheet_values(&frame()).unwrap();

        let row = &grid[1];
        assert_eq!(row[0], Value::String("AAPL".into()));
        assert_eq!(row[1], Value::String("2024-01-02".into()));
        assert_eq!(row[2], serde_json::json!(98.5));
        assert!(row[2].is_f64());
        assert_eq!(row[3], serde_json::json!(1000));
        assert!(row[3].is_i64());

        let row = &grid[2];
        assert_eq!(row[0], Value::String(String::new()));
        assert_eq!(row[1], Value::String(String::new()));
        assert_eq!(row[2], Value::String(String::new()));
        // Non-finite floats cannot travel as JSON numbers.
        assert_eq!(row[4], Value::String(String::new()));
    }

    #[test]
    fn grid_serializes_to_plain_json() {
        let grid = to_sheet_values(&frame()).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert!(json.starts_with(r#"[["Ticker","Date","Close","Volume","Daily_Change_Pct"],["AAPL","2024-01-02",98.5,1000,0.0]"#));
    }

    #[test]
    fn empty_frame_yields_header_only() {
        let df = crate::data::schema::empty(crate::data::Layer::Gold);
        let grid = to_sheet_values(&df).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].len(), 8);
    }

    #[test]
    fn cell_text_strips_json_quoting() {
        assert_eq!(cell_text(&AnyValue::String("MSFT")), "MSFT");
        assert_eq!(cell_text(&AnyValue::Float64(1.5)), "1.5");
        assert_eq!(cell_text(&AnyValue::Null), "");
    }
}
