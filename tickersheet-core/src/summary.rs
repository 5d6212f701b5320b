//! Short, log-friendly description of a price table.

use crate::data::schema::{self, DATE};
use crate::publish::values::cell_text;
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::info;

const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub width: usize,
    pub max_date: Option<NaiveDate>,
    pub columns: Vec<String>,
    pub dtypes: Vec<(String, String)>,
    /// First rows, column by column, rendered as the sheet would show them.
    pub preview: Vec<(String, Vec<String>)>,
}

impl TableSummary {
    pub fn of(df: &DataFrame, name: &str) -> PolarsResult<Self> {
        let columns: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        let dtypes = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect();

        let head = df.head(Some(PREVIEW_ROWS));
        let preview = head
            .get_columns()
            .iter()
            .map(|c| -> PolarsResult<(String, Vec<String>)> {
                let cells = (0..head.height())
                    .map(|i| c.get(i).map(|v| cell_text(&v)))
                    .collect::<PolarsResult<Vec<_>>>()?;
                Ok((c.name().to_string(), cells))
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            rows: df.height(),
            width: df.width(),
            max_date: max_date(df),
            columns,
            dtypes,
            preview,
        })
    }

    pub fn log(&self) {
        info!(
            rows = self.rows,
            max_date = ?self.max_date,
            "=== short description of {} ===",
            self.name
        );
        info!("shape: ({}, {})", self.rows, self.width);
        info!("columns: {:?}", self.columns);
        info!("dtypes: {:?}", self.dtypes);
        info!("preview ({PREVIEW_ROWS} rows): {:?}", self.preview);
    }
}

fn max_date(df: &DataFrame) -> Option<NaiveDate> {
    let dates = df.column(DATE).ok()?.date().ok()?;
    (0..dates.len())
        .filter_map(|i| dates.get(i))
        .max()
        .and_then(schema::days_to_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_shape_dates_and_preview() {
        let df = df!(
            "Ticker" => &["AAPL", "AAPL", "MSFT", "MSFT", "MSFT", "MSFT"],
            "Date" => &[19724i32, 19725, 19724, 19725, 19726, 19723],
            "Close" => &[98.0, 100.0, 370.0, 371.0, 372.0, 369.5],
        )
        .unwrap()
        .lazy()
        .with_column(col("Date").cast(DataType::Date))
        .collect()
        .unwrap();

        let s = TableSummary::of(&df, "gold").unwrap();
        assert_eq!(s.rows, 6);
        assert_eq!(s.width, 3);
        assert_eq!(s.max_date, NaiveDate::from_ymd_opt(2024, 1, 4));
        assert_eq!(s.columns, vec!["Ticker", "Date", "Close"]);
        assert_eq!(s.dtypes[1], ("Date".to_string(), "date".to_string()));

        assert_eq!(s.preview.len(), 3);
        assert_eq!(s.preview[0].1.len(), PREVIEW_ROWS);
        assert_eq!(s.preview[1].1[0], "2024-01-02");
        assert_eq!(s.preview[2].1[0], "98.0");
    }

    #[test]
    fn no_date_column_means_no_max_date() {
        let df = df!("Ticker" => &["AAPL"]).unwrap();
        let s = TableSummary::of(&df, "bare").unwrap();
        assert_eq!(s.max_date, None);
    }
}
