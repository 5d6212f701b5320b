use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

pub const TICKER: &str = "Ticker";
pub const DATE: &str = "Date";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const ADJ_CLOSE: &str = "Adj_Close";
pub const VOLUME: &str = "Volume";
pub const DAILY_CHANGE_PCT: &str = "Daily_Change_Pct";

/// Price columns that are rescaled by the adjusted-close ratio.
pub const RATIO_ADJUSTED: [&str; 3] = [OPEN, HIGH, LOW];

/// Days from 0001-01-01 (day 1 of the common era) to 1970-01-01, the Date epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Physical value of a calendar date inside a `Date` column.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Calendar date for a physical `Date` value.
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Stage of the price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Bronze,
    Silver,
    Gold,
}

impl Layer {
    /// Column names in output order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Layer::Bronze => &[TICKER, DATE, OPEN, HIGH, LOW, CLOSE, ADJ_CLOSE, VOLUME],
            Layer::Silver => &[TICKER, DATE, OPEN, HIGH, LOW, CLOSE, VOLUME],
            Layer::Gold => &[
                TICKER,
                DATE,
                OPEN,
                HIGH,
                LOW,
                CLOSE,
                VOLUME,
                DAILY_CHANGE_PCT,
            ],
        }
    }

    /// Canonical schema for this layer.
    pub fn schema(self) -> Schema {
        Schema::from_iter(
            self.columns()
                .iter()
                .map(|name| Field::new((*name).into(), column_dtype(name))),
        )
    }
}

/// Canonical dtype of a price-table column.
pub fn column_dtype(name: &str) -> DataType {
    match name {
        TICKER => DataType::String,
        DATE => DataType::Date,
        VOLUME => DataType::Int64,
        _ => DataType::Float64,
    }
}

/// Validate a DataFrame against the layer schema.
///
/// Extra columns are tolerated; missing columns and dtype mismatches are not.
pub fn validate(df: &DataFrame, layer: Layer) -> Result<(), SchemaError> {
    let expected = layer.schema();
    let actual = df.schema();

    for field in expected.iter_fields() {
        let actual_dtype = actual
            .get(field.name())
            .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
        if actual_dtype != field.dtype() {
            return Err(SchemaError::TypeMismatch {
                column: field.name().to_string(),
                expected: field.dtype().clone(),
                actual: actual_dtype.clone(),
            });
        }
    }

    Ok(())
}

/// An empty frame carrying the layer's columns.
pub fn empty(layer: Layer) -> DataFrame {
    DataFrame::empty_with_schema(&layer.schema())
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}
