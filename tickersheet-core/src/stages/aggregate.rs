//! Gold layer: per-ticker daily percent change and the published column set.

use crate::data::schema::{Layer, CLOSE, DAILY_CHANGE_PCT, DATE, TICKER};
use polars::prelude::*;
use tracing::info;

/// Turn a Silver table into a Gold table.
///
/// Rows are sorted by (Ticker, Date) before the change is computed, so the
/// previous row of a ticker is its previous trading day. An empty table is
/// returned as-is.
pub fn aggregate(silver: DataFrame) -> PolarsResult<DataFrame> {
    info!(rows = silver.height(), "starting gold aggregation");
    if silver.height() == 0 {
        return Ok(silver);
    }

    let projection: Vec<Expr> = Layer::Gold.columns().iter().map(|c| col(*c)).collect();

    silver
        .lazy()
        .sort(
            [TICKER, DATE],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .with_column(daily_change_pct().alias(DAILY_CHANGE_PCT))
        .select(projection)
        .collect()
}

/// `(Close_t / Close_{t-1} - 1) * 100` within each ticker.
///
/// The first row of a ticker has no previous close and gets 0, as does a 0/0
/// change. A move off a zero close stays infinite.
pub fn daily_change_pct() -> Expr {
    let prev_close = col(CLOSE).shift(lit(1)).over([col(TICKER)]);
    ((col(CLOSE) / prev_close - lit(1.0)) * lit(100.0))
        .fill_nan(lit(0.0))
        .fill_null(lit(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{self, VOLUME};

    fn silver(tickers: &[&str], days: &[i32], closes: &[f64]) -> DataFrame {
        let n = tickers.len();
        df!(
            "Ticker" => tickers,
            "Date" => days,
            "Open" => vec![1.0; n],
            "High" => vec![1.0; n],
            "Low" => vec![1.0; n],
            "Close" => closes,
            "Volume" => vec![100i64; n],
        )
        .unwrap()
        .lazy()
        .with_column(col("Date").cast(DataType::Date))
        .collect()
        .unwrap()
    }

    fn changes(df: &DataFrame) -> Vec<f64> {
        df.column(DAILY_CHANGE_PCT)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn first_row_per_ticker_is_zero() {
        let df = silver(
            &["MSFT", "AAPL", "MSFT", "AAPL"],
            &[1, 1, 2, 2],
            &[200.0, 100.0, 210.0, 105.0],
        );
        let gold = aggregate(df).unwrap();

        let tickers: Vec<_> = gold.column(TICKER).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(
            tickers,
            vec![Some("AAPL"), Some("AAPL"), Some("MSFT"), Some("MSFT")]
        );

        let pct = changes(&gold);
        assert_eq!(pct[0], 0.0);
        assert!((pct[1] - 5.0).abs() < 1e-9);
        assert_eq!(pct[2], 0.0);
        assert!((pct[3] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn sorts_by_date_within_ticker_before_differencing() {
        let df = silver(&["NVDA", "NVDA", "NVDA"], &[3, 1, 2], &[121.0, 100.0, 110.0]);
        let gold = aggregate(df).unwrap();

        let pct = changes(&gold);
        assert_eq!(pct[0], 0.0);
        assert!((pct[1] - 10.0).abs() < 1e-9);
        assert!((pct[2] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_to_zero_change_is_zero() {
        let df = silver(&["TSLA", "TSLA"], &[1, 2], &[0.0, 0.0]);
        let gold = aggregate(df).unwrap();
        assert_eq!(changes(&gold), vec![0.0, 0.0]);
    }

    #[test]
    fn projects_exactly_the_gold_columns() {
        let df = silver(&["JPM"], &[1], &[150.0])
            .lazy()
            .with_column(lit("extra").alias("Note"))
            .collect()
            .unwrap();
        let gold = aggregate(df).unwrap();

        let names: Vec<String> = gold
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, Layer::Gold.columns());
        assert!(schema::validate(&gold, Layer::Gold).is_ok());
        assert_eq!(gold.column(VOLUME).unwrap().i64().unwrap().get(0), Some(100));
    }

    #[test]
    fn empty_input_passes_through() {
        let empty = schema::empty(Layer::Silver);
        let out = aggregate(empty.clone()).unwrap();
        assert!(out.equals(&empty));
    }
}
