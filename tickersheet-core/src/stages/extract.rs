//! Bronze layer: fetch grouped daily bars and stack them into long form.

use crate::config::PipelineConfig;
use crate::data::schema::{
    self, Layer, ADJ_CLOSE, CLOSE, DATE, HIGH, LOW, OPEN, TICKER, VOLUME,
};
use crate::data::{FetchWindow, GroupedBars, MarketDataSource};
use crate::error::{report, PipelineError};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use tracing::{error, info, warn};

/// Fetch the configured tickers over the trailing window ending at `now`.
///
/// Never fails: a source error is logged and turned into an empty Bronze table,
/// which every later stage passes through untouched.
pub fn extract(source: &dyn MarketDataSource, config: &PipelineConfig, now: DateTime<Utc>) -> DataFrame {
    info!(source = source.name(), tickers = config.tickers.len(), "starting extraction");
    match fetch_bronze(source, config, now) {
        Ok(df) if df.height() == 0 => {
            warn!("no data returned by provider, nothing to process");
            df
        }
        Ok(df) => {
            info!(rows = df.height(), "extraction complete");
            df
        }
        Err(e) => {
            error!(error = %report(&e), "error extracting data");
            schema::empty(Layer::Bronze)
        }
    }
}

fn fetch_bronze(
    source: &dyn MarketDataSource,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> Result<DataFrame, PipelineError> {
    let window = FetchWindow::trailing(now, config.lookback_days)?;
    let grouped = source.fetch_daily(&config.tickers, window)?;
    Ok(stack(&grouped)?)
}

/// Flatten per-ticker column groups into one row per (date, ticker).
///
/// Timestamps become calendar dates (UTC); a timestamp chrono cannot represent
/// drops its row. Output is ordered by date, then ticker.
pub fn stack(grouped: &GroupedBars) -> PolarsResult<DataFrame> {
    let capacity = grouped.values().map(|b| b.len()).sum();
    let mut tickers: Vec<&str> = Vec::with_capacity(capacity);
    let mut dates: Vec<i32> = Vec::with_capacity(capacity);
    let mut opens: Vec<Option<f64>> = Vec::with_capacity(capacity);
    let mut highs: Vec<Option<f64>> = Vec::with_capacity(capacity);
    let mut lows: Vec<Option<f64>> = Vec::with_capacity(capacity);
    let mut closes: Vec<Option<f64>> = Vec::with_capacity(capacity);
    let mut adj_closes: Vec<Option<f64>> = Vec::with_capacity(capacity);
    let mut volumes: Vec<Option<i64>> = Vec::with_capacity(capacity);
    let mut dropped = 0usize;

    for (ticker, bars) in grouped {
        for (i, &ts) in bars.timestamps.iter().enumerate() {
            let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
                dropped += 1;
                continue;
            };
            tickers.push(ticker.as_str());
            dates.push(schema::date_to_days(date));
            opens.push(bars.open.get(i).copied().flatten());
            highs.push(bars.high.get(i).copied().flatten());
            lows.push(bars.low.get(i).copied().flatten());
            closes.push(bars.close.get(i).copied().flatten());
            adj_closes.push(bars.adj_close.get(i).copied().flatten());
            volumes.push(bars.volume.get(i).copied().flatten());
        }
    }

    if dropped > 0 {
        warn!(dropped, "dropped rows with unparsable dates");
    }

    let df = DataFrame::new(vec![
        Column::new(TICKER.into(), tickers),
        Column::new(DATE.into(), dates).cast(&DataType::Date)?,
        Column::new(OPEN.into(), opens),
        Column::new(HIGH.into(), highs),
        Column::new(LOW.into(), lows),
        Column::new(CLOSE.into(), closes),
        Column::new(ADJ_CLOSE.into(), adj_closes),
        Column::new(VOLUME.into(), volumes),
    ])?;

    df.lazy()
        .sort(
            [DATE, TICKER],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()
}
