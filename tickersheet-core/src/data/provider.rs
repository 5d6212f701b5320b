//! Market-data source trait and structured error types.
//!
//! The MarketDataSource trait abstracts over where daily bars come from
//! (Yahoo Finance in production, in-memory fixtures in tests). A source answers
//! one batched request for many symbols with bars grouped by symbol.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Raw daily bars for one symbol, exactly as the provider reported them.
///
/// Columns are parallel vectors of equal length. Timestamps are Unix seconds and
/// are only turned into calendar dates by the extractor, which drops rows whose
/// timestamp does not convert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolBars {
    pub timestamps: Vec<i64>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub adj_close: Vec<Option<f64>>,
    pub volume: Vec<Option<i64>>,
}

impl SymbolBars {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(n),
            open: Vec::with_capacity(n),
            high: Vec::with_capacity(n),
            low: Vec::with_capacity(n),
            close: Vec::with_capacity(n),
            adj_close: Vec::with_capacity(n),
            volume: Vec::with_capacity(n),
        }
    }

    /// Append one bar.
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        timestamp: i64,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        adj_close: Option<f64>,
        volume: Option<i64>,
    ) {
        self.timestamps.push(timestamp);
        self.open.push(open);
        self.high.push(high);
        self.low.push(low);
        self.close.push(close);
        self.adj_close.push(adj_close);
        self.volume.push(volume);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Bars for a batch of symbols, keyed by symbol.
pub type GroupedBars = BTreeMap<String, SymbolBars>;

/// Requested time window, inclusive of both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// Window of `days` calendar days ending at `end`.
    ///
    /// Fails when the start would fall outside the representable date range.
    pub fn trailing(end: DateTime<Utc>, days: u32) -> Result<Self, DataError> {
        let start = TimeDelta::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or(DataError::WindowOutOfRange { days })?;
        Ok(Self { start, end })
    }
}

/// Structured error types for market-data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("all {attempted} symbols failed; first error: {first}")]
    AllSymbolsFailed { attempted: usize, first: String },

    #[error("lookback of {days} days reaches before the earliest representable date")]
    WindowOutOfRange { days: u32 },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for market-data sources.
///
/// Implementations fetch every symbol of the batch and return whatever bars
/// they got. A symbol that yields nothing is simply absent from the map.
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars (with adjusted close) for `symbols`, grouped by symbol.
    fn fetch_daily(&self, symbols: &[String], window: FetchWindow)
        -> Result<GroupedBars, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn trailing_window_spans_requested_days() {
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 12, 0, 0).unwrap();
        let window = FetchWindow::trailing(end, 365).unwrap();
        assert_eq!(window.end, end);
        assert_eq!((window.end - window.start).num_days(), 365);
    }

    #[test]
    fn trailing_window_past_the_calendar_is_an_error() {
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 12, 0, 0).unwrap();
        let result = FetchWindow::trailing(end, u32::MAX);
        assert!(matches!(
            result,
            Err(DataError::WindowOutOfRange { days }) if days == u32::MAX
        ));
    }

    #[test]
    fn symbol_bars_push_keeps_columns_aligned() {
        let mut bars = SymbolBars::with_capacity(2);
        assert!(bars.is_empty());
        bars.push(1, Some(1.0), Some(2.0), Some(0.5), Some(1.5), Some(1.4), Some(10));
        bars.push(2, None, None, None, None, None, None);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars.open.len(), 2);
        assert_eq!(bars.volume, vec![Some(10), None]);
    }

    #[test]
    fn all_symbols_failed_message_names_first_error() {
        let err = DataError::AllSymbolsFailed {
            attempted: 3,
            first: "symbol not found: XYZ".into(),
        };
        assert_eq!(
            err.to_string(),
            "all 3 symbols failed; first error: symbol not found: XYZ"
        );
    }
}
