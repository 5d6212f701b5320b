//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API, one request per symbol,
//! and groups them into a single batch. There is no retry: a symbol that fails
//! is logged and left out of the batch, and only a batch where every symbol
//! failed is reported as an error.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::provider::{DataError, FetchWindow, GroupedBars, MarketDataSource, SymbolBars};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(CHART_BASE_URL)
    }

    /// Provider pointed at a different chart endpoint (proxies, local mocks).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the chart API URL for a symbol and window.
    fn chart_url(&self, symbol: &str, window: FetchWindow) -> String {
        let start_ts = window.start.timestamp();
        let end_ts = window.end.timestamp();
        format!(
            "{}/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d&includeAdjustedClose=true",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Parse the chart API response into column vectors.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<SymbolBars, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A symbol with no trading days in the window comes back without timestamps.
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose)
            .unwrap_or_default();

        let mut bars = SymbolBars::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes.get(i).copied().flatten();

            // Skip bars where all OHLCV are None (holidays/non-trading days)
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(ts, open, high, low, close, adj_close, volume);
        }

        Ok(bars)
    }

    /// Execute the request for a single symbol.
    fn fetch_symbol(&self, symbol: &str, window: FetchWindow) -> Result<SymbolBars, DataError> {
        let url = self.chart_url(symbol, window);
        debug!(%symbol, %url, "requesting daily bars");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited);
        }
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }
}

impl MarketDataSource for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_daily(
        &self,
        symbols: &[String],
        window: FetchWindow,
    ) -> Result<GroupedBars, DataError> {
        let mut grouped = GroupedBars::new();
        let mut first_error: Option<DataError> = None;

        for symbol in symbols {
            match self.fetch_symbol(symbol, window) {
                Ok(bars) if bars.is_empty() => {
                    warn!(%symbol, "provider returned no bars");
                }
                Ok(bars) => {
                    debug!(%symbol, bars = bars.len(), "fetched");
                    grouped.insert(symbol.clone(), bars);
                }
                Err(e) => {
                    warn!(%symbol, error = %e, "fetch failed, skipping symbol");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(first) if grouped.is_empty() => Err(DataError::AllSymbolsFailed {
                attempted: symbols.len(),
                first: first.to_string(),
            }),
            _ => Ok(grouped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(symbol: &str, json: &str) -> Result<SymbolBars, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response(symbol, resp)
    }

    #[test]
    fn parses_quotes_and_adjusted_close() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800,1704292200],
            "indicators":{
                "quote":[{"open":[100.0,102.0],"high":[101.0,103.0],"low":[99.0,101.0],
                          "close":[100.0,102.0],"volume":[1000,1100]}],
                "adjclose":[{"adjclose":[98.0,100.0]}]
            }}],"error":null}}"#;

        let bars = parse("AAPL", json).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars.timestamps, vec![1704205800, 1704292200]);
        assert_eq!(bars.close, vec![Some(100.0), Some(102.0)]);
        assert_eq!(bars.adj_close, vec![Some(98.0), Some(100.0)]);
        assert_eq!(bars.volume, vec![Some(1000), Some(1100)]);
    }

    #[test]
    fn skips_rows_with_no_values() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1,2],
            "indicators":{
                "quote":[{"open":[null,5.0],"high":[null,6.0],"low":[null,4.0],
                          "close":[null,5.5],"volume":[null,10]}]
            }}],"error":null}}"#;

        let bars = parse("MSFT", json).unwrap();
        assert_eq!(bars.timestamps, vec![2]);
        // No adjclose block at all: the column is still aligned, just empty values.
        assert_eq!(bars.adj_close, vec![None]);
    }

    #[test]
    fn missing_timestamps_yield_empty_bars() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        let bars = parse("META", json).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,
            "error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match parse("ZZZZ", json) {
            Err(DataError::SymbolNotFound { symbol }) => assert_eq!(symbol, "ZZZZ"),
            other => panic!("expected SymbolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn other_chart_errors_flag_format_change() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"x"}}}"#;
        assert!(matches!(
            parse("AAPL", json),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn chart_url_carries_window_and_adjusted_flag() {
        use chrono::{TimeZone, Utc};
        let provider = YahooProvider::with_base_url("http://localhost:9/chart/").unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let window = FetchWindow::trailing(end, 30).unwrap();
        let url = provider.chart_url("BRK-B", window);
        assert_eq!(
            url,
            format!(
                "http://localhost:9/chart/BRK-B?period1={}&period2={}&interval=1d&includeAdjustedClose=true",
                window.start.timestamp(),
                end.timestamp()
            )
        );
    }
}
