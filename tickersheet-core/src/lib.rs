//! tickersheet core — daily equity bars from Yahoo Finance to a Google Sheet.
//!
//! The job runs four stages in a straight line:
//! - Extract: fetch a trailing year of daily bars for a fixed ticker list (Bronze)
//! - Clean: coerce types, zero-fill gaps, reprice OHLC by adjusted close (Silver)
//! - Aggregate: per-ticker daily percent change and final column set (Gold)
//! - Publish: serialize to a JSON-safe grid and overwrite the sheet range
//!
//! Extraction failures degrade to an empty table; publish failures abort the
//! run. `Pipeline::handle` turns either outcome into a status string.

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod publish;
pub mod stages;
pub mod summary;

pub use config::{PipelineConfig, SheetTarget};
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the configured services can move into a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PipelineConfig>();
        require_sync::<PipelineConfig>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<publish::GoogleSheetsClient>();
        require_sync::<publish::GoogleSheetsClient>();
        require_send::<Pipeline>();
        require_sync::<Pipeline>();
    }
}
