//! Pipeline orchestrator — extract → clean → aggregate → publish, once per call.

use crate::config::PipelineConfig;
use crate::data::schema::{self, Layer};
use crate::data::MarketDataSource;
use crate::error::{report, PipelineError};
use crate::publish::{self, SpreadsheetSink};
use crate::stages;
use crate::summary::TableSummary;
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info, warn};

pub const SUCCESS_MESSAGE: &str = "Pipeline executed successfully!";
pub const ERROR_PREFIX: &str = "Pipeline error: ";

/// How a run ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The Gold table was written to the sheet.
    Published {
        rows: usize,
        updated_cells: Option<u64>,
    },
    /// Nothing came back from the provider; publication was skipped.
    NoData,
}

/// The batch job: a configuration plus its two external services.
pub struct Pipeline {
    config: PipelineConfig,
    source: Box<dyn MarketDataSource>,
    sink: Box<dyn SpreadsheetSink>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn MarketDataSource>,
        sink: Box<dyn SpreadsheetSink>,
    ) -> Self {
        Self {
            config,
            source,
            sink,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Entry point of the job. The request payload is ignored.
    ///
    /// Never fails and never unwinds: every error, and any panic raised inside
    /// a stage, comes back as an error status string.
    pub fn handle<R: ?Sized>(&self, _request: &R) -> String {
        info!("request received, starting pipeline");

        match panic::catch_unwind(AssertUnwindSafe(|| self.run())) {
            Ok(Ok(_)) => SUCCESS_MESSAGE.to_string(),
            Ok(Err(e)) => {
                let message = report(&e);
                error!(error = %message, "error during pipeline execution");
                format!("{ERROR_PREFIX}{message}")
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "pipeline panicked");
                format!("{ERROR_PREFIX}{message}")
            }
        }
    }

    /// Run all stages with the window ending now.
    pub fn run(&self) -> Result<RunOutcome, PipelineError> {
        self.run_at(Utc::now())
    }

    /// Run all stages with the window ending at `now`.
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        let gold = self.prepare_at(now)?;

        if gold.height() == 0 {
            warn!("gold table is empty, nothing was loaded");
            return Ok(RunOutcome::NoData);
        }

        schema::validate(&gold, Layer::Gold)?;
        TableSummary::of(&gold, "gold layer")?.log();

        let resp = publish::publish(&gold, &self.config.target, self.sink.as_ref())?;
        info!("ETL flow and spreadsheet load complete");

        Ok(RunOutcome::Published {
            rows: gold.height(),
            updated_cells: resp.updated_cells,
        })
    }

    /// Extract, clean, and aggregate with the window ending now, without publishing.
    pub fn prepare(&self) -> Result<DataFrame, PipelineError> {
        self.prepare_at(Utc::now())
    }

    /// Extract, clean, and aggregate without publishing.
    pub fn prepare_at(&self, now: DateTime<Utc>) -> Result<DataFrame, PipelineError> {
        let bronze = stages::extract(self.source.as_ref(), &self.config, now);
        let silver = stages::clean(bronze)?;
        let gold = stages::aggregate(silver)?;
        Ok(gold)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
