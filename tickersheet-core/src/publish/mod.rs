//! Publishing the Gold table to a spreadsheet

pub mod auth;
pub mod sheets;
pub mod values;

pub use auth::{AccessToken, Credentials};
pub use sheets::{GoogleSheetsClient, SpreadsheetSink, UpdateValuesResponse, ValueInputOption};
pub use values::to_sheet_values;

use crate::config::SheetTarget;
use crate::error::report;
use polars::prelude::{DataFrame, PolarsError};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("transport error")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed update response: {0}")]
    Decode(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("could not serialize table")]
    Serialize(#[from] PolarsError),
}

/// Overwrite `target` with `gold`, raw input mode.
///
/// Failures are logged with their full cause chain and returned; this is the
/// one stage whose errors abort the run.
pub fn publish(
    gold: &DataFrame,
    target: &SheetTarget,
    sink: &dyn SpreadsheetSink,
) -> Result<UpdateValuesResponse, PublishError> {
    info!(spreadsheet = %target.spreadsheet_id, range = %target.range(), "loading data to spreadsheet");

    let result = to_sheet_values(gold)
        .map_err(PublishError::from)
        .and_then(|values| sink.update_values(target, &values, ValueInputOption::Raw));

    match result {
        Ok(resp) => {
            info!(updated_cells = ?resp.updated_cells, "data loaded to spreadsheet");
            Ok(resp)
        }
        Err(e) => {
            error!(error = %report(&e), "error loading data to spreadsheet");
            Err(e)
        }
    }
}
