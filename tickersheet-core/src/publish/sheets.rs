//! Google Sheets v4 `spreadsheets.values.update` client.

use super::auth::Credentials;
use super::PublishError;
use crate::config::SheetTarget;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// How the receiving service interprets written values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInputOption {
    /// Stored literally: no formula evaluation, no locale parsing.
    Raw,
}

impl ValueInputOption {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<Value>],
}

/// Response body of a values update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    pub spreadsheet_id: Option<String>,
    pub updated_range: Option<String>,
    pub updated_rows: Option<u64>,
    pub updated_columns: Option<u64>,
    pub updated_cells: Option<u64>,
}

/// Destination for the value grid.
pub trait SpreadsheetSink: Send + Sync {
    /// Overwrite the target range, starting at its first cell, with `values`.
    fn update_values(
        &self,
        target: &SheetTarget,
        values: &[Vec<Value>],
        input: ValueInputOption,
    ) -> Result<UpdateValuesResponse, PublishError>;
}

/// Sheets API over blocking HTTP.
pub struct GoogleSheetsClient {
    client: reqwest::blocking::Client,
    base_url: String,
    credentials: Credentials,
}

impl GoogleSheetsClient {
    pub fn new(credentials: Credentials) -> Result<Self, PublishError> {
        Self::with_base_url(SHEETS_BASE_URL, credentials)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self, PublishError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(PublishError::Transport)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
        })
    }

    /// `{base}/spreadsheets/{id}/values/{range}?valueInputOption=...`, with the
    /// id and range percent-encoded as path segments.
    fn update_url(
        &self,
        target: &SheetTarget,
        input: ValueInputOption,
    ) -> Result<Url, PublishError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PublishError::InvalidTarget(format!("{}: {e}", self.base_url)))?;
        {
            let range = target.range();
            let mut segments = url.path_segments_mut().map_err(|_| {
                PublishError::InvalidTarget(format!("{} cannot be a base URL", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["spreadsheets", target.spreadsheet_id.as_str(), "values", range.as_str()]);
        }
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());
        Ok(url)
    }
}

impl SpreadsheetSink for GoogleSheetsClient {
    fn update_values(
        &self,
        target: &SheetTarget,
        values: &[Vec<Value>],
        input: ValueInputOption,
    ) -> Result<UpdateValuesResponse, PublishError> {
        let url = self.update_url(target, input)?;
        let token = self.credentials.token(&self.client)?;
        let range = target.range();
        let body = ValueRange {
            range: &range,
            major_dimension: "ROWS",
            values,
        };

        debug!(%url, rows = values.len(), "updating sheet values");
        let resp = self
            .client
            .put(url)
            .bearer_auth(token.secret())
            .json(&body)
            .send()
            .map_err(PublishError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(PublishError::Http {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .map_err(|e| PublishError::Decode(e.to_string()))
    }
}
