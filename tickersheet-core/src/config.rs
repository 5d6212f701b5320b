//! Pipeline configuration — ticker list, lookback window, and sheet target.
//!
//! The defaults are the job's production constants. A TOML file may override
//! any subset of them; omitted keys keep their default value.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top US equities by market cap at the time the job was set up.
pub const DEFAULT_TICKERS: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "BRK-B", "JPM", "JNJ",
];

pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;
/// Upper bound on the lookback window, a century of calendar days.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;
pub const DEFAULT_SPREADSHEET_ID: &str = "1H779bzHVLrPaaHEuLEIRsJt1OdSXKBu02GmlhST2EjI";
pub const DEFAULT_SHEET_TAB: &str = "Stocks_Data";

/// Where the Gold table is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub tab: String,
}

impl SheetTarget {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            tab: DEFAULT_SHEET_TAB.to_string(),
        }
    }

    /// A1 range anchored at the first cell of the tab.
    pub fn range(&self) -> String {
        format!("{}!A1", self.tab)
    }
}

impl Default for SheetTarget {
    fn default() -> Self {
        Self::new(DEFAULT_SPREADSHEET_ID)
    }
}

/// Immutable configuration handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tickers: Vec<String>,
    pub lookback_days: u32,
    pub target: SheetTarget,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            target: SheetTarget::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::Invalid("ticker list is empty".into()));
        }
        if let Some(blank) = self.tickers.iter().position(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("ticker #{blank} is blank")));
        }
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        if self.target.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::Invalid("spreadsheet_id is empty".into()));
        }
        if self.target.tab.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet tab is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
