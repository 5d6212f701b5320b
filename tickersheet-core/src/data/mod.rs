//! Market data: source trait, Yahoo provider, and price-table schema

pub mod provider;
pub mod schema;
pub mod yahoo;

pub use provider::{DataError, FetchWindow, GroupedBars, MarketDataSource, SymbolBars};
pub use schema::{Layer, SchemaError};
pub use yahoo::YahooProvider;
