//! Bronze → Silver → Gold table stages

pub mod aggregate;
pub mod clean;
pub mod extract;

pub use aggregate::aggregate;
pub use clean::{adjust_prices, clean};
pub use extract::{extract, stack};
