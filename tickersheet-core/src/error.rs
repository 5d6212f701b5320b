//! Umbrella error for a pipeline run.

use crate::config::ConfigError;
use crate::data::{DataError, SchemaError};
use crate::publish::PublishError;
use polars::prelude::PolarsError;
use std::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("extraction failed")]
    Data(#[from] DataError),

    #[error("table operation failed")]
    Polars(#[from] PolarsError),

    #[error("schema check failed")]
    Schema(#[from] SchemaError),

    #[error("publish failed")]
    Publish(#[from] PublishError),

    #[error("configuration error")]
    Config(#[from] ConfigError),
}

/// Render an error and every source below it as `outer: inner: root`.
pub fn report(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_the_source_chain() {
        let err = PipelineError::from(PublishError::Http {
            status: 403,
            body: "The caller does not have permission".into(),
        });
        assert_eq!(
            report(&err),
            "publish failed: HTTP 403: The caller does not have permission"
        );
    }

    #[test]
    fn report_of_leaf_error_is_its_message() {
        let err = DataError::RateLimited;
        assert_eq!(report(&err), "rate limited by provider");
    }
}
