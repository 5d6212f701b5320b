//! Silver layer: type coercion, gap filling, and split/dividend repricing.

use crate::data::schema::{
    self, Layer, ADJ_CLOSE, CLOSE, HIGH, LOW, OPEN, RATIO_ADJUSTED, VOLUME,
};
use polars::prelude::*;
use tracing::{debug, info, warn};

const PRICE_COLUMNS: [&str; 4] = [OPEN, HIGH, LOW, CLOSE];

/// Turn a Bronze table into a Silver table.
///
/// An empty table is returned as-is.
pub fn clean(bronze: DataFrame) -> PolarsResult<DataFrame> {
    info!(rows = bronze.height(), "starting silver transform");
    if bronze.height() == 0 {
        return Ok(bronze);
    }

    let df = ensure_columns(bronze)?;
    if adj_close_is_missing(&df)? {
        warn!("adjusted close is entirely null, repricing will zero every price");
    }
    let df = coerce_types(df.lazy()).collect()?;
    let df = adjust_prices(df)?;

    let silver = df
        .lazy()
        .with_columns(PRICE_COLUMNS.map(|c| zero_filled(col(c))))
        .collect()?;

    debug!(rows = silver.height(), "silver transform complete");
    Ok(silver)
}

/// Insert an all-null column for every Bronze column the table lacks.
pub fn ensure_columns(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let height = df.height();
    for name in Layer::Bronze.columns() {
        if df.column(name).is_err() {
            warn!(column = *name, "missing column, inserting nulls");
            df.with_column(Series::full_null(
                (*name).into(),
                height,
                &schema::column_dtype(name),
            ))?;
        }
    }
    Ok(df)
}

/// Coerce Volume to a non-negative integer and prices to floats, zero for anything
/// missing or unparsable.
pub fn coerce_types(lf: LazyFrame) -> LazyFrame {
    let volume = col(VOLUME)
        .cast(DataType::Float64)
        .fill_nan(lit(0.0))
        .cast(DataType::Int64)
        .fill_null(lit(0i64));
    let volume = when(volume.clone().gt(lit(0i64)))
        .then(volume)
        .otherwise(lit(0i64))
        .alias(VOLUME);

    let mut exprs = vec![volume];
    exprs.extend(
        [OPEN, HIGH, LOW, CLOSE, ADJ_CLOSE]
            .into_iter()
            .map(|c| zero_filled(col(c).cast(DataType::Float64)).alias(c)),
    );
    lf.with_columns(exprs)
}

/// Reprice Open/High/Low by `Adj_Close / Close` row by row and replace Close
/// with Adj_Close, then drop Adj_Close.
///
/// The repricing is skipped when Close holds no non-zero value at all; the
/// ratio is undefined for every row then and the raw prices are kept. A table
/// without Adj_Close is returned unchanged, and one without Close only loses
/// its Adj_Close.
pub fn adjust_prices(df: DataFrame) -> PolarsResult<DataFrame> {
    if df.column(ADJ_CLOSE).is_err() {
        return Ok(df);
    }

    if df.column(CLOSE).is_err() {
        warn!("close column is missing, skipping price adjustment");
        return df.drop(ADJ_CLOSE);
    }

    if !close_is_priced(&df)? {
        warn!("close is entirely null or zero, skipping price adjustment");
        return df.drop(ADJ_CLOSE);
    }

    let ratio = col(ADJ_CLOSE) / col(CLOSE);
    let mut exprs: Vec<Expr> = RATIO_ADJUSTED
        .iter()
        .map(|c| (col(*c) * ratio.clone()).alias(*c))
        .collect();
    exprs.push(col(ADJ_CLOSE).alias(CLOSE));

    df.lazy().with_columns(exprs).collect()?.drop(ADJ_CLOSE)
}

/// Whether Close carries at least one usable (non-null, non-zero, non-NaN) price.
fn close_is_priced(df: &DataFrame) -> PolarsResult<bool> {
    let close = df.column(CLOSE)?.cast(&DataType::Float64)?;
    let priced = close
        .f64()?
        .into_iter()
        .any(|v| matches!(v, Some(c) if c != 0.0 && !c.is_nan()));
    Ok(priced)
}

/// Whether Adj_Close has no value in any row, before it is zero-filled.
fn adj_close_is_missing(df: &DataFrame) -> PolarsResult<bool> {
    Ok(df.column(ADJ_CLOSE)?.null_count() == df.height())
}

fn zero_filled(e: Expr) -> Expr {
    e.fill_nan(lit(0.0)).fill_null(lit(0.0))
}
