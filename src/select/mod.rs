//! Row selection: predicates, boolean masks and string queries.

pub mod predicate;
pub mod query;

use anyhow::{Context, Result};
use arrow::{compute::filter_record_batch, record_batch::RecordBatch};
use std::collections::HashMap;
use tracing::debug;

pub use predicate::{col, CmpOp, Predicate, TextMatch, Value};
pub use query::parse_query;

/// Keep the rows where `predicate` holds.
pub fn filter(batch: &RecordBatch, predicate: &Predicate) -> Result<RecordBatch> {
    let mask = predicate.mask(batch)?;
    let out = filter_record_batch(batch, &mask).context("filtering rows")?;
    debug!(before = batch.num_rows(), after = out.num_rows(), "filter");
    Ok(out)
}

/// Number of rows matching `predicate`.
pub fn count(batch: &RecordBatch, predicate: &Predicate) -> Result<usize> {
    Ok(predicate.mask(batch)?.true_count())
}

/// Parse `expr` with [`parse_query`] and filter by it.
pub fn query(batch: &RecordBatch, expr: &str, vars: &HashMap<String, Value>) -> Result<RecordBatch> {
    let predicate = parse_query(expr, vars).with_context(|| format!("query `{}`", expr))?;
    filter(batch, &predicate)
}
