// src/table/join.rs
use crate::table::frame::{to_batch, to_frame};
use anyhow::{bail, Context, Result};
use arrow::record_batch::RecordBatch;
use polars::prelude::{self as pl, IntoLazy, JoinArgs, JoinType, SortMultipleOptions, UniqueKeepStrategy};
use tracing::debug;

const ROW: &str = "__row";
const KEY: &str = "__key";

/// Left join on a single key column, matched on the key's text form. Every
/// left row is kept in order; right rows are matched on the first occurrence
/// of the key, unmatched rows get nulls. Right-hand columns other than the
/// key must not clash with left names.
pub fn left_join(left: &RecordBatch, right: &RecordBatch, key: &str) -> Result<RecordBatch> {
    let left_schema = left.schema();
    let mut extra = Vec::new();
    for field in right.schema().fields() {
        if field.name() == key {
            continue;
        }
        if left_schema.index_of(field.name()).is_ok() {
            bail!("join would duplicate column `{}`", field.name());
        }
        extra.push(pl::col(field.name().as_str()));
    }
    let text_key = || pl::col(key).cast(pl::DataType::String).alias(KEY);

    let mut lookup = vec![pl::col(KEY)];
    lookup.extend(extra.iter().cloned());
    let right = to_frame(right)?
        .lazy()
        .with_column(text_key())
        .filter(pl::col(KEY).is_not_null())
        .unique_stable(Some(vec![KEY.into()]), UniqueKeepStrategy::First)
        .select(lookup);

    let mut keep: Vec<pl::Expr> = left_schema
        .fields()
        .iter()
        .map(|f| pl::col(f.name().as_str()))
        .collect();
    keep.extend(extra);
    let joined = to_frame(left)?
        .lazy()
        .with_row_index(ROW, None)
        .with_column(text_key())
        .join(right, [pl::col(KEY)], [pl::col(KEY)], JoinArgs::new(JoinType::Left))
        .sort_by_exprs([pl::col(ROW)], SortMultipleOptions::default())
        .select(keep)
        .collect()
        .with_context(|| format!("left join on `{}`", key))?;
    debug!(rows = joined.height(), key, "left join");

    to_batch(&joined)
}
