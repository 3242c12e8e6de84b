//! Split-apply-combine over key columns.
//!
//! Groups come out in ascending key order. Rows whose key has a null
//! component belong to no group. Aggregation, broadcast and ranking run as
//! polars queries; the per-group callbacks get Arrow sub-tables.

pub mod agg;
pub mod key;

use crate::sort::nlargest;
use crate::table::{array_of, column, concat, frame_of, take_rows, to_batch};
use anyhow::{anyhow, bail, Context, Result};
use arrow::{array::ArrayRef, record_batch::RecordBatch};
use polars::prelude::{
    self as pl, lit, when, IntoLazy, RankMethod, RankOptions, SortMultipleOptions, SortOptions,
    NULL,
};
use tracing::debug;

pub use agg::{Agg, AggFunc};
pub use key::{display_key, key_values, KeyValue};

const ROW: &str = "__row";

pub struct GroupBy<'a> {
    batch: &'a RecordBatch,
    keys: Vec<String>,
    groups: Vec<(Vec<KeyValue>, Vec<u32>)>,
}

impl<'a> GroupBy<'a> {
    pub fn new(batch: &'a RecordBatch, keys: &[&str]) -> Result<Self> {
        if keys.is_empty() {
            bail!("group by needs at least one key column");
        }
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let by = key_exprs(&keys);

        let rows = frame_of(batch, &names(&keys, &[]))?
            .lazy()
            .with_row_index(ROW, None)
            .filter(not_null(&keys))
            .group_by(by.clone())
            .agg([pl::col(ROW).sort(SortOptions::default())])
            .sort_by_exprs(by, SortMultipleOptions::default())
            .select([pl::col(ROW)])
            .collect()
            .with_context(|| format!("grouping by {:?}", keys))?;

        let key_columns = keys
            .iter()
            .map(|k| key_values(column(batch, k)?))
            .collect::<Result<Vec<_>>>()?;
        let mut groups = Vec::with_capacity(rows.height());
        for idx in rows.column(ROW)?.as_materialized_series().list()?.into_iter().flatten() {
            let idx: Vec<u32> = idx.idx()?.into_no_null_iter().collect();
            let Some(&first) = idx.first() else { continue };
            let key = key_columns.iter().map(|c| c[first as usize].clone()).collect();
            groups.push((key, idx));
        }
        debug!(keys = ?keys, groups = groups.len(), rows = batch.num_rows(), "grouped");

        Ok(GroupBy { batch, keys, groups })
    }

    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn key_names(&self) -> &[String] {
        &self.keys
    }

    /// Rows with a complete key, carrying the key columns plus `extra`.
    fn grouped(&self, extra: &[&str]) -> Result<pl::LazyGroupBy> {
        Ok(frame_of(self.batch, &names(&self.keys, extra))?
            .lazy()
            .filter(not_null(&self.keys))
            .group_by(key_exprs(&self.keys)))
    }

    fn collect(&self, grouped: pl::LazyGroupBy, exprs: Vec<pl::Expr>) -> Result<RecordBatch> {
        let out = grouped
            .agg(exprs)
            .sort_by_exprs(key_exprs(&self.keys), SortMultipleOptions::default())
            .collect()
            .with_context(|| format!("aggregating groups of {:?}", self.keys))?;
        to_batch(&out)
    }

    /// Row count per group as `size`.
    pub fn size(&self) -> Result<RecordBatch> {
        let size = pl::len().cast(pl::DataType::Int64).alias("size");
        self.collect(self.grouped(&[])?, vec![size])
    }

    /// Key columns followed by one column per aggregation.
    pub fn agg(&self, aggs: &[Agg]) -> Result<RecordBatch> {
        let exprs = aggs
            .iter()
            .map(|a| -> Result<pl::Expr> {
                let integer = column(self.batch, &a.column)?.data_type().is_integer();
                Ok(a.func.expr(&a.column, integer).alias(a.alias.as_str()))
            })
            .collect::<Result<Vec<_>>>()?;
        let sources: Vec<&str> = aggs.iter().map(|a| a.column.as_str()).collect();
        self.collect(self.grouped(&sources)?, exprs)
    }

    /// Evaluate a per-row window expression over the groups, null outside them.
    fn window(&self, name: &str, expr: pl::Expr) -> Result<ArrayRef> {
        let out = frame_of(self.batch, &names(&self.keys, &[name]))?
            .lazy()
            .select([when(not_null(&self.keys))
                .then(expr.over(key_exprs(&self.keys)).cast(pl::DataType::Float64))
                .otherwise(lit(NULL).cast(pl::DataType::Float64))
                .alias("out")])
            .collect()
            .with_context(|| format!("windowing `{}` over {:?}", name, self.keys))?;
        array_of(&out, "out")
    }

    /// Broadcast a group statistic back to every row (as `Float64`).
    pub fn transform(&self, name: &str, func: AggFunc) -> Result<ArrayRef> {
        self.window(name, func.expr(name, false))
    }

    /// Keep the rows of groups for which `keep` returns true, in input order.
    pub fn filter<F>(&self, mut keep: F) -> Result<RecordBatch>
    where
        F: FnMut(&RecordBatch) -> Result<bool>,
    {
        let mut rows = Vec::new();
        for (_, idx) in &self.groups {
            if keep(&take_rows(self.batch, idx)?)? {
                rows.extend_from_slice(idx);
            }
        }
        rows.sort_unstable();
        take_rows(self.batch, &rows)
    }

    /// Run `f` on each group and stack the results in key order.
    pub fn apply<F>(&self, mut f: F) -> Result<RecordBatch>
    where
        F: FnMut(&[KeyValue], &RecordBatch) -> Result<RecordBatch>,
    {
        let mut parts = Vec::with_capacity(self.groups.len());
        for (key, idx) in &self.groups {
            let part = f(key, &take_rows(self.batch, idx)?)
                .with_context(|| format!("applying to group {}", display_key(key)))?;
            parts.push(part);
        }
        if parts.is_empty() {
            return Ok(RecordBatch::new_empty(self.batch.schema()));
        }
        concat(&parts)
    }

    /// Sub-table of the group whose key renders as `key` component-wise.
    pub fn get_group(&self, key: &[&str]) -> Result<RecordBatch> {
        let (_, idx) = self
            .groups
            .iter()
            .find(|(k, _)| {
                k.len() == key.len() && k.iter().zip(key).all(|(a, b)| a.to_string() == *b)
            })
            .ok_or_else(|| anyhow!("no group {:?} in groups of {:?}", key, self.keys))?;
        take_rows(self.batch, idx)
    }

    /// Each group's key and sub-table, in key order.
    pub fn iter(&self) -> impl Iterator<Item = Result<(&[KeyValue], RecordBatch)>> + '_ {
        self.groups
            .iter()
            .map(|(k, idx)| Ok((k.as_slice(), take_rows(self.batch, idx)?)))
    }

    /// Average-method rank of `name` within each group, aligned with the
    /// input rows. Rows outside every group get null.
    pub fn rank(&self, name: &str, descending: bool) -> Result<ArrayRef> {
        let options = RankOptions {
            method: RankMethod::Average,
            descending,
        };
        let expr = pl::col(name).cast(pl::DataType::Float64).rank(options, None);
        self.window(name, expr)
    }

    /// Top `n` rows by `name` within each group.
    pub fn nlargest(&self, n: usize, name: &str) -> Result<RecordBatch> {
        self.apply(|_, g| nlargest(g, n, name))
    }
}

pub(crate) fn key_exprs(keys: &[String]) -> Vec<pl::Expr> {
    keys.iter().map(|k| pl::col(k.as_str())).collect()
}

/// True where every key column is present.
pub(crate) fn not_null(keys: &[String]) -> pl::Expr {
    keys.iter()
        .map(|k| pl::col(k.as_str()).is_not_null())
        .reduce(|a, b| a.and(b))
        .unwrap_or_else(|| lit(true))
}

/// Key columns then `extra`, each once.
fn names<'k>(keys: &'k [String], extra: &[&'k str]) -> Vec<&'k str> {
    let mut out: Vec<&str> = keys.iter().map(String::as_str).collect();
    for e in extra {
        if !out.contains(e) {
            out.push(e);
        }
    }
    out
}

/// Group `batch` by `keys` and aggregate in one call.
pub fn group_agg(batch: &RecordBatch, keys: &[&str], aggs: &[Agg]) -> Result<RecordBatch> {
    GroupBy::new(batch, keys)?.agg(aggs)
}
