//! The reporting idiom shared by every report: total a metric per key, turn
//! the totals into shares, sort descending, then cut to the top N or to the
//! Pareto head. Plus the text formatting and table printing around it.

pub mod format;
pub mod print;

pub use format::{banner, currency, opt_percent, percent, rule, section, signed_percent, thousands, Money};
pub use print::{format_cell, format_column, print_table, render_table, table_string};

use crate::group::{group_agg, Agg, AggFunc};
use crate::sort::{sort_values, SortKey};
use crate::table::{access::array_f64, column, head, with_column};
use anyhow::{Context, Result};
use arrow::{array::Float64Array, record_batch::RecordBatch};
use std::sync::Arc;
use tracing::debug;

pub const TOTAL: &str = "Total";
pub const SHARE: &str = "Share_%";

/// `key`, `Total` (sum of `metric`) and `Share_%`, largest total first.
pub fn share_table(batch: &RecordBatch, key: &str, metric: &str) -> Result<RecordBatch> {
    let totals = group_agg(batch, &[key], &[Agg::new(metric, AggFunc::Sum).alias(TOTAL)])
        .with_context(|| format!("totalling `{}` by `{}`", metric, key))?;
    let shared = with_share(&totals, TOTAL, SHARE)?;
    sort_values(&shared, &[SortKey::desc(TOTAL)])
}

/// Append `name` = each row's percent of the column total. A zero column
/// total gives null shares.
pub fn with_share(batch: &RecordBatch, total_col: &str, name: &str) -> Result<RecordBatch> {
    let values = array_f64(column(batch, total_col)?)?;
    let grand: f64 = values.iter().flatten().sum();
    let shares: Float64Array = values
        .iter()
        .map(|v| match v {
            Some(v) if grand != 0.0 => Some(v / grand * 100.0),
            _ => None,
        })
        .collect();
    with_column(batch, name, Arc::new(shares))
}

/// Leading rows whose running share stays at or under `threshold` percent.
/// Expects rows already sorted by share, largest first.
pub fn pareto(batch: &RecordBatch, share_col: &str, threshold: f64) -> Result<RecordBatch> {
    let shares = array_f64(column(batch, share_col)?)?;
    let mut running = 0.0;
    let mut keep = 0;
    for share in shares {
        running += share.unwrap_or(0.0);
        if running > threshold {
            break;
        }
        keep += 1;
    }
    debug!(rows = keep, threshold, "pareto head");
    Ok(head(batch, keep))
}

/// Running total of `source` as `name`.
pub fn with_cumulative(batch: &RecordBatch, source: &str, name: &str) -> Result<RecordBatch> {
    let values = array_f64(column(batch, source)?)?;
    let mut running = 0.0;
    let out: Float64Array = values
        .into_iter()
        .map(|v| {
            running += v.unwrap_or(0.0);
            Some(running)
        })
        .collect();
    with_column(batch, name, Arc::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{f64_values, from_columns, str_values};
    use arrow::array::{ArrayRef, Int64Array, StringArray};

    fn sales() -> Result<RecordBatch> {
        from_columns(vec![
            (
                "Product",
                Arc::new(StringArray::from(vec![
                    Some("Laptop"),
                    Some("Mouse"),
                    Some("Laptop"),
                    Some("Keyboard"),
                    Some("Monitor"),
                    None,
                ])) as ArrayRef,
            ),
            (
                "Revenue",
                Arc::new(Int64Array::from(vec![5000, 500, 3000, 1000, 500, 700])) as ArrayRef,
            ),
        ])
    }

    #[test]
    fn shares_sum_to_hundred() -> Result<()> {
        let t = share_table(&sales()?, "Product", "Revenue")?;
        assert_eq!(
            str_values(&t, "Product")?,
            vec![
                Some("Laptop".to_string()),
                Some("Keyboard".to_string()),
                Some("Monitor".to_string()),
                Some("Mouse".to_string()),
            ]
        );
        let totals: Vec<f64> = f64_values(&t, TOTAL)?.into_iter().flatten().collect();
        assert_eq!(totals[0], 8000.0);
        let shares: f64 = f64_values(&t, SHARE)?.into_iter().flatten().sum();
        assert!((shares - 100.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn leading_total_is_the_largest_group_sum() -> Result<()> {
        let batch = sales()?;
        let t = share_table(&batch, "Product", "Revenue")?;
        let sums = group_agg(&batch, &["Product"], &[Agg::new("Revenue", AggFunc::Sum)])?;
        let sums: Vec<f64> = f64_values(&sums, "Revenue_sum")?.into_iter().flatten().collect();
        assert_eq!(f64_values(&t, TOTAL)?[0], crate::stats::max(&sums));
        Ok(())
    }

    #[test]
    fn pareto_head() -> Result<()> {
        let t = share_table(&sales()?, "Product", "Revenue")?;
        // 80% then 90%
        assert_eq!(pareto(&t, SHARE, 80.0)?.num_rows(), 1);
        assert_eq!(pareto(&t, SHARE, 95.0)?.num_rows(), 3);
        assert_eq!(pareto(&t, SHARE, 10.0)?.num_rows(), 0);
        Ok(())
    }

    #[test]
    fn zero_total_gives_null_share() -> Result<()> {
        let batch = from_columns(vec![("Total", Arc::new(Int64Array::from(vec![0, 0])) as ArrayRef)])?;
        let out = with_share(&batch, "Total", SHARE)?;
        assert_eq!(f64_values(&out, SHARE)?, vec![None, None]);
        let cum = with_cumulative(&sales()?, "Revenue", "Running")?;
        assert_eq!(f64_values(&cum, "Running")?.last(), Some(&Some(10700.0)));
        Ok(())
    }
}
