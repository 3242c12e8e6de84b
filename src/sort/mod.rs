//! Ordering and ranking.

use crate::select::col;
use crate::table::{column, f64_values, head, with_column};
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, UInt32Array},
    compute::{filter_record_batch, lexsort_to_indices, take_record_batch, SortColumn, SortOptions},
    record_batch::RecordBatch,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            descending: false,
        }
    }

    pub fn desc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            descending: true,
        }
    }
}

/// Sort by several keys, each with its own direction. Nulls go last and rows
/// that tie on every key keep their input order.
pub fn sort_values(batch: &RecordBatch, keys: &[SortKey]) -> Result<RecordBatch> {
    let mut sort_columns = Vec::with_capacity(keys.len() + 1);
    for key in keys {
        sort_columns.push(SortColumn {
            values: column(batch, &key.column)?.clone(),
            options: Some(SortOptions {
                descending: key.descending,
                nulls_first: false,
            }),
        });
    }
    // row position as the final key
    let positions: ArrayRef = Arc::new(UInt32Array::from_iter_values(
        0..batch.num_rows() as u32,
    ));
    sort_columns.push(SortColumn {
        values: positions,
        options: None,
    });

    let indices = lexsort_to_indices(&sort_columns, None).context("sorting rows")?;
    take_record_batch(batch, &indices).context("reordering rows")
}

fn non_null(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    let mask = col(name).not_null().mask(batch)?;
    Ok(filter_record_batch(batch, &mask)?)
}

/// The `n` rows with the largest `name`; ties go to the earlier row.
pub fn nlargest(batch: &RecordBatch, n: usize, name: &str) -> Result<RecordBatch> {
    let sorted = sort_values(&non_null(batch, name)?, &[SortKey::desc(name)])?;
    Ok(head(&sorted, n))
}

/// The `n` rows with the smallest `name`; ties go to the earlier row.
pub fn nsmallest(batch: &RecordBatch, n: usize, name: &str) -> Result<RecordBatch> {
    let sorted = sort_values(&non_null(batch, name)?, &[SortKey::asc(name)])?;
    Ok(head(&sorted, n))
}

/// Rank with the average method: tied values share the mean of the ranks
/// they span. Ranks start at 1; nulls stay null.
pub fn rank(values: &[Option<f64>], descending: bool) -> Vec<Option<f64>> {
    let mut order: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    order.sort_by(|a, b| {
        let o = a.1.total_cmp(&b.1);
        if descending {
            o.reverse()
        } else {
            o
        }
    });

    let mut ranks = vec![None; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && order[j + 1].1 == order[i].1 {
            j += 1;
        }
        // positions i..=j tie; ranks are 1-based
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &(row, _) in &order[i..=j] {
            ranks[row] = Some(avg);
        }
        i = j + 1;
    }
    ranks
}

/// Rank divided by the number of non-null values.
pub fn rank_pct(values: &[Option<f64>], descending: bool) -> Vec<Option<f64>> {
    let n = values.iter().flatten().count() as f64;
    rank(values, descending)
        .into_iter()
        .map(|r| r.map(|r| r / n))
        .collect()
}

/// Add a `Float64` rank column for `source`.
pub fn with_rank(
    batch: &RecordBatch,
    source: &str,
    name: &str,
    descending: bool,
    pct: bool,
) -> Result<RecordBatch> {
    let values = f64_values(batch, source)?;
    let ranks = if pct {
        rank_pct(&values, descending)
    } else {
        rank(&values, descending)
    };
    with_column(batch, name, Arc::new(Float64Array::from(ranks)))
}

/// The top `n` rows by `metric` within each group of `key`, groups in key
/// order.
pub fn top_n_per_group(batch: &RecordBatch, key: &str, n: usize, metric: &str) -> Result<RecordBatch> {
    crate::group::GroupBy::new(batch, &[key])?.nlargest(n, metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{from_columns, i64_values, str_values};
    use arrow::array::{Int64Array, StringArray};

    fn sales() -> Result<RecordBatch> {
        from_columns(vec![
            (
                "Product",
                Arc::new(StringArray::from(vec!["Mouse", "Laptop", "Mouse", "Laptop", "Desk"]))
                    as ArrayRef,
            ),
            (
                "Revenue",
                Arc::new(Int64Array::from(vec![
                    Some(500),
                    Some(9000),
                    Some(700),
                    Some(9000),
                    None,
                ])) as ArrayRef,
            ),
            ("Id", Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef),
        ])
    }

    #[test]
    fn multi_key_sort_is_stable_with_nulls_last() -> Result<()> {
        let out = sort_values(&sales()?, &[SortKey::desc("Revenue")])?;
        assert_eq!(
            i64_values(&out, "Id")?,
            vec![Some(2), Some(4), Some(3), Some(1), Some(5)]
        );

        let out = sort_values(&sales()?, &[SortKey::asc("Product"), SortKey::desc("Revenue")])?;
        assert_eq!(
            str_values(&out, "Product")?
                .into_iter()
                .flatten()
                .collect::<Vec<_>>(),
            vec!["Desk", "Laptop", "Laptop", "Mouse", "Mouse"]
        );
        assert_eq!(i64_values(&out, "Id")?[3], Some(3));
        Ok(())
    }

    #[test]
    fn nlargest_prefers_first_occurrence() -> Result<()> {
        let top = nlargest(&sales()?, 1, "Revenue")?;
        assert_eq!(i64_values(&top, "Id")?, vec![Some(2)]);
        let bottom = nsmallest(&sales()?, 10, "Revenue")?;
        assert_eq!(bottom.num_rows(), 4);
        Ok(())
    }

    #[test]
    fn average_ranks() {
        let r = rank(&[Some(10.0), Some(30.0), Some(30.0), None, Some(5.0)], true);
        assert_eq!(r, vec![Some(3.0), Some(1.5), Some(1.5), None, Some(4.0)]);
        let p = rank_pct(&[Some(1.0), Some(2.0)], false);
        assert_eq!(p, vec![Some(0.5), Some(1.0)]);
    }

    #[test]
    fn top_per_group() -> Result<()> {
        let out = top_n_per_group(&sales()?, "Product", 1, "Revenue")?;
        assert_eq!(
            i64_values(&out, "Id")?,
            vec![Some(2), Some(3)]
        );
        Ok(())
    }
}
