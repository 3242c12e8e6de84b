//! Missing-value detection, removal and imputation.

use crate::stats;
use crate::table::{
    access::{array_f64, array_str},
    column, from_columns, take_rows, with_column,
};
use anyhow::{bail, Result};
use arrow::{
    array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt32Array},
    compute::take,
    datatypes::DataType,
    record_batch::RecordBatch,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// `(column, missing)` per column.
pub fn null_counts(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let counts: Vec<i64> = batch.columns().iter().map(|c| c.null_count() as i64).collect();
    from_columns(vec![
        ("column", Arc::new(StringArray::from(names)) as ArrayRef),
        ("missing", Arc::new(Int64Array::from(counts)) as ArrayRef),
    ])
}

/// `(column, missing_pct)` per column, percent of rows, two decimals.
pub fn null_percentages(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let rows = batch.num_rows().max(1) as f64;
    let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let pct: Vec<f64> = batch
        .columns()
        .iter()
        .map(|c| (c.null_count() as f64 / rows * 10000.0).round() / 100.0)
        .collect();
    from_columns(vec![
        ("column", Arc::new(StringArray::from(names)) as ArrayRef),
        ("missing_pct", Arc::new(Float64Array::from(pct)) as ArrayRef),
    ])
}

pub fn total_nulls(batch: &RecordBatch) -> usize {
    batch.columns().iter().map(|c| c.null_count()).sum()
}

/// Mask of rows holding at least one null.
pub fn rows_with_nulls(batch: &RecordBatch) -> BooleanArray {
    (0..batch.num_rows())
        .map(|r| Some(batch.columns().iter().any(|c| c.is_null(r))))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum How {
    /// Drop a row if any considered column is null.
    Any,
    /// Drop a row only if every considered column is null.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropNa {
    pub how: How,
    /// Columns to consider; `None` means all.
    pub subset: Option<Vec<String>>,
}

impl Default for DropNa {
    fn default() -> Self {
        DropNa {
            how: How::Any,
            subset: None,
        }
    }
}

impl DropNa {
    pub fn all() -> Self {
        DropNa {
            how: How::All,
            subset: None,
        }
    }

    pub fn subset(columns: &[&str]) -> Self {
        DropNa {
            how: How::Any,
            subset: Some(columns.iter().map(|c| c.to_string()).collect()),
        }
    }
}

pub fn dropna(batch: &RecordBatch, opts: &DropNa) -> Result<RecordBatch> {
    let cols: Vec<&ArrayRef> = match &opts.subset {
        Some(names) => names
            .iter()
            .map(|n| column(batch, n))
            .collect::<Result<_>>()?,
        None => batch.columns().iter().collect(),
    };

    let keep: Vec<u32> = (0..batch.num_rows())
        .filter(|&r| match opts.how {
            How::Any => cols.iter().all(|c| c.is_valid(r)),
            How::All => cols.iter().any(|c| c.is_valid(r)),
        })
        .map(|r| r as u32)
        .collect();
    debug!(before = batch.num_rows(), after = keep.len(), "dropna");
    take_rows(batch, &keep)
}

/// Drop columns with fewer than `min_non_null` values.
pub fn drop_sparse_columns(batch: &RecordBatch, min_non_null: usize) -> Result<RecordBatch> {
    let keep: Vec<usize> = batch
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.len() - c.null_count() >= min_non_null)
        .map(|(i, _)| i)
        .collect();
    Ok(batch.project(&keep)?)
}

/// How to fill the nulls of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Value(f64),
    Text(String),
    Mean,
    Median,
    /// Most frequent value; ties go to the smallest.
    Mode,
}

fn fill_numeric(arr: &ArrayRef, value: f64) -> Result<ArrayRef> {
    let values = array_f64(arr)?;
    // integer columns stay integer when the fill is whole
    if arr.data_type().is_integer() && value.fract() == 0.0 {
        let ints: Int64Array = values
            .iter()
            .map(|v| Some(v.unwrap_or(value) as i64))
            .collect();
        return Ok(Arc::new(ints));
    }
    let floats: Float64Array = values.iter().map(|v| Some(v.unwrap_or(value))).collect();
    Ok(Arc::new(floats))
}

fn fill_text(arr: &ArrayRef, value: &str) -> Result<ArrayRef> {
    let values = array_str(arr)?;
    let filled: StringArray = values
        .into_iter()
        .map(|v| Some(v.unwrap_or_else(|| value.to_string())))
        .collect();
    Ok(Arc::new(filled))
}

fn text_mode(arr: &ArrayRef) -> Result<Option<String>> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for v in array_str(arr)?.into_iter().flatten() {
        *counts.entry(v).or_insert(0) += 1;
    }
    Ok(counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(v, _)| v))
}

/// Fill the nulls of `name`. A statistic of an all-null column leaves the
/// column unchanged.
pub fn fillna(batch: &RecordBatch, name: &str, fill: &Fill) -> Result<RecordBatch> {
    let arr = column(batch, name)?;
    let numeric = arr.data_type().is_numeric();

    let filled = match fill {
        Fill::Value(v) if numeric => fill_numeric(arr, *v)?,
        Fill::Value(v) => fill_text(arr, &v.to_string())?,
        Fill::Text(s) if *arr.data_type() == DataType::Utf8 => fill_text(arr, s)?,
        Fill::Text(_) => bail!("cannot fill {} column `{}` with text", arr.data_type(), name),
        Fill::Mode if !numeric => match text_mode(arr)? {
            Some(m) => fill_text(arr, &m)?,
            None => arr.clone(),
        },
        stat => {
            if !numeric {
                bail!("{:?} fill needs a numeric column, `{}` is {}", stat, name, arr.data_type());
            }
            let present: Vec<f64> = array_f64(arr)?.into_iter().flatten().collect();
            let value = match stat {
                Fill::Mean if !present.is_empty() => Some(stats::mean(&present)),
                Fill::Median if !present.is_empty() => Some(stats::median(&present)),
                Fill::Mode => stats::mode(&present),
                _ => None,
            };
            match value {
                Some(v) => fill_numeric(arr, v)?,
                None => arr.clone(),
            }
        }
    };
    debug!(column = name, filled = arr.null_count(), "fillna");
    with_column(batch, name, filled)
}

/// Source row for each position: the nearest non-null row in the given
/// direction, or null when there is none.
fn fill_indices(arr: &ArrayRef, forward: bool) -> UInt32Array {
    let n = arr.len();
    let mut out: Vec<Option<u32>> = vec![None; n];
    let mut last: Option<u32> = None;
    let order: Box<dyn Iterator<Item = usize>> = if forward {
        Box::new(0..n)
    } else {
        Box::new((0..n).rev())
    };
    for i in order {
        if arr.is_valid(i) {
            last = Some(i as u32);
        }
        out[i] = last;
    }
    UInt32Array::from(out)
}

/// Propagate the last valid value forward.
pub fn ffill(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    let arr = column(batch, name)?;
    let filled = take(arr.as_ref(), &fill_indices(arr, true), None)?;
    with_column(batch, name, filled)
}

/// Propagate the next valid value backward.
pub fn bfill(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    let arr = column(batch, name)?;
    let filled = take(arr.as_ref(), &fill_indices(arr, false), None)?;
    with_column(batch, name, filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{f64_values, i64_values, str_values};

    fn customers() -> Result<RecordBatch> {
        from_columns(vec![
            (
                "Name",
                Arc::new(StringArray::from(vec![
                    Some("Asha"),
                    Some("Ravi"),
                    None,
                    Some("Meera"),
                    None,
                ])) as ArrayRef,
            ),
            (
                "Age",
                Arc::new(Int64Array::from(vec![Some(25), None, Some(35), Some(40), None]))
                    as ArrayRef,
            ),
            (
                "City",
                Arc::new(StringArray::from(vec![
                    Some("Pune"),
                    Some("Delhi"),
                    Some("Pune"),
                    None,
                    None,
                ])) as ArrayRef,
            ),
        ])
    }

    #[test]
    fn counts_and_percentages() -> Result<()> {
        let batch = customers()?;
        assert_eq!(
            i64_values(&null_counts(&batch)?, "missing")?,
            vec![Some(2), Some(2), Some(2)]
        );
        assert_eq!(f64_values(&null_percentages(&batch)?, "missing_pct")?[0], Some(40.0));
        assert_eq!(total_nulls(&batch), 6);
        assert_eq!(rows_with_nulls(&batch).true_count(), 4);
        Ok(())
    }

    #[test]
    fn dropna_variants() -> Result<()> {
        let batch = customers()?;
        assert_eq!(dropna(&batch, &DropNa::default())?.num_rows(), 1);
        assert_eq!(dropna(&batch, &DropNa::all())?.num_rows(), 4);
        assert_eq!(dropna(&batch, &DropNa::subset(&["Age"]))?.num_rows(), 3);
        assert_eq!(drop_sparse_columns(&batch, 4)?.num_columns(), 0);
        assert_eq!(drop_sparse_columns(&batch, 3)?.num_columns(), 3);
        Ok(())
    }

    #[test]
    fn mean_fill_keeps_the_mean() -> Result<()> {
        let batch = customers()?;
        let before: Vec<f64> = f64_values(&batch, "Age")?.into_iter().flatten().collect();
        let out = fillna(&batch, "Age", &Fill::Mean)?;
        let after: Vec<f64> = f64_values(&out, "Age")?.into_iter().flatten().collect();
        assert_eq!(after.len(), 5);
        assert!((stats::mean(&before) - stats::mean(&after)).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn whole_fill_keeps_integers_and_text_fill() -> Result<()> {
        let batch = customers()?;
        let out = fillna(&batch, "Age", &Fill::Value(0.0))?;
        assert_eq!(out.schema().field(1).data_type(), &DataType::Int64);
        let out = fillna(&batch, "Name", &Fill::Text("Unknown".into()))?;
        assert_eq!(str_values(&out, "Name")?[2].as_deref(), Some("Unknown"));
        let out = fillna(&batch, "City", &Fill::Mode)?;
        assert_eq!(str_values(&out, "City")?[4].as_deref(), Some("Pune"));
        assert!(fillna(&batch, "City", &Fill::Mean).is_err());
        Ok(())
    }

    #[test]
    fn forward_and_backward_fill() -> Result<()> {
        let batch = customers()?;
        let f = ffill(&batch, "Age")?;
        assert_eq!(
            i64_values(&f, "Age")?,
            vec![Some(25), Some(25), Some(35), Some(40), Some(40)]
        );
        let b = bfill(&batch, "Age")?;
        assert_eq!(
            i64_values(&b, "Age")?,
            vec![Some(25), Some(35), Some(35), Some(40), None]
        );
        Ok(())
    }
}
