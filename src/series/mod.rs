//! Order-dependent transforms over one column (time series).

use crate::table::{access::array_f64, column, with_column};
use anyhow::{bail, Result};
use arrow::{array::Float64Array, record_batch::RecordBatch};
use std::sync::Arc;

/// Running total; nulls are skipped and stay null.
pub fn cumsum(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut total = 0.0;
    values
        .iter()
        .map(|v| {
            v.map(|v| {
                total += v;
                total
            })
        })
        .collect()
}

/// `v[i] - v[i - periods]`.
pub fn diff(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| match i.checked_sub(periods) {
            Some(j) => Some(values[i]? - values[j]?),
            None => None,
        })
        .collect()
}

/// Fractional change from the previous row. A zero base gives null.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let prev = values[i.checked_sub(1)?]?;
            let cur = values[i]?;
            (prev != 0.0).then(|| (cur - prev) / prev)
        })
        .collect()
}

/// Mean of the trailing `window` rows; null until the window is full or when
/// it holds a null.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum: Option<f64> = slice.iter().copied().sum();
            sum.map(|s| s / window as f64)
        })
        .collect()
}

/// Which transform [`add_series`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    CumSum,
    Diff,
    PctChange,
    Rolling(usize),
}

/// Add `name = transform(source)` as `Float64`.
pub fn add_series(batch: &RecordBatch, source: &str, transform: Transform, name: &str) -> Result<RecordBatch> {
    let values = array_f64(column(batch, source)?)?;
    let out = match transform {
        Transform::CumSum => cumsum(&values),
        Transform::Diff => diff(&values, 1),
        Transform::PctChange => pct_change(&values),
        Transform::Rolling(0) => bail!("rolling window for `{}` must be at least 1", source),
        Transform::Rolling(w) => rolling_mean(&values, w),
    };
    with_column(batch, name, Arc::new(Float64Array::from(out)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{f64_values, from_columns};
    use arrow::array::{ArrayRef, Int64Array};

    const SALES: [Option<f64>; 5] = [Some(100.0), Some(120.0), None, Some(90.0), Some(180.0)];

    #[test]
    fn cumulative_and_differences() {
        assert_eq!(
            cumsum(&SALES),
            vec![Some(100.0), Some(220.0), None, Some(310.0), Some(490.0)]
        );
        assert_eq!(diff(&SALES, 1), vec![None, Some(20.0), None, None, Some(90.0)]);
        assert_eq!(pct_change(&SALES)[1], Some(0.2));
        assert_eq!(pct_change(&[Some(0.0), Some(5.0)])[1], None);
    }

    #[test]
    fn rolling_windows() {
        let v: Vec<Option<f64>> = (1..=5).map(|i| Some(i as f64)).collect();
        assert_eq!(rolling_mean(&v, 3), vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!(rolling_mean(&SALES, 2)[1], Some(110.0));
        assert_eq!(rolling_mean(&SALES, 2)[3], None);
    }

    #[test]
    fn adds_columns() -> Result<()> {
        let batch = from_columns(vec![(
            "Sales",
            Arc::new(Int64Array::from(vec![10, 20, 30])) as ArrayRef,
        )])?;
        let out = add_series(&batch, "Sales", Transform::CumSum, "Running")?;
        assert_eq!(f64_values(&out, "Running")?, vec![Some(10.0), Some(30.0), Some(60.0)]);
        assert!(add_series(&batch, "Sales", Transform::Rolling(0), "x").is_err());
        Ok(())
    }
}
