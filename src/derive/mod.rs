//! New columns computed from existing ones.

pub mod text;

use crate::select::{Predicate, Value};
use crate::table::{
    access::{array_f64, array_str},
    column, with_column,
};
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Scalar, StringArray},
    compute::{
        cast,
        kernels::{numeric, zip::zip},
    },
    datatypes::DataType,
    record_batch::RecordBatch,
};
use std::sync::Arc;

pub use text::{first_word, lower, map_str, prefix, replace, str_contains, str_len, title_case, upper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// `name = left <op> right`. Two integer columns stay `Int64` except under
/// division; anything else is computed in `Float64`.
pub fn binary(batch: &RecordBatch, left: &str, op: BinaryOp, right: &str, name: &str) -> Result<RecordBatch> {
    let l = column(batch, left)?;
    let r = column(batch, right)?;
    let ints = l.data_type().is_integer() && r.data_type().is_integer() && op != BinaryOp::Div;
    let ty = if ints { DataType::Int64 } else { DataType::Float64 };
    let l = cast(l, &ty)?;
    let r = cast(r, &ty)?;
    let out = match op {
        BinaryOp::Add => numeric::add(&l, &r),
        BinaryOp::Sub => numeric::sub(&l, &r),
        BinaryOp::Mul => numeric::mul(&l, &r),
        BinaryOp::Div => numeric::div(&l, &r),
    }
    .with_context(|| format!("computing `{}` from `{}` and `{}`", name, left, right))?;
    with_column(batch, name, out)
}

/// `name = source * factor` as `Float64`.
pub fn scale(batch: &RecordBatch, source: &str, factor: f64, name: &str) -> Result<RecordBatch> {
    let values = cast(column(batch, source)?, &DataType::Float64)?;
    let out = numeric::mul(&values, &Scalar::new(Float64Array::from(vec![factor])))?;
    with_column(batch, name, out)
}

/// A column holding the same value on every row.
pub fn add_constant(batch: &RecordBatch, name: &str, value: &Value) -> Result<RecordBatch> {
    with_column(batch, name, constant(value, batch.num_rows()))
}

fn constant(value: &Value, n: usize) -> ArrayRef {
    match value {
        Value::Number(v) => Arc::new(Float64Array::from(vec![*v; n])),
        Value::Text(s) => Arc::new(StringArray::from(vec![s.as_str(); n])),
        Value::Bool(b) => Arc::new(BooleanArray::from(vec![*b; n])),
    }
}

/// Element-wise numeric function; nulls stay null.
pub fn apply_f64<F>(batch: &RecordBatch, source: &str, name: &str, f: F) -> Result<RecordBatch>
where
    F: Fn(f64) -> f64,
{
    let out: Float64Array = array_f64(column(batch, source)?)?
        .into_iter()
        .map(|v| v.map(&f))
        .collect();
    with_column(batch, name, Arc::new(out))
}

/// Element-wise numeric → label function; nulls stay null.
pub fn label_f64<F>(batch: &RecordBatch, source: &str, name: &str, f: F) -> Result<RecordBatch>
where
    F: Fn(f64) -> String,
{
    let out: StringArray = array_f64(column(batch, source)?)?
        .into_iter()
        .map(|v| v.map(&f))
        .collect();
    with_column(batch, name, Arc::new(out))
}

/// Label by the first threshold the value is strictly above, checked in
/// order; `default` otherwise.
pub fn bucket(value: f64, cuts: &[(f64, &str)], default: &str) -> String {
    cuts.iter()
        .find(|(t, _)| value > *t)
        .map_or(default, |(_, label)| *label)
        .to_string()
}

/// Like [`bucket`] but with `>=` thresholds (grade boundaries).
pub fn grade(value: f64, cuts: &[(f64, &str)], default: &str) -> String {
    cuts.iter()
        .find(|(t, _)| value >= *t)
        .map_or(default, |(_, label)| *label)
        .to_string()
}

pub fn bucket_column(
    batch: &RecordBatch,
    source: &str,
    name: &str,
    cuts: &[(f64, &str)],
    default: &str,
) -> Result<RecordBatch> {
    label_f64(batch, source, name, |v| bucket(v, cuts, default))
}

pub fn grade_column(
    batch: &RecordBatch,
    source: &str,
    name: &str,
    cuts: &[(f64, &str)],
    default: &str,
) -> Result<RecordBatch> {
    label_f64(batch, source, name, |v| grade(v, cuts, default))
}

/// Translate values through `mapping`; unmapped values become null.
pub fn map_values(batch: &RecordBatch, source: &str, name: &str, mapping: &[(&str, &str)]) -> Result<RecordBatch> {
    let out: StringArray = array_str(column(batch, source)?)?
        .into_iter()
        .map(|v| {
            v.and_then(|v| {
                mapping
                    .iter()
                    .find(|(from, _)| *from == v)
                    .map(|(_, to)| to.to_string())
            })
        })
        .collect();
    with_column(batch, name, Arc::new(out))
}

/// Row-wise function over several numeric columns producing a label.
pub fn row_label<F>(batch: &RecordBatch, sources: &[&str], name: &str, f: F) -> Result<RecordBatch>
where
    F: Fn(&[Option<f64>]) -> Option<String>,
{
    let cols = sources
        .iter()
        .map(|s| array_f64(column(batch, s)?))
        .collect::<Result<Vec<_>>>()?;
    let out: StringArray = (0..batch.num_rows())
        .map(|r| {
            let row: Vec<Option<f64>> = cols.iter().map(|c| c[r]).collect();
            f(&row)
        })
        .collect();
    with_column(batch, name, Arc::new(out))
}

/// Row-wise function over several numeric columns producing a number.
pub fn row_f64<F>(batch: &RecordBatch, sources: &[&str], name: &str, f: F) -> Result<RecordBatch>
where
    F: Fn(&[Option<f64>]) -> Option<f64>,
{
    let cols = sources
        .iter()
        .map(|s| array_f64(column(batch, s)?))
        .collect::<Result<Vec<_>>>()?;
    let out: Float64Array = (0..batch.num_rows())
        .map(|r| {
            let row: Vec<Option<f64>> = cols.iter().map(|c| c[r]).collect();
            f(&row)
        })
        .collect();
    with_column(batch, name, Arc::new(out))
}

/// Round a numeric column to `decimals` places (result is `Float64`).
pub fn round(batch: &RecordBatch, source: &str, decimals: i32) -> Result<RecordBatch> {
    let p = 10f64.powi(decimals);
    apply_f64(batch, source, source, |v| (v * p).round() / p)
}

/// Round every `Float64` column.
pub fn round_all(batch: &RecordBatch, decimals: i32) -> Result<RecordBatch> {
    let mut out = batch.clone();
    for field in batch.schema().fields() {
        if field.data_type() == &DataType::Float64 {
            out = round(&out, field.name(), decimals)?;
        }
    }
    Ok(out)
}

/// Overwrite `target` with `values` on the rows where `predicate` holds.
/// `values` is cast to the target column's type, except that an integer
/// target receiving floats becomes `Float64`.
pub fn update_where(batch: &RecordBatch, predicate: &Predicate, target: &str, values: &ArrayRef) -> Result<RecordBatch> {
    let mask = predicate.mask(batch)?;
    let current = column(batch, target)?;
    let (current, values) =
        if current.data_type().is_integer() && values.data_type().is_floating() {
            (
                cast(current, &DataType::Float64)?,
                cast(values, &DataType::Float64)?,
            )
        } else {
            let values = cast(values, current.data_type())
                .with_context(|| format!("casting update for `{}`", target))?;
            (current.clone(), values)
        };
    let out = zip(&mask, &values, &current)?;
    with_column(batch, target, out)
}

/// [`update_where`] with a single value.
pub fn update_where_value(batch: &RecordBatch, predicate: &Predicate, target: &str, value: &Value) -> Result<RecordBatch> {
    update_where(batch, predicate, target, &constant(value, batch.num_rows()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::col;
    use crate::table::{f64_values, from_columns, i64_values, str_values};
    use arrow::array::Int64Array;

    fn orders() -> Result<RecordBatch> {
        from_columns(vec![
            (
                "Quantity",
                Arc::new(Int64Array::from(vec![Some(2), Some(5), None])) as ArrayRef,
            ),
            (
                "Unit_Price",
                Arc::new(Int64Array::from(vec![45000, 500, 1200])) as ArrayRef,
            ),
            (
                "Status",
                Arc::new(StringArray::from(vec!["D", "C", "X"])) as ArrayRef,
            ),
        ])
    }

    #[test]
    fn integer_products_stay_integer() -> Result<()> {
        let out = binary(&orders()?, "Quantity", BinaryOp::Mul, "Unit_Price", "Revenue")?;
        assert_eq!(out.schema().field(3).data_type(), &DataType::Int64);
        assert_eq!(i64_values(&out, "Revenue")?, vec![Some(90000), Some(2500), None]);

        let out = binary(&orders()?, "Unit_Price", BinaryOp::Div, "Quantity", "Per")?;
        assert_eq!(f64_values(&out, "Per")?[1], Some(100.0));
        Ok(())
    }

    #[test]
    fn scaling_and_constants() -> Result<()> {
        let out = scale(&orders()?, "Unit_Price", 0.18, "GST")?;
        assert!((f64_values(&out, "GST")?[1].unwrap() - 90.0).abs() < 1e-9);
        let out = add_constant(&out, "Currency", &Value::from("INR"))?;
        assert_eq!(str_values(&out, "Currency")?[2].as_deref(), Some("INR"));
        Ok(())
    }

    #[test]
    fn buckets_check_thresholds_in_order() {
        let cuts = [(20000.0, "High"), (10000.0, "Medium")];
        assert_eq!(bucket(45000.0, &cuts, "Low"), "High");
        assert_eq!(bucket(20000.0, &cuts, "Low"), "Medium");
        assert_eq!(bucket(500.0, &cuts, "Low"), "Low");
        let grades = [(90.0, "A"), (75.0, "B")];
        assert_eq!(grade(90.0, &grades, "C"), "A");
    }

    #[test]
    fn mapping_leaves_unknowns_null() -> Result<()> {
        let out = map_values(
            &orders()?,
            "Status",
            "Status_Name",
            &[("D", "Delivered"), ("C", "Cancelled")],
        )?;
        assert_eq!(
            str_values(&out, "Status_Name")?,
            vec![Some("Delivered".into()), Some("Cancelled".into()), None]
        );
        Ok(())
    }

    #[test]
    fn conditional_update() -> Result<()> {
        let batch = orders()?;
        let out = update_where_value(&batch, &col("Status").eq("X"), "Status", &Value::from("C"))?;
        assert_eq!(str_values(&out, "Status")?[2].as_deref(), Some("C"));

        let bonus: ArrayRef = Arc::new(Float64Array::from(vec![0.5, 0.5, 0.5]));
        let out = update_where(&batch, &col("Unit_Price").gt(1000), "Unit_Price", &bonus)?;
        assert_eq!(
            f64_values(&out, "Unit_Price")?,
            vec![Some(0.5), Some(500.0), Some(0.5)]
        );
        Ok(())
    }

    #[test]
    fn row_wise_labels() -> Result<()> {
        let out = row_label(&orders()?, &["Quantity", "Unit_Price"], "Kind", |row| {
            match (row[0], row[1]) {
                (Some(q), Some(p)) if q * p > 50000.0 => Some("Bulk".into()),
                (Some(_), Some(_)) => Some("Regular".into()),
                _ => None,
            }
        })?;
        assert_eq!(
            str_values(&out, "Kind")?,
            vec![Some("Bulk".into()), Some("Regular".into()), None]
        );
        Ok(())
    }
}
