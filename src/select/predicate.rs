use crate::load::date_parser;
use crate::table::{access::array_str, column};
use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Scalar, StringArray},
    compute::{
        cast,
        kernels::{
            boolean::{and, not, or},
            cmp,
        },
    },
    datatypes::DataType,
    record_batch::RecordBatch,
};
use std::fmt;

/// A literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Contains { case_sensitive: bool },
    StartsWith,
    EndsWith,
}

/// Boolean row condition over named columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CmpOp,
        value: Value,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
    },
    IsIn {
        column: String,
        values: Vec<Value>,
    },
    Text {
        column: String,
        pattern: String,
        kind: TextMatch,
    },
    IsNull(String),
    NotNull(String),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Entry point for the fluent builder: `col("Revenue").gt(100000)`.
pub fn col(name: &str) -> ColumnRef {
    ColumnRef(name.to_string())
}

pub struct ColumnRef(String);

impl ColumnRef {
    fn compare(self, op: CmpOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare {
            column: self.0,
            op,
            value: value.into(),
        }
    }

    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        self.compare(CmpOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Predicate {
        self.compare(CmpOp::Ne, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        self.compare(CmpOp::Gt, value)
    }

    pub fn ge(self, value: impl Into<Value>) -> Predicate {
        self.compare(CmpOp::Ge, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        self.compare(CmpOp::Lt, value)
    }

    pub fn le(self, value: impl Into<Value>) -> Predicate {
        self.compare(CmpOp::Le, value)
    }

    /// Inclusive on both ends.
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Predicate {
        Predicate::Between {
            column: self.0,
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate::IsIn {
            column: self.0,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(self, pattern: &str) -> Predicate {
        self.text(pattern, TextMatch::Contains { case_sensitive: true })
    }

    pub fn contains_ignore_case(self, pattern: &str) -> Predicate {
        self.text(pattern, TextMatch::Contains { case_sensitive: false })
    }

    pub fn starts_with(self, pattern: &str) -> Predicate {
        self.text(pattern, TextMatch::StartsWith)
    }

    pub fn ends_with(self, pattern: &str) -> Predicate {
        self.text(pattern, TextMatch::EndsWith)
    }

    fn text(self, pattern: &str, kind: TextMatch) -> Predicate {
        Predicate::Text {
            column: self.0,
            pattern: pattern.to_string(),
            kind,
        }
    }

    pub fn is_null(self) -> Predicate {
        Predicate::IsNull(self.0)
    }

    pub fn not_null(self) -> Predicate {
        Predicate::NotNull(self.0)
    }
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Evaluate to a row mask with no nulls: rows with a null operand are
    /// `false`, except under `IsNull` and `!=`.
    pub fn mask(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        match self {
            Predicate::Compare { column: name, op, value } => {
                compare(column(batch, name)?, *op, value)
                    .with_context(|| format!("evaluating `{} {} {}`", name, op.symbol(), value))
            }
            Predicate::Between { column: name, low, high } => {
                let arr = column(batch, name)?;
                Ok(and(
                    &compare(arr, CmpOp::Ge, low)?,
                    &compare(arr, CmpOp::Le, high)?,
                )?)
            }
            Predicate::IsIn { column: name, values } => {
                let arr = column(batch, name)?;
                let mut acc = BooleanArray::from(vec![false; arr.len()]);
                for v in values {
                    acc = or(&acc, &compare(arr, CmpOp::Eq, v)?)?;
                }
                Ok(acc)
            }
            Predicate::Text { column: name, pattern, kind } => {
                let values = array_str(column(batch, name)?)?;
                let needle = pattern.to_lowercase();
                Ok(values
                    .iter()
                    .map(|v| {
                        Some(v.as_deref().is_some_and(|s| match kind {
                            TextMatch::Contains { case_sensitive: true } => s.contains(pattern.as_str()),
                            TextMatch::Contains { case_sensitive: false } => {
                                s.to_lowercase().contains(&needle)
                            }
                            TextMatch::StartsWith => s.starts_with(pattern.as_str()),
                            TextMatch::EndsWith => s.ends_with(pattern.as_str()),
                        }))
                    })
                    .collect())
            }
            Predicate::IsNull(name) => {
                let arr = column(batch, name)?;
                Ok((0..arr.len()).map(|i| Some(arr.is_null(i))).collect())
            }
            Predicate::NotNull(name) => {
                let arr = column(batch, name)?;
                Ok((0..arr.len()).map(|i| Some(arr.is_valid(i))).collect())
            }
            Predicate::And(a, b) => Ok(and(&a.mask(batch)?, &b.mask(batch)?)?),
            Predicate::Or(a, b) => Ok(or(&a.mask(batch)?, &b.mask(batch)?)?),
            Predicate::Not(p) => Ok(not(&p.mask(batch)?)?),
        }
    }
}

fn is_numeric(dt: &DataType) -> bool {
    dt.is_numeric()
}

fn run_cmp(op: CmpOp, lhs: &dyn arrow::array::Datum, rhs: &dyn arrow::array::Datum) -> Result<BooleanArray> {
    let out = match op {
        CmpOp::Eq => cmp::eq(lhs, rhs)?,
        CmpOp::Ne => cmp::neq(lhs, rhs)?,
        CmpOp::Gt => cmp::gt(lhs, rhs)?,
        CmpOp::Ge => cmp::gt_eq(lhs, rhs)?,
        CmpOp::Lt => cmp::lt(lhs, rhs)?,
        CmpOp::Le => cmp::lt_eq(lhs, rhs)?,
    };
    Ok(out)
}

/// Replace nulls in a comparison result: `!=` treats a missing operand as
/// "different", everything else as "no match".
fn settle_nulls(mask: BooleanArray, op: CmpOp) -> BooleanArray {
    if mask.null_count() == 0 {
        return mask;
    }
    let fill = op == CmpOp::Ne;
    mask.iter().map(|v| Some(v.unwrap_or(fill))).collect()
}

fn compare(arr: &ArrayRef, op: CmpOp, value: &Value) -> Result<BooleanArray> {
    let dt = arr.data_type();
    let mask = match value {
        Value::Number(n) if is_numeric(dt) => {
            let lhs = cast(arr, &DataType::Float64)?;
            run_cmp(op, &lhs, &Scalar::new(Float64Array::from(vec![*n])))?
        }
        Value::Text(s) if *dt == DataType::Date32 => {
            let Some(d) = date_parser::parse_date(s) else {
                bail!("`{}` is not a date", s);
            };
            let rhs = Scalar::new(Date32Array::from(vec![date_parser::date_to_days(d)]));
            run_cmp(op, arr, &rhs)?
        }
        Value::Text(s) => {
            let lhs = cast(arr, &DataType::Utf8)?;
            run_cmp(op, &lhs, &Scalar::new(StringArray::from(vec![s.as_str()])))?
        }
        Value::Bool(b) if *dt == DataType::Boolean => {
            run_cmp(op, arr, &Scalar::new(BooleanArray::from(vec![*b])))?
        }
        other => bail!("cannot compare a {} column with {}", dt, other),
    };
    Ok(settle_nulls(mask, op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::from_columns;
    use arrow::array::Int64Array;
    use std::sync::Arc;

    fn sales() -> Result<RecordBatch> {
        from_columns(vec![
            (
                "Product",
                Arc::new(StringArray::from(vec![
                    Some("Laptop"),
                    Some("Mouse"),
                    None,
                    Some("Monitor"),
                ])) as ArrayRef,
            ),
            (
                "Revenue",
                Arc::new(Int64Array::from(vec![Some(90000), Some(2500), Some(500), None]))
                    as ArrayRef,
            ),
            (
                "Date",
                Arc::new(Date32Array::from(vec![20454, 20455, 20460, 20461])) as ArrayRef,
            ),
        ])
    }

    fn bits(mask: &BooleanArray) -> Vec<bool> {
        mask.iter().map(|v| v.unwrap_or(false)).collect()
    }

    #[test]
    fn numeric_comparisons_skip_nulls() -> Result<()> {
        let batch = sales()?;
        assert_eq!(
            bits(&col("Revenue").gt(1000).mask(&batch)?),
            vec![true, true, false, false]
        );
        assert_eq!(
            bits(&col("Revenue").ne(500).mask(&batch)?),
            vec![true, true, false, true]
        );
        Ok(())
    }

    #[test]
    fn text_matching() -> Result<()> {
        let batch = sales()?;
        assert_eq!(
            bits(&col("Product").starts_with("M").mask(&batch)?),
            vec![false, true, false, true]
        );
        assert_eq!(
            bits(&col("Product").contains_ignore_case("LAP").mask(&batch)?),
            vec![true, false, false, false]
        );
        assert_eq!(
            bits(&col("Product").is_in(["Laptop", "Monitor"]).mask(&batch)?),
            vec![true, false, false, true]
        );
        assert_eq!(
            bits(&col("Product").is_null().mask(&batch)?),
            vec![false, false, true, false]
        );
        Ok(())
    }

    #[test]
    fn dates_compare_against_text() -> Result<()> {
        let batch = sales()?;
        let p = col("Date").between("2026-01-02", "2026-01-07");
        assert_eq!(bits(&p.mask(&batch)?), vec![false, true, true, false]);
        Ok(())
    }

    #[test]
    fn combinators() -> Result<()> {
        let batch = sales()?;
        let p = col("Revenue")
            .gt(1000)
            .and(col("Product").eq("Mouse"))
            .or(col("Product").eq("Monitor"));
        assert_eq!(bits(&p.mask(&batch)?), vec![false, true, false, true]);
        assert_eq!(
            bits(&col("Product").eq("Mouse").not().mask(&batch)?),
            vec![true, false, true, true]
        );
        Ok(())
    }

    #[test]
    fn type_mismatch_is_an_error() -> Result<()> {
        let batch = sales()?;
        assert!(col("Product").gt(3).mask(&batch).is_err());
        Ok(())
    }
}
