//! Reshaping long tables into row-key × column-key matrices.
//!
//! Both `pivot_table` and `crosstab` reduce the long table to one value per
//! (index, column key) pair with a polars group-by, then spread it with
//! `pivot_stable`. Rows with a null index or column key are left out.

use crate::group::{key_exprs, not_null, AggFunc};
use crate::table::{access::array_f64, column, frame_of, to_batch};
use anyhow::{bail, Context, Result};
use arrow::record_batch::RecordBatch;
use polars::lazy::frame::pivot::pivot_stable;
use polars::prelude::{self as pl, lit, IntoLazy, JoinArgs, JoinType, SortMultipleOptions};

const VALUE: &str = "__value";

/// What `pivot_table` should compute.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSpec {
    pub index: Vec<String>,
    pub columns: String,
    pub values: Vec<String>,
    pub aggfuncs: Vec<AggFunc>,
    pub fill_value: Option<f64>,
    pub margins: bool,
    pub margins_name: String,
}

impl PivotSpec {
    pub fn new(index: &str, columns: &str, value: &str, func: AggFunc) -> Self {
        PivotSpec {
            index: vec![index.to_string()],
            columns: columns.to_string(),
            values: vec![value.to_string()],
            aggfuncs: vec![func],
            fill_value: None,
            margins: false,
            margins_name: "Total".to_string(),
        }
    }

    pub fn index(mut self, keys: &[&str]) -> Self {
        self.index = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn values(mut self, values: &[&str]) -> Self {
        self.values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn aggfuncs(mut self, funcs: &[AggFunc]) -> Self {
        self.aggfuncs = funcs.to_vec();
        self
    }

    pub fn fill(mut self, value: f64) -> Self {
        self.fill_value = Some(value);
        self
    }

    pub fn margins(mut self, name: &str) -> Self {
        self.margins = true;
        self.margins_name = name.to_string();
        self
    }
}

fn output_name(spec: &PivotSpec, func: AggFunc, value: &str, col: &str) -> String {
    match (spec.aggfuncs.len() > 1, spec.values.len() > 1) {
        (false, false) => col.to_string(),
        (false, true) => format!("{}_{}", value, col),
        (true, false) => format!("{}_{}", func.name(), col),
        (true, true) => format!("{}_{}_{}", func.name(), value, col),
    }
}

/// `index` rows × one column per distinct `on` key holding `agg` over the
/// rows of that cell, index ascending. `total` adds a column of `agg` over
/// each whole row.
fn wide(lf: pl::LazyFrame, index: &[String], on: &str, agg: pl::Expr, total: Option<&str>) -> Result<pl::DataFrame> {
    let mut by = key_exprs(index);
    by.push(pl::col(on));
    let long = lf
        .clone()
        .group_by(by)
        .agg([agg.clone().alias(VALUE)])
        .collect()
        .with_context(|| format!("reducing cells of {:?} × `{}`", index, on))?;
    let mut out = pivot_stable(&long, [on], Some(index), Some([VALUE]), true, None, None)
        .with_context(|| format!("spreading `{}` into columns", on))?
        .lazy();
    if let Some(name) = total {
        let totals = lf.group_by(key_exprs(index)).agg([agg.alias(name)]);
        out = out.join(totals, key_exprs(index), key_exprs(index), JoinArgs::new(JoinType::Left));
    }
    Ok(out
        .sort_by_exprs(key_exprs(index), SortMultipleOptions::default())
        .collect()?)
}

/// [`wide`] plus, with `margin`, a total column and a last row labelled
/// `margin` in the first index column (other index columns blank). The
/// margins apply `agg` to the full row, column or table, so index columns
/// come back as text.
fn spread(lf: pl::LazyFrame, index: &[String], on: &str, agg: pl::Expr, margin: Option<&str>) -> Result<pl::DataFrame> {
    let body = wide(lf.clone(), index, on, agg.clone(), margin)?;
    let Some(name) = margin else {
        return Ok(body);
    };
    let labels: Vec<pl::Expr> = index
        .iter()
        .enumerate()
        .map(|(i, k)| lit(if i == 0 { name } else { "" }).alias(k.as_str()))
        .collect();
    let bottom = wide(lf.with_columns(labels), index, on, agg, margin)?;

    let text: Vec<pl::Expr> = index
        .iter()
        .map(|k| pl::col(k.as_str()).cast(pl::DataType::String))
        .collect();
    let body = body.lazy().with_columns(text.clone()).collect()?;
    let bottom = bottom.lazy().with_columns(text).collect()?;
    Ok(body.vstack(&bottom)?)
}

/// Replace nulls in every column after the index.
fn fill_cells(df: pl::DataFrame, n_index: usize, value: pl::Expr) -> Result<pl::DataFrame> {
    let fills: Vec<pl::Expr> = df
        .get_column_names()
        .into_iter()
        .skip(n_index)
        .map(|c| pl::col(c.as_str()).fill_null(value.clone()))
        .collect();
    Ok(df.lazy().with_columns(fills).collect()?)
}

/// The rows of `batch` that have every one of `keys`, as a polars query
/// over `keys` and `extra`.
fn complete_rows(batch: &RecordBatch, keys: &[String], extra: &[&str]) -> Result<pl::LazyFrame> {
    let mut names: Vec<&str> = keys.iter().map(String::as_str).collect();
    for e in extra {
        if !names.contains(e) {
            names.push(e);
        }
    }
    Ok(frame_of(batch, &names)?.lazy().filter(not_null(keys)))
}

/// Spreadsheet-style pivot. Rows are the distinct `index` keys, columns the
/// distinct values of `spec.columns` (per value column and aggregation).
/// Missing combinations are null unless `fill_value` is set. With `margins`,
/// a total column and a total row are computed with the same aggregation
/// over the full sub-population.
pub fn pivot_table(batch: &RecordBatch, spec: &PivotSpec) -> Result<RecordBatch> {
    if spec.index.is_empty() || spec.values.is_empty() || spec.aggfuncs.is_empty() {
        bail!("pivot needs at least one index key, value column and aggregation");
    }
    let mut keys = spec.index.clone();
    keys.push(spec.columns.clone());
    let values: Vec<&str> = spec.values.iter().map(String::as_str).collect();
    let lf = complete_rows(batch, &keys, &values)?;
    let margin = spec.margins.then_some(spec.margins_name.as_str());
    let n_index = spec.index.len();

    let mut out: Option<pl::DataFrame> = None;
    for &func in &spec.aggfuncs {
        for value in &spec.values {
            let agg = func.expr(value, false).cast(pl::DataType::Float64);
            let mut part = spread(lf.clone(), &spec.index, &spec.columns, agg, margin)?;
            if let Some(fill) = spec.fill_value {
                part = fill_cells(part, n_index, lit(fill))?;
            }
            let mut columns = if out.is_none() { key_exprs(&spec.index) } else { Vec::new() };
            columns.extend(
                part.get_column_names()
                    .into_iter()
                    .skip(n_index)
                    .map(|c| pl::col(c.as_str()).alias(output_name(spec, func, value, c.as_str()))),
            );
            let part = part.lazy().select(columns).collect()?;
            out = Some(match out {
                None => part,
                Some(acc) => acc.hstack(part.get_columns())?,
            });
        }
    }
    match out {
        Some(df) => to_batch(&df),
        None => bail!("pivot produced no columns"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    None,
    /// Every cell over the grand total.
    All,
    /// Every cell over its row total.
    Index,
    /// Every cell over its column total.
    Columns,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrosstabSpec {
    /// Aggregate this column instead of counting rows.
    pub values: Option<(String, AggFunc)>,
    pub normalize: Normalize,
    pub margins: bool,
}

impl Default for CrosstabSpec {
    fn default() -> Self {
        CrosstabSpec {
            values: None,
            normalize: Normalize::None,
            margins: false,
        }
    }
}

/// Frequency table of `index` × `columns`. Plain counts are `Int64` with 0
/// for absent combinations; aggregated or normalised tables are `Float64`.
/// Margins are only combined with `Normalize::None` or `Normalize::All`.
pub fn crosstab(batch: &RecordBatch, index: &str, columns: &str, spec: &CrosstabSpec) -> Result<RecordBatch> {
    if spec.margins && matches!(spec.normalize, Normalize::Index | Normalize::Columns) {
        bail!("crosstab margins need normalize None or All");
    }
    if spec.values.is_some() && spec.normalize != Normalize::None {
        bail!("crosstab normalisation applies to counts only");
    }
    if let Some((value, func)) = &spec.values {
        let mut pivot = PivotSpec::new(index, columns, value, *func);
        if spec.margins {
            pivot = pivot.margins("Total");
        }
        return pivot_table(batch, &pivot);
    }

    let keys = vec![index.to_string(), columns.to_string()];
    let counts = complete_rows(batch, &keys, &[])?
        .group_by(key_exprs(&keys))
        .agg([pl::len().cast(pl::DataType::Int64).alias(VALUE)]);
    let share = |over: Option<&str>| {
        let v = pl::col(VALUE).cast(pl::DataType::Float64);
        let whole = match over {
            Some(k) => v.clone().sum().over([pl::col(k)]),
            None => v.clone().sum(),
        };
        (v / whole).alias(VALUE)
    };
    let (counts, zero) = match spec.normalize {
        Normalize::None => (counts, lit(0i64)),
        Normalize::All => (counts.with_column(share(None)), lit(0.0)),
        Normalize::Index => (counts.with_column(share(Some(index))), lit(0.0)),
        Normalize::Columns => (counts.with_column(share(Some(columns))), lit(0.0)),
    };

    let margin = spec.margins.then_some("Total");
    let table = spread(counts, &keys[..1], columns, pl::col(VALUE).sum(), margin)?;
    to_batch(&fill_cells(table, 1, zero)?)
}

/// Sum of every numeric cell in a column, ignoring nulls.
pub fn column_sum(batch: &RecordBatch, name: &str) -> Result<f64> {
    Ok(array_f64(column(batch, name)?)?
        .into_iter()
        .flatten()
        .fold(0.0, |acc, v| acc + v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{column_names, f64_values, from_columns, i64_values, str_values};
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    fn sales() -> Result<RecordBatch> {
        from_columns(vec![
            (
                "Region",
                Arc::new(StringArray::from(vec!["North", "North", "South", "South", "North"]))
                    as ArrayRef,
            ),
            (
                "Product",
                Arc::new(StringArray::from(vec!["Laptop", "Mouse", "Laptop", "Laptop", "Laptop"]))
                    as ArrayRef,
            ),
            (
                "Revenue",
                Arc::new(Int64Array::from(vec![100, 10, 200, 50, 300])) as ArrayRef,
            ),
            (
                "Quantity",
                Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef,
            ),
        ])
    }

    #[test]
    fn pivot_with_fill_and_margins() -> Result<()> {
        let batch = sales()?;
        let spec = PivotSpec::new("Region", "Product", "Revenue", AggFunc::Sum)
            .fill(0.0)
            .margins("Total");
        let p = pivot_table(&batch, &spec)?;

        assert_eq!(column_names(&p), vec!["Region", "Laptop", "Mouse", "Total"]);
        assert_eq!(
            str_values(&p, "Region")?,
            vec![Some("North".into()), Some("South".into()), Some("Total".into())]
        );
        assert_eq!(f64_values(&p, "Laptop")?, vec![Some(400.0), Some(250.0), Some(650.0)]);
        assert_eq!(f64_values(&p, "Mouse")?, vec![Some(10.0), Some(0.0), Some(10.0)]);
        assert_eq!(f64_values(&p, "Total")?, vec![Some(410.0), Some(250.0), Some(660.0)]);
        Ok(())
    }

    #[test]
    fn rows_without_a_column_key_are_left_out() -> Result<()> {
        let batch = from_columns(vec![
            ("Region", Arc::new(StringArray::from(vec!["North", "South"])) as ArrayRef),
            ("Product", Arc::new(StringArray::from(vec![Some("Laptop"), None])) as ArrayRef),
            ("Revenue", Arc::new(Int64Array::from(vec![100, 200])) as ArrayRef),
        ])?;
        let spec = PivotSpec::new("Region", "Product", "Revenue", AggFunc::Sum).margins("Total");
        let p = pivot_table(&batch, &spec)?;
        assert_eq!(
            str_values(&p, "Region")?,
            vec![Some("North".into()), Some("Total".into())]
        );
        assert_eq!(f64_values(&p, "Total")?, vec![Some(100.0), Some(100.0)]);
        Ok(())
    }

    #[test]
    fn margins_use_the_aggregation_not_a_sum_of_cells() -> Result<()> {
        let batch = sales()?;
        let spec = PivotSpec::new("Region", "Product", "Revenue", AggFunc::Mean).margins("All");
        let p = pivot_table(&batch, &spec)?;
        // North mean over all three North rows
        assert_eq!(f64_values(&p, "All")?[0], Some(410.0 / 3.0));
        assert_eq!(f64_values(&p, "Mouse")?[1], None);
        Ok(())
    }

    #[test]
    fn multiple_values_and_funcs_are_prefixed() -> Result<()> {
        let batch = sales()?;
        let spec = PivotSpec::new("Region", "Product", "Revenue", AggFunc::Sum)
            .values(&["Revenue", "Quantity"])
            .aggfuncs(&[AggFunc::Sum, AggFunc::Mean]);
        let p = pivot_table(&batch, &spec)?;
        let names = column_names(&p);
        assert_eq!(names[1], "sum_Revenue_Laptop");
        assert!(names.contains(&"mean_Quantity_Mouse".to_string()));
        assert_eq!(names.len(), 1 + 2 * 2 * 2);
        Ok(())
    }

    #[test]
    fn crosstab_counts_and_normalisation() -> Result<()> {
        let batch = sales()?;
        let counts = crosstab(
            &batch,
            "Region",
            "Product",
            &CrosstabSpec {
                margins: true,
                ..Default::default()
            },
        )?;
        assert_eq!(i64_values(&counts, "Laptop")?, vec![Some(2), Some(2), Some(4)]);
        assert_eq!(i64_values(&counts, "Mouse")?, vec![Some(1), Some(0), Some(1)]);
        assert_eq!(i64_values(&counts, "Total")?, vec![Some(3), Some(2), Some(5)]);

        let shares = crosstab(
            &batch,
            "Region",
            "Product",
            &CrosstabSpec {
                normalize: Normalize::Index,
                ..Default::default()
            },
        )?;
        let north_laptop = f64_values(&shares, "Laptop")?[0].unwrap();
        let north_mouse = f64_values(&shares, "Mouse")?[0].unwrap();
        assert!((north_laptop + north_mouse - 1.0).abs() < 1e-9);

        let all = crosstab(
            &batch,
            "Region",
            "Product",
            &CrosstabSpec {
                normalize: Normalize::All,
                margins: true,
                ..Default::default()
            },
        )?;
        let corner = f64_values(&all, "Total")?[2].unwrap_or_default();
        assert!((corner - 1.0).abs() < 1e-9);

        assert!(crosstab(
            &batch,
            "Region",
            "Product",
            &CrosstabSpec {
                normalize: Normalize::Columns,
                margins: true,
                ..Default::default()
            }
        )
        .is_err());
        Ok(())
    }

    #[test]
    fn crosstab_with_values() -> Result<()> {
        let batch = sales()?;
        let t = crosstab(
            &batch,
            "Region",
            "Product",
            &CrosstabSpec {
                values: Some(("Revenue".into(), AggFunc::Sum)),
                ..Default::default()
            },
        )?;
        assert_eq!(f64_values(&t, "Mouse")?, vec![Some(10.0), None]);
        assert_eq!(column_sum(&t, "Laptop")?, 650.0);
        Ok(())
    }
}
