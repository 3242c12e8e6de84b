use polars::prelude::{self as pl, lit, when, QuantileMethod, NULL};
use serde::Serialize;
use std::fmt;

/// Reduction applied to one column of each group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AggFunc {
    Sum,
    Mean,
    Median,
    Count,
    Min,
    Max,
    /// Sample standard deviation (ddof 1).
    Std,
    NUnique,
    /// Quantile in `0..=1`, linear interpolation.
    Quantile(f64),
    /// `max - min`.
    Range,
    First,
}

impl AggFunc {
    pub fn name(&self) -> String {
        match self {
            AggFunc::Sum => "sum".into(),
            AggFunc::Mean => "mean".into(),
            AggFunc::Median => "median".into(),
            AggFunc::Count => "count".into(),
            AggFunc::Min => "min".into(),
            AggFunc::Max => "max".into(),
            AggFunc::Std => "std".into(),
            AggFunc::NUnique => "nunique".into(),
            AggFunc::Quantile(q) => format!("q{}", (q * 100.0).round()),
            AggFunc::Range => "range".into(),
            AggFunc::First => "first".into(),
        }
    }

    /// The polars aggregation of `column` for this function.
    ///
    /// Counts come out as `Int64`. `First`, `Min` and `Max` keep the column
    /// type; `Sum` keeps integers integer. Everything else is `Float64`.
    /// `Sum` of nothing is 0, every other statistic of nothing is null and
    /// `Std` needs at least two values.
    pub fn expr(&self, column: &str, integer: bool) -> pl::Expr {
        let c = pl::col(column);
        let f = || pl::col(column).cast(pl::DataType::Float64);
        match self {
            AggFunc::Sum if integer => c.sum(),
            AggFunc::Sum => f().sum(),
            AggFunc::Mean => f().mean(),
            AggFunc::Median => f().median(),
            AggFunc::Count => c.count().cast(pl::DataType::Int64),
            AggFunc::NUnique => c.drop_nulls().n_unique().cast(pl::DataType::Int64),
            AggFunc::Min => c.min(),
            AggFunc::Max => c.max(),
            AggFunc::Std => when(c.count().gt(lit(1)))
                .then(f().std(1))
                .otherwise(lit(NULL).cast(pl::DataType::Float64)),
            AggFunc::Quantile(q) => f().quantile(lit(*q), QuantileMethod::Linear),
            AggFunc::Range => f().max() - f().min(),
            AggFunc::First => c.drop_nulls().first(),
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A named aggregation: `column` reduced by `func`, emitted as `alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct Agg {
    pub column: String,
    pub func: AggFunc,
    pub alias: String,
}

impl Agg {
    /// Output name defaults to `<column>_<func>`.
    pub fn new(column: &str, func: AggFunc) -> Self {
        Agg {
            column: column.to_string(),
            func,
            alias: format!("{}_{}", column, func.name()),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }
}
