// src/table/frame.rs
//! Crossing between Arrow `RecordBatch`es and polars `DataFrame`s.
//!
//! Loading and export stay on Arrow; grouping, pivoting and joining hand the
//! table to polars and bring the result back through here.

use crate::table::{
    access::{array_f64, array_i64, array_str, column},
    columns::from_columns,
};
use anyhow::{anyhow, bail, Context, Result};
use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
        TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    },
    datatypes::{DataType, TimeUnit},
    record_batch::RecordBatch,
};
use polars::prelude::{self as pl, NamedFrom};
use std::sync::Arc;

fn to_column(name: &str, arr: &ArrayRef) -> Result<pl::Column> {
    let name = pl::PlSmallStr::from_str(name);
    let series = match arr.data_type() {
        DataType::Boolean => {
            let bools = arr
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| anyhow!("`{}` is not a boolean array", name))?;
            pl::Series::new(name, bools.iter().collect::<Vec<_>>())
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            pl::Series::new(name, array_f64(arr)?)
        }
        dt if dt.is_integer() => pl::Series::new(name, array_i64(arr)?),
        DataType::Date32 => {
            let days: Vec<Option<i32>> = array_i64(arr)?
                .into_iter()
                .map(|d| d.map(|d| d as i32))
                .collect();
            pl::Series::new(name, days).cast(&pl::DataType::Date)?
        }
        DataType::Timestamp(unit, _) => {
            let unit = match unit {
                TimeUnit::Millisecond => pl::TimeUnit::Milliseconds,
                TimeUnit::Microsecond => pl::TimeUnit::Microseconds,
                TimeUnit::Nanosecond => pl::TimeUnit::Nanoseconds,
                TimeUnit::Second => bail!("second-resolution timestamps are not supported (`{}`)", name),
            };
            pl::Series::new(name, array_i64(arr)?).cast(&pl::DataType::Datetime(unit, None))?
        }
        _ => pl::Series::new(name, array_str(arr)?),
    };
    Ok(pl::Column::from(series))
}

/// Copy every column of `batch` into a polars frame. Integers widen to
/// `Int64`, floats to `Float64`; dates and timestamps keep their logical type
/// and anything else travels as text.
pub fn to_frame(batch: &RecordBatch) -> Result<pl::DataFrame> {
    let columns = batch
        .schema()
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(f, arr)| to_column(f.name(), arr))
        .collect::<Result<Vec<_>>>()?;
    pl::DataFrame::new(columns).context("building polars frame")
}

/// Like [`to_frame`] but copies only `names`, in that order.
pub fn frame_of(batch: &RecordBatch, names: &[&str]) -> Result<pl::DataFrame> {
    let columns = names
        .iter()
        .map(|n| to_column(n, column(batch, n)?))
        .collect::<Result<Vec<_>>>()?;
    pl::DataFrame::new(columns).context("building polars frame")
}

fn to_array(column: &pl::Column) -> Result<ArrayRef> {
    let s = column.as_materialized_series();
    let arr: ArrayRef = match s.dtype() {
        pl::DataType::Boolean => Arc::new(BooleanArray::from(s.bool()?.into_iter().collect::<Vec<_>>())),
        pl::DataType::String => Arc::new(StringArray::from(s.str()?.into_iter().collect::<Vec<_>>())),
        pl::DataType::Date => {
            let days = s.to_physical_repr();
            Arc::new(Date32Array::from(days.i32()?.into_iter().collect::<Vec<_>>()))
        }
        pl::DataType::Datetime(unit, _) => {
            let phys = s.to_physical_repr();
            let ticks: Vec<Option<i64>> = phys.i64()?.into_iter().collect();
            match unit {
                pl::TimeUnit::Milliseconds => Arc::new(TimestampMillisecondArray::from(ticks)),
                pl::TimeUnit::Microseconds => Arc::new(TimestampMicrosecondArray::from(ticks)),
                pl::TimeUnit::Nanoseconds => Arc::new(TimestampNanosecondArray::from(ticks)),
            }
        }
        pl::DataType::Null => Arc::new(Float64Array::from(vec![None::<f64>; s.len()])),
        dt if dt.is_float() => {
            let floats = s.cast(&pl::DataType::Float64)?;
            Arc::new(Float64Array::from(floats.f64()?.into_iter().collect::<Vec<_>>()))
        }
        dt if dt.is_integer() => {
            let ints = s.cast(&pl::DataType::Int64)?;
            Arc::new(Int64Array::from(ints.i64()?.into_iter().collect::<Vec<_>>()))
        }
        other => bail!("cannot bring polars column `{}` of type {} back to Arrow", s.name(), other),
    };
    Ok(arr)
}

/// One column of a polars frame as an Arrow array.
pub fn array_of(df: &pl::DataFrame, name: &str) -> Result<ArrayRef> {
    to_array(df.column(name)?)
}

/// Copy a polars frame back into a `RecordBatch`, column order preserved.
/// Unsigned counts come back as `Int64`.
pub fn to_batch(df: &pl::DataFrame) -> Result<RecordBatch> {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| -> Result<(String, ArrayRef)> { Ok((c.name().to_string(), to_array(c)?)) })
        .collect::<Result<Vec<_>>>()?;
    from_columns(columns)
}
