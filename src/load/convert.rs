use crate::load::infer::SchemaInfo;
use crate::load::{date_parser, utils};
use crate::table::{column, with_column};
use anyhow::{anyhow, bail, Context, Result};
use arrow::{
    array::{
        ArrayRef, BooleanBuilder, Date32Builder, Float64Builder, Int64Builder, StringArray,
        StringBuilder, TimestampMillisecondBuilder,
    },
    compute::cast,
    datatypes::{DataType, TimeUnit},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Convert string columns into the inferred final types
pub fn convert_to_final_types(batch: &RecordBatch, schema_info: &SchemaInfo) -> Result<RecordBatch> {
    let mut out = Vec::with_capacity(batch.num_columns());

    for (arr, fld) in batch.columns().iter().zip(schema_info.schema.fields()) {
        match arr.as_any().downcast_ref::<StringArray>() {
            Some(sarr) => out.push(
                convert_strings(sarr, fld.data_type())
                    .with_context(|| format!("converting column `{}`", fld.name()))?,
            ),
            None => out.push(arr.clone()),
        }
    }

    let schema = Arc::new(schema_info.schema.clone());
    RecordBatch::try_new(schema, out).map_err(Into::into)
}

fn bad_value(row: usize, raw: &str, ty: &DataType) -> anyhow::Error {
    anyhow!("row {}: `{}` is not a valid {}", row, raw, ty)
}

/// Strictly parse every cleaned string as `ty`. Empty cells become nulls;
/// anything else that does not parse is an error naming the row.
pub fn convert_strings(sarr: &StringArray, ty: &DataType) -> Result<ArrayRef> {
    let cleaned = sarr.iter().map(|opt| {
        opt.map(utils::clean_str).filter(|s| !s.is_empty())
    });

    let arr: ArrayRef = match ty {
        DataType::Utf8 => {
            let mut b = StringBuilder::new();
            for v in cleaned {
                b.append_option(v);
            }
            Arc::new(b.finish())
        }
        DataType::Int64 => {
            let mut b = Int64Builder::new();
            for (row, v) in cleaned.enumerate() {
                match v {
                    Some(s) => b.append_value(s.parse().map_err(|_| bad_value(row, &s, ty))?),
                    None => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Float64 => {
            let mut b = Float64Builder::new();
            for (row, v) in cleaned.enumerate() {
                match v {
                    Some(s) => b.append_value(s.parse().map_err(|_| bad_value(row, &s, ty))?),
                    None => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Boolean => {
            let mut b = BooleanBuilder::new();
            for (row, v) in cleaned.enumerate() {
                match v {
                    Some(s) => {
                        b.append_value(utils::parse_bool(&s).ok_or_else(|| bad_value(row, &s, ty))?)
                    }
                    None => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Date32 => {
            let mut b = Date32Builder::new();
            for (row, v) in cleaned.enumerate() {
                match v {
                    Some(s) => {
                        let d = date_parser::parse_date(&s).ok_or_else(|| bad_value(row, &s, ty))?;
                        b.append_value(date_parser::date_to_days(d));
                    }
                    None => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Timestamp(TimeUnit::Millisecond, None) => {
            let mut b = TimestampMillisecondBuilder::new();
            for (row, v) in cleaned.enumerate() {
                match v {
                    Some(s) => {
                        // date-only values land on midnight
                        let dt = date_parser::parse_datetime(&s)
                            .or_else(|| {
                                date_parser::parse_date(&s).and_then(|d| d.and_hms_opt(0, 0, 0))
                            })
                            .ok_or_else(|| bad_value(row, &s, ty))?;
                        b.append_value(date_parser::datetime_to_millis(dt));
                    }
                    None => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        other => bail!("unsupported target type {}", other),
    };
    Ok(arr)
}

/// Re-type one column of an existing table. Text columns are parsed strictly;
/// other columns go through an Arrow cast.
pub fn convert_column(batch: &RecordBatch, name: &str, ty: &DataType) -> Result<RecordBatch> {
    let arr = column(batch, name)?;
    let converted = match arr.as_any().downcast_ref::<StringArray>() {
        Some(sarr) => convert_strings(sarr, ty),
        None => cast(arr, ty).map_err(Into::into),
    }
    .with_context(|| format!("converting column `{}` to {}", name, ty))?;
    with_column(batch, name, converted)
}

pub fn to_numeric(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    convert_column(batch, name, &DataType::Float64)
}

pub fn to_int(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    convert_column(batch, name, &DataType::Int64)
}

pub fn to_bool(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    convert_column(batch, name, &DataType::Boolean)
}

pub fn to_date(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    convert_column(batch, name, &DataType::Date32)
}

pub fn to_datetime(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    convert_column(
        batch,
        name,
        &DataType::Timestamp(TimeUnit::Millisecond, None),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{bool_values, f64_values, from_columns, i64_values};
    use arrow::array::Array;

    fn text(name: &str, values: Vec<Option<&str>>) -> Result<RecordBatch> {
        from_columns(vec![(name, Arc::new(StringArray::from(values)) as ArrayRef)])
    }

    #[test]
    fn numeric_conversion_keeps_blanks_as_nulls() -> Result<()> {
        let batch = text("Amount", vec![Some("1200.50"), Some(" "), None, Some("\"800\"")])?;
        let out = to_numeric(&batch, "Amount")?;
        assert_eq!(
            f64_values(&out, "Amount")?,
            vec![Some(1200.5), None, None, Some(800.0)]
        );
        Ok(())
    }

    #[test]
    fn unparsable_value_is_an_error() -> Result<()> {
        let batch = text("Quantity", vec![Some("3"), Some("three")])?;
        let err = format!("{:#}", to_int(&batch, "Quantity").unwrap_err());
        assert!(err.contains("row 1"));
        assert!(err.contains("three"));
        Ok(())
    }

    #[test]
    fn bools_and_dates() -> Result<()> {
        let batch = text("Premium", vec![Some("True"), Some("False")])?;
        assert_eq!(
            bool_values(&to_bool(&batch, "Premium")?, "Premium")?,
            vec![Some(true), Some(false)]
        );

        let batch = text("Date", vec![Some("2026-01-01"), Some("2026-01-08")])?;
        let out = to_date(&batch, "Date")?;
        assert_eq!(out.column(0).data_type(), &DataType::Date32);
        assert_eq!(i64_values(&out, "Date")?[1], Some(20461));

        let dt = to_datetime(&batch, "Date")?;
        assert_eq!(dt.column(0).null_count(), 0);
        Ok(())
    }

    #[test]
    fn non_text_columns_are_cast() -> Result<()> {
        let batch = from_columns(vec![(
            "Quantity",
            Arc::new(arrow::array::Int64Array::from(vec![1, 2])) as ArrayRef,
        )])?;
        let out = to_numeric(&batch, "Quantity")?;
        assert_eq!(out.column(0).data_type(), &DataType::Float64);
        Ok(())
    }
}
