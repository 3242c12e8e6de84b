// src/table/access.rs
use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
};

/// Look up a column by name, naming the available columns on failure.
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| {
        anyhow!(
            "column `{}` not found (available: {})",
            name,
            column_names(batch).join(", ")
        )
    })
}

pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// Cast any numeric (or numeric-looking text) array to `Float64` values.
pub fn array_f64(arr: &ArrayRef) -> Result<Vec<Option<f64>>> {
    let casted = cast(arr, &DataType::Float64)
        .with_context(|| format!("cannot read {:?} as Float64", arr.data_type()))?;
    let floats = casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| anyhow!("cast to Float64 produced {:?}", casted.data_type()))?;
    Ok(floats.iter().collect())
}

pub fn array_i64(arr: &ArrayRef) -> Result<Vec<Option<i64>>> {
    let casted = cast(arr, &DataType::Int64)
        .with_context(|| format!("cannot read {:?} as Int64", arr.data_type()))?;
    let ints = casted
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| anyhow!("cast to Int64 produced {:?}", casted.data_type()))?;
    Ok(ints.iter().collect())
}

pub fn array_str(arr: &ArrayRef) -> Result<Vec<Option<String>>> {
    let casted = cast(arr, &DataType::Utf8)
        .with_context(|| format!("cannot read {:?} as Utf8", arr.data_type()))?;
    let strings = casted
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("cast to Utf8 produced {:?}", casted.data_type()))?;
    Ok(strings.iter().map(|v| v.map(str::to_string)).collect())
}

pub fn f64_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<f64>>> {
    array_f64(column(batch, name)?).with_context(|| format!("reading column `{}`", name))
}

pub fn i64_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<i64>>> {
    array_i64(column(batch, name)?).with_context(|| format!("reading column `{}`", name))
}

pub fn str_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<String>>> {
    array_str(column(batch, name)?).with_context(|| format!("reading column `{}`", name))
}

pub fn bool_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<bool>>> {
    let arr = column(batch, name)?;
    let casted = cast(arr, &DataType::Boolean)
        .with_context(|| format!("reading column `{}` as Boolean", name))?;
    let bools = casted
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| anyhow!("cast to Boolean produced {:?}", casted.data_type()))?;
    Ok(bools.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::from_columns;
    use std::sync::Arc;

    fn sample() -> Result<RecordBatch> {
        from_columns(vec![
            (
                "Product",
                Arc::new(StringArray::from(vec![Some("Laptop"), None])) as ArrayRef,
            ),
            ("Quantity", Arc::new(Int64Array::from(vec![3, 5])) as ArrayRef),
        ])
    }

    #[test]
    fn missing_column_names_the_alternatives() -> Result<()> {
        let batch = sample()?;
        let err = column(&batch, "Revenue").unwrap_err().to_string();
        assert!(err.contains("Revenue"));
        assert!(err.contains("Product, Quantity"));
        Ok(())
    }

    #[test]
    fn extractors_cast_and_keep_nulls() -> Result<()> {
        let batch = sample()?;
        assert_eq!(f64_values(&batch, "Quantity")?, vec![Some(3.0), Some(5.0)]);
        assert_eq!(
            str_values(&batch, "Product")?,
            vec![Some("Laptop".to_string()), None]
        );
        assert_eq!(str_values(&batch, "Quantity")?[1].as_deref(), Some("5"));
        Ok(())
    }
}
