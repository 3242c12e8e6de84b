// src/table/columns.rs
use anyhow::{bail, Context, Result};
use arrow::{
    array::ArrayRef,
    datatypes::{Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Build a batch from named columns. Every field is nullable so batches built
/// here concatenate cleanly with loaded or derived ones.
pub fn from_columns<N: AsRef<str>>(columns: Vec<(N, ArrayRef)>) -> Result<RecordBatch> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, arr)| Field::new(name.as_ref(), arr.data_type().clone(), true))
        .collect();
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, arr)| arr).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("assembling table")
}

/// Add `array` as column `name`, replacing (in place) a column of the same name.
pub fn with_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut arrays: Vec<ArrayRef> = batch.columns().to_vec();
    let field = Field::new(name, array.data_type().clone(), true);

    match schema.index_of(name) {
        Ok(i) => {
            fields[i] = field;
            arrays[i] = array;
        }
        Err(_) => {
            fields.push(field);
            arrays.push(array);
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .with_context(|| format!("adding column `{}`", name))
}

pub fn select_columns(batch: &RecordBatch, names: &[&str]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        let i = schema
            .index_of(name)
            .with_context(|| format!("selecting column `{}`", name))?;
        indices.push(i);
    }
    Ok(batch.project(&indices)?)
}

pub fn drop_columns(batch: &RecordBatch, names: &[&str]) -> Result<RecordBatch> {
    let schema = batch.schema();
    for name in names {
        if schema.index_of(name).is_err() {
            bail!("cannot drop `{}`: no such column", name);
        }
    }
    let keep: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !names.contains(&f.name().as_str()))
        .map(|(i, _)| i)
        .collect();
    Ok(batch.project(&keep)?)
}

/// Rename columns by `(old, new)` pairs; unknown old names are an error.
pub fn rename_columns(batch: &RecordBatch, renames: &[(&str, &str)]) -> Result<RecordBatch> {
    let schema = batch.schema();
    for (old, _) in renames {
        if schema.index_of(old).is_err() {
            bail!("cannot rename `{}`: no such column", old);
        }
    }
    map_column_names(batch, |name| {
        renames
            .iter()
            .find(|(old, _)| *old == name)
            .map(|(_, new)| new.to_string())
            .unwrap_or_else(|| name.to_string())
    })
}

/// Apply `f` to every column name, e.g. lower-casing and replacing spaces.
pub fn map_column_names<F>(batch: &RecordBatch, f: F) -> Result<RecordBatch>
where
    F: Fn(&str) -> String,
{
    let fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .map(|fld| fld.as_ref().clone().with_name(f(fld.name())))
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), batch.columns().to_vec())
        .context("renaming columns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{column_names, f64_values};
    use arrow::array::{Float64Array, StringArray};

    fn sample() -> Result<RecordBatch> {
        from_columns(vec![
            (
                "Product Name",
                Arc::new(StringArray::from(vec!["Laptop", "Mouse"])) as ArrayRef,
            ),
            (
                "Unit Price",
                Arc::new(Float64Array::from(vec![45000.0, 500.0])) as ArrayRef,
            ),
        ])
    }

    #[test]
    fn replacing_a_column_keeps_its_position() -> Result<()> {
        let batch = sample()?;
        let doubled = Arc::new(Float64Array::from(vec![90000.0, 1000.0])) as ArrayRef;
        let out = with_column(&batch, "Unit Price", doubled)?;
        assert_eq!(column_names(&out), vec!["Product Name", "Unit Price"]);
        assert_eq!(f64_values(&out, "Unit Price")?[0], Some(90000.0));
        Ok(())
    }

    #[test]
    fn normalises_headers() -> Result<()> {
        let out = map_column_names(&sample()?, |n| n.to_lowercase().replace(' ', "_"))?;
        assert_eq!(column_names(&out), vec!["product_name", "unit_price"]);
        Ok(())
    }

    #[test]
    fn drop_and_rename_reject_unknown_columns() -> Result<()> {
        let batch = sample()?;
        assert!(drop_columns(&batch, &["Stock"]).is_err());
        assert!(rename_columns(&batch, &[("Stock", "Qty")]).is_err());
        let out = drop_columns(&batch, &["Unit Price"])?;
        assert_eq!(column_names(&out), vec!["Product Name"]);
        Ok(())
    }
}
