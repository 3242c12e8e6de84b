use crate::load::utils::{clean_str, fits, infer_arrow_dtype_from_str, widen};
use anyhow::Result;
use arrow::{
    array::StringArray,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use tracing::debug;

/// Holds final schema + which cols need date-parsing or trimming
pub struct SchemaInfo {
    pub schema: Schema,
    pub date_columns: Vec<String>,
    pub trim_columns: Vec<String>,
}

/// Analyze a raw string batch: type each column from its first non-empty
/// value, then widen if a later value does not fit.
pub fn analyze_batch_for_schema(batch: &RecordBatch) -> Result<SchemaInfo> {
    let mut final_fields = Vec::with_capacity(batch.num_columns());
    let mut date_columns = Vec::new();
    let mut trim_columns = Vec::new();

    for (fld, col) in batch.schema().fields().iter().zip(batch.columns()) {
        let name = fld.name();
        let Some(sarr) = col.as_any().downcast_ref::<StringArray>() else {
            final_fields.push(fld.as_ref().clone());
            continue;
        };

        let mut ty: Option<DataType> = None;
        for raw in sarr.iter().flatten() {
            let cleaned = clean_str(raw);
            if cleaned.is_empty() {
                continue;
            }
            if cleaned != raw && !trim_columns.contains(name) {
                trim_columns.push(name.clone());
            }
            ty = Some(match ty {
                None => infer_arrow_dtype_from_str(&cleaned),
                Some(t) if fits(&cleaned, &t) => t,
                Some(t) => {
                    let wider = widen(&t, &cleaned);
                    debug!(column = %name, from = ?t, to = ?wider, value = %cleaned, "widening column type");
                    wider
                }
            });
        }

        let ty = ty.unwrap_or(DataType::Utf8);
        if matches!(ty, DataType::Date32 | DataType::Timestamp(_, _)) {
            date_columns.push(name.clone());
        }
        final_fields.push(Field::new(name, ty, true));
    }

    Ok(SchemaInfo {
        schema: Schema::new(final_fields),
        date_columns,
        trim_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::from_columns;
    use arrow::array::ArrayRef;
    use arrow::datatypes::TimeUnit;
    use std::sync::Arc;

    fn raw(name: &str, values: Vec<Option<&str>>) -> (String, ArrayRef) {
        (name.to_string(), Arc::new(StringArray::from(values)) as ArrayRef)
    }

    #[test]
    fn types_columns_and_tracks_dates() -> Result<()> {
        let batch = from_columns(vec![
            raw("Date", vec![Some("2026-01-01"), Some("2026-01-02")]),
            raw("Quantity", vec![None, Some(" 3 ")]),
            raw("Price", vec![Some("5"), Some("5.5")]),
            raw("When", vec![Some("2025-01-01 00:00:00"), None]),
            raw("Code", vec![Some("12"), Some("A7")]),
        ])?;
        let info = analyze_batch_for_schema(&batch)?;
        let types: Vec<DataType> = info
            .schema
            .fields()
            .iter()
            .map(|f| f.data_type().clone())
            .collect();
        assert_eq!(
            types,
            vec![
                DataType::Date32,
                DataType::Int64,
                DataType::Float64,
                DataType::Timestamp(TimeUnit::Millisecond, None),
                DataType::Utf8,
            ]
        );
        assert_eq!(info.date_columns, vec!["Date", "When"]);
        Ok(())
    }

    #[test]
    fn all_empty_column_is_text() -> Result<()> {
        let batch = from_columns(vec![raw("Notes", vec![None, Some("  ")])])?;
        let info = analyze_batch_for_schema(&batch)?;
        assert_eq!(info.schema.field(0).data_type(), &DataType::Utf8);
        Ok(())
    }
}
