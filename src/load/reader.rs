use crate::load::{
    convert::{convert_strings, convert_to_final_types},
    infer::analyze_batch_for_schema,
};
use crate::schema::validate;
use crate::table::{column, from_columns};
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::Schema,
    record_batch::RecordBatch,
};
use std::{fs::File, io::Read, path::Path, sync::Arc};
use tracing::{debug, info, instrument};

/// Read CSV with a header row into all-text columns. Blank cells are nulls.
pub fn read_raw<R: Read>(reader: R) -> Result<RecordBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV record {}", line + 1))?;
        for (i, col) in columns.iter_mut().enumerate() {
            let cell = record.get(i).filter(|s| !s.is_empty()).map(str::to_string);
            col.push(cell);
        }
    }

    let arrays: Vec<(String, ArrayRef)> = headers
        .into_iter()
        .zip(columns)
        .map(|(h, values)| (h, Arc::new(StringArray::from(values)) as ArrayRef))
        .collect();
    from_columns(arrays)
}

/// Read a CSV file, inferring one type per column.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let batch = read_csv_from(file).with_context(|| format!("loading {}", path.display()))?;
    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "loaded {}",
        path.display()
    );
    Ok(batch)
}

pub fn read_csv_from<R: Read>(reader: R) -> Result<RecordBatch> {
    let raw = read_raw(reader)?;
    let info = analyze_batch_for_schema(&raw)?;
    debug!(
        dates = ?info.date_columns,
        trimmed = ?info.trim_columns,
        "inferred schema"
    );
    convert_to_final_types(&raw, &info)
}

/// Load a CSV into a declared schema: every declared column must be present
/// and parse as its declared type. Undeclared columns are kept, inferred.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_csv_with_schema<P: AsRef<Path>>(path: P, schema: &Schema) -> Result<RecordBatch> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let raw = read_raw(file).with_context(|| format!("loading {}", path.display()))?;
    let mut typed = convert_to_final_types(&raw, &analyze_batch_for_schema(&raw)?)?;

    for field in schema.fields() {
        let text = column(&raw, field.name())
            .with_context(|| format!("{} does not match the expected layout", path.display()))?;
        if let Some(sarr) = text.as_any().downcast_ref::<StringArray>() {
            let arr = convert_strings(sarr, field.data_type()).with_context(|| {
                format!("column `{}` in {}", field.name(), path.display())
            })?;
            typed = crate::table::with_column(&typed, field.name(), arr)?;
        }
    }

    validate(&typed, schema)?;
    info!(rows = typed.num_rows(), "loaded {} with declared schema", path.display());
    Ok(typed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sales_schema;
    use crate::table::{column_names, f64_values, str_values};
    use crate::test_support::init_test_logging;
    use arrow::datatypes::DataType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SALES: &str = "Date,Product,Region,Quantity,Unit_Price,Revenue\n\
        2026-01-01,Laptop,North,2,45000,90000\n\
        2026-01-02, Mouse ,South,5,500,2500\n";

    #[test]
    fn infers_types_from_csv() -> Result<()> {
        init_test_logging();
        let batch = read_csv_from(SALES.as_bytes())?;
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Date32);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(3).data_type(), &DataType::Int64);
        assert_eq!(str_values(&batch, "Product")?[1].as_deref(), Some("Mouse"));
        Ok(())
    }

    #[test]
    fn blank_cells_are_null() -> Result<()> {
        let batch = read_csv_from("name,score\nAsha,4.5\nRavi,\n".as_bytes())?;
        assert_eq!(f64_values(&batch, "score")?, vec![Some(4.5), None]);
        Ok(())
    }

    #[test]
    fn loads_with_declared_schema() -> Result<()> {
        init_test_logging();
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(SALES.as_bytes())?;
        let batch = load_csv_with_schema(tmp.path(), &sales_schema())?;
        assert_eq!(
            column_names(&batch),
            vec!["Date", "Product", "Region", "Quantity", "Unit_Price", "Revenue"]
        );
        assert_eq!(batch.schema().field(5).data_type(), &DataType::Int64);
        Ok(())
    }

    #[test]
    fn missing_declared_column_is_reported() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"Date,Product\n2026-01-01,Laptop\n")?;
        let err = format!("{:#}", load_csv_with_schema(tmp.path(), &sales_schema()).unwrap_err());
        assert!(err.contains("Region"), "{}", err);
        Ok(())
    }
}
