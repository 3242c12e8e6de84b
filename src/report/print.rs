use crate::table::access::array_f64;
use crate::temporal::naive_datetimes;
use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef},
    datatypes::DataType,
    record_batch::RecordBatch,
    util::display::array_value_to_string,
};
use prettytable::{format, Cell, Row, Table};

const NULL_CELL: &str = "NaN";

/// Display strings for every cell of `arr`. Floats get two decimals,
/// timestamps `YYYY-MM-DD HH:MM:SS`, nulls `NaN`.
pub fn format_column(arr: &ArrayRef) -> Result<Vec<String>> {
    let cells = match arr.data_type() {
        DataType::Float16 | DataType::Float32 | DataType::Float64 => array_f64(arr)?
            .into_iter()
            .map(|v| v.map_or_else(|| NULL_CELL.to_string(), |v| format!("{:.2}", v)))
            .collect(),
        DataType::Timestamp(_, _) | DataType::Date64 => naive_datetimes(arr)?
            .into_iter()
            .map(|v| {
                v.map_or_else(
                    || NULL_CELL.to_string(),
                    |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                )
            })
            .collect(),
        _ => (0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    Ok(NULL_CELL.to_string())
                } else {
                    array_value_to_string(arr.as_ref(), i).context("formatting cell")
                }
            })
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(cells)
}

pub fn format_cell(arr: &ArrayRef, row: usize) -> Result<String> {
    anyhow::ensure!(row < arr.len(), "row {} out of range for {} rows", row, arr.len());
    format_column(&arr.slice(row, 1))?
        .into_iter()
        .next()
        .context("empty cell slice")
}

/// Box-drawn table with a bold green header; numeric columns right aligned.
pub fn render_table(batch: &RecordBatch) -> Result<Table> {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    let schema = batch.schema();
    table.set_titles(Row::new(
        schema
            .fields()
            .iter()
            .map(|f| Cell::new(f.name()).style_spec("bFg"))
            .collect(),
    ));

    let columns = batch
        .columns()
        .iter()
        .map(format_column)
        .collect::<Result<Vec<_>>>()?;
    let numeric: Vec<bool> = schema
        .fields()
        .iter()
        .map(|f| f.data_type().is_numeric())
        .collect();

    for row in 0..batch.num_rows() {
        table.add_row(Row::new(
            columns
                .iter()
                .zip(&numeric)
                .map(|(cells, &num)| {
                    let cell = Cell::new(&cells[row]);
                    if num {
                        cell.style_spec("r")
                    } else {
                        cell
                    }
                })
                .collect(),
        ));
    }
    Ok(table)
}

pub fn print_table(batch: &RecordBatch) -> Result<()> {
    render_table(batch)?.printstd();
    Ok(())
}

/// Plain-text rendering, for logs and tests.
pub fn table_string(batch: &RecordBatch) -> Result<String> {
    Ok(render_table(batch)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::from_columns;
    use arrow::array::{BooleanArray, Date32Array, Float64Array, StringArray, TimestampMillisecondArray};
    use std::sync::Arc;

    #[test]
    fn formats_cells_by_type() -> Result<()> {
        let floats: ArrayRef = Arc::new(Float64Array::from(vec![Some(1.254), None, Some(2.0)]));
        assert_eq!(format_column(&floats)?, vec!["1.25", "NaN", "2.00"]);

        // 2026-01-01 12:30:00
        let ts: ArrayRef = Arc::new(TimestampMillisecondArray::from(vec![1_767_270_600_000]));
        assert_eq!(format_cell(&ts, 0)?, "2026-01-01 12:30:00");

        let dates: ArrayRef = Arc::new(Date32Array::from(vec![Some(20454), None]));
        assert_eq!(format_column(&dates)?, vec!["2026-01-01", "NaN"]);

        let flags: ArrayRef = Arc::new(BooleanArray::from(vec![true]));
        assert_eq!(format_cell(&flags, 0)?, "true");
        Ok(())
    }

    #[test]
    fn renders_header_and_rows() -> Result<()> {
        let batch = from_columns(vec![
            ("Region", Arc::new(StringArray::from(vec!["North", "South"])) as ArrayRef),
            ("Total", Arc::new(Float64Array::from(vec![1500.0, 900.5])) as ArrayRef),
        ])?;
        let table = render_table(&batch)?;
        assert_eq!(table.len(), 2);
        let text = table_string(&batch)?;
        assert!(text.contains("Region"));
        assert!(text.contains("900.50"));
        Ok(())
    }
}
