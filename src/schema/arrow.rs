// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit};

use super::types::Column;

/// Map a declared column type name into an Arrow DataType.
///
/// Covers:
/// - DATE                    → Date32
/// - DATETIME, TIMESTAMP     → Timestamp(ms, naive)
/// - INT, INTEGER, BIGINT    → Int64
/// - FLOAT, DOUBLE, NUMBER   → Float64
/// - BOOL, BOOLEAN           → Boolean
/// - fallback                → Utf8
pub fn map_to_arrow_type(ty: &str) -> DataType {
    match ty.to_ascii_uppercase().as_str() {
        "DATE" => DataType::Date32,
        "DATETIME" | "TIMESTAMP" => DataType::Timestamp(TimeUnit::Millisecond, None),
        "INT" | "INTEGER" | "BIGINT" => DataType::Int64,
        "FLOAT" | "DOUBLE" | "NUMBER" => DataType::Float64,
        "BOOL" | "BOOLEAN" => DataType::Boolean,
        _ => DataType::Utf8,
    }
}

/// Build an Arrow schema from declared columns; every field is nullable.
pub fn build_arrow_schema(cols: &[Column]) -> ArrowSchema {
    let fields: Vec<ArrowField> = cols
        .iter()
        .map(|c| ArrowField::new(c.name, map_to_arrow_type(c.ty), true))
        .collect();
    ArrowSchema::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_declared_names() {
        assert_eq!(map_to_arrow_type("date"), DataType::Date32);
        assert_eq!(map_to_arrow_type("BIGINT"), DataType::Int64);
        assert_eq!(map_to_arrow_type("float"), DataType::Float64);
        assert_eq!(map_to_arrow_type("varchar"), DataType::Utf8);
    }
}
