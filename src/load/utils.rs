use crate::load::date_parser;
use arrow::datatypes::{DataType, TimeUnit};

/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// 2) `"True"`/`"False"` (any case) → bool.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// 3) Infer Arrow dtype from a cleaned string, most specific first.
pub fn infer_arrow_dtype_from_str(s: &str) -> DataType {
    if parse_bool(s).is_some() {
        DataType::Boolean
    } else if s.parse::<i64>().is_ok() {
        DataType::Int64
    } else if s.parse::<f64>().is_ok() {
        DataType::Float64
    } else if date_parser::parse_date(s).is_some() {
        DataType::Date32
    } else if date_parser::parse_datetime(s).is_some() {
        DataType::Timestamp(TimeUnit::Millisecond, None)
    } else {
        DataType::Utf8
    }
}

/// 4) Whether a cleaned value can be stored as `ty`.
pub fn fits(s: &str, ty: &DataType) -> bool {
    match ty {
        DataType::Boolean => parse_bool(s).is_some(),
        DataType::Int64 => s.parse::<i64>().is_ok(),
        DataType::Float64 => s.parse::<f64>().is_ok(),
        DataType::Date32 => date_parser::parse_date(s).is_some(),
        DataType::Timestamp(TimeUnit::Millisecond, _) => date_parser::parse_datetime(s).is_some(),
        DataType::Utf8 => true,
        _ => false,
    }
}

/// 5) The type a column falls back to when a later value doesn't fit `ty`.
pub fn widen(ty: &DataType, s: &str) -> DataType {
    match ty {
        DataType::Int64 if s.parse::<f64>().is_ok() => DataType::Float64,
        DataType::Date32 if date_parser::parse_datetime(s).is_some() => {
            DataType::Timestamp(TimeUnit::Millisecond, None)
        }
        _ => DataType::Utf8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_quotes_and_whitespace() {
        assert_eq!(clean_str("  \"Laptop\" "), "Laptop");
        assert_eq!(clean_str("' mouse '"), "mouse");
        assert_eq!(clean_str("\""), "\"");
    }

    #[test]
    fn infers_most_specific_type() {
        assert_eq!(infer_arrow_dtype_from_str("True"), DataType::Boolean);
        assert_eq!(infer_arrow_dtype_from_str("42"), DataType::Int64);
        assert_eq!(infer_arrow_dtype_from_str("1200.50"), DataType::Float64);
        assert_eq!(infer_arrow_dtype_from_str("2026-01-07"), DataType::Date32);
        assert_eq!(
            infer_arrow_dtype_from_str("2025-01-01 12:00:00"),
            DataType::Timestamp(TimeUnit::Millisecond, None)
        );
        assert_eq!(infer_arrow_dtype_from_str("North"), DataType::Utf8);
    }

    #[test]
    fn widening() {
        assert_eq!(widen(&DataType::Int64, "2.5"), DataType::Float64);
        assert_eq!(widen(&DataType::Int64, "n/a"), DataType::Utf8);
        assert!(fits("7", &DataType::Float64));
    }
}
