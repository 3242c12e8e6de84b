use crate::table::access::{array_f64, array_i64, array_str};
use anyhow::Result;
use arrow::{
    array::{Array, ArrayRef, BooleanArray},
    datatypes::DataType,
};
use std::fmt;

/// One component of a group key, as handed to per-group callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Null => write!(f, "NaN"),
            KeyValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            KeyValue::Int(i) => write!(f, "{}", i),
            KeyValue::Float(x) => write!(f, "{}", x),
            KeyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Key values for every row of `arr`. Dates and timestamps come out as
/// their integer representation.
pub fn key_values(arr: &ArrayRef) -> Result<Vec<KeyValue>> {
    let keys = match arr.data_type() {
        DataType::Boolean => {
            let bools = arr
                .as_any()
                .downcast_ref::<BooleanArray>()
                .map(|b| b.iter().collect::<Vec<_>>())
                .unwrap_or_default();
            bools
                .into_iter()
                .map(|v| v.map_or(KeyValue::Null, KeyValue::Bool))
                .collect()
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => array_f64(arr)?
            .into_iter()
            .map(|v| v.map_or(KeyValue::Null, KeyValue::Float))
            .collect(),
        dt if dt.is_integer() || dt.is_temporal() => array_i64(arr)?
            .into_iter()
            .map(|v| v.map_or(KeyValue::Null, KeyValue::Int))
            .collect(),
        _ => array_str(arr)?
            .into_iter()
            .map(|v| v.map_or(KeyValue::Null, KeyValue::Text))
            .collect(),
    };
    Ok(keys)
}

/// Human-readable form of a composite key, components joined by `" | "`.
pub fn display_key(key: &[KeyValue]) -> String {
    key.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}
