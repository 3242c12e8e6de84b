use crate::table::{access::array_str, column, with_column};
use anyhow::Result;
use arrow::{
    array::{BooleanArray, Int64Array, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Upper-case the first letter of every whitespace-separated word and
/// lower-case the rest. Runs of whitespace collapse to one space.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn first_word(s: &str) -> String {
    s.split_whitespace().next().unwrap_or_default().to_string()
}

/// First `n` characters.
pub fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Element-wise string function; nulls stay null.
pub fn map_str<F>(batch: &RecordBatch, source: &str, name: &str, f: F) -> Result<RecordBatch>
where
    F: Fn(&str) -> String,
{
    let out: StringArray = array_str(column(batch, source)?)?
        .iter()
        .map(|v| v.as_deref().map(&f))
        .collect();
    with_column(batch, name, Arc::new(out))
}

pub fn upper(batch: &RecordBatch, source: &str, name: &str) -> Result<RecordBatch> {
    map_str(batch, source, name, str::to_uppercase)
}

pub fn lower(batch: &RecordBatch, source: &str, name: &str) -> Result<RecordBatch> {
    map_str(batch, source, name, str::to_lowercase)
}

pub fn replace(batch: &RecordBatch, source: &str, name: &str, from: &str, to: &str) -> Result<RecordBatch> {
    map_str(batch, source, name, |s| s.replace(from, to))
}

/// Character count as `Int64`.
pub fn str_len(batch: &RecordBatch, source: &str, name: &str) -> Result<RecordBatch> {
    let out: Int64Array = array_str(column(batch, source)?)?
        .iter()
        .map(|v| v.as_ref().map(|s| s.chars().count() as i64))
        .collect();
    with_column(batch, name, Arc::new(out))
}

/// Case-sensitive substring test as `Boolean`.
pub fn str_contains(batch: &RecordBatch, source: &str, name: &str, pattern: &str) -> Result<RecordBatch> {
    let out: BooleanArray = array_str(column(batch, source)?)?
        .iter()
        .map(|v| v.as_ref().map(|s| s.contains(pattern)))
        .collect();
    with_column(batch, name, Arc::new(out))
}
