use anyhow::{bail, Result};
use arrow::{datatypes::Schema, record_batch::RecordBatch};
use tracing::warn;

/// Check that every declared field is present with the declared type.
/// Extra columns are allowed. All problems are reported together.
pub fn validate(batch: &RecordBatch, expected: &Schema) -> Result<()> {
    let actual = batch.schema();
    let mut problems = Vec::new();

    for field in expected.fields() {
        match actual.field_with_name(field.name()) {
            Ok(found) if found.data_type() == field.data_type() => {}
            Ok(found) => problems.push(format!(
                "`{}` is {} (expected {})",
                field.name(),
                found.data_type(),
                field.data_type()
            )),
            Err(_) => problems.push(format!("`{}` is missing", field.name())),
        }
    }

    if !problems.is_empty() {
        warn!(count = problems.len(), "schema validation failed");
        bail!("schema mismatch: {}", problems.join("; "));
    }
    Ok(())
}
