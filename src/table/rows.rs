// src/table/rows.rs
use anyhow::{bail, Context, Result};
use arrow::{
    array::UInt32Array,
    compute::{concat_batches, take_record_batch},
    record_batch::RecordBatch,
};
use rand::{rngs::StdRng, seq::index};

pub fn head(batch: &RecordBatch, n: usize) -> RecordBatch {
    batch.slice(0, n.min(batch.num_rows()))
}

pub fn tail(batch: &RecordBatch, n: usize) -> RecordBatch {
    let n = n.min(batch.num_rows());
    batch.slice(batch.num_rows() - n, n)
}

/// Rows `start..end`, clamped to the table.
pub fn slice(batch: &RecordBatch, start: usize, end: usize) -> RecordBatch {
    let start = start.min(batch.num_rows());
    let end = end.clamp(start, batch.num_rows());
    batch.slice(start, end - start)
}

pub fn take_rows(batch: &RecordBatch, indices: &[u32]) -> Result<RecordBatch> {
    let idx = UInt32Array::from(indices.to_vec());
    take_record_batch(batch, &idx).context("taking rows")
}

/// Concatenate tables that share one schema.
pub fn concat(batches: &[RecordBatch]) -> Result<RecordBatch> {
    let Some(first) = batches.first() else {
        bail!("cannot concatenate zero tables");
    };
    concat_batches(&first.schema(), batches).context("concatenating tables")
}

/// Append `extra` rows below `batch`; the column layout must match.
pub fn append_rows(batch: &RecordBatch, extra: &RecordBatch) -> Result<RecordBatch> {
    if batch.schema().fields() != extra.schema().fields() {
        bail!(
            "cannot append rows: schemas differ ({:?} vs {:?})",
            batch.schema().fields(),
            extra.schema().fields()
        );
    }
    concat(&[batch.clone(), extra.clone()])
}

/// `n` distinct rows drawn uniformly, returned in the order drawn.
pub fn sample(batch: &RecordBatch, n: usize, rng: &mut StdRng) -> Result<RecordBatch> {
    let n = n.min(batch.num_rows());
    let picked: Vec<u32> = index::sample(rng, batch.num_rows(), n)
        .into_iter()
        .map(|i| i as u32)
        .collect();
    take_rows(batch, &picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{from_columns, i64_values};
    use arrow::array::{ArrayRef, Int64Array};
    use rand::SeedableRng;
    use std::sync::Arc;

    fn numbers(n: i64) -> Result<RecordBatch> {
        from_columns(vec![(
            "n",
            Arc::new(Int64Array::from((0..n).collect::<Vec<_>>())) as ArrayRef,
        )])
    }

    #[test]
    fn head_tail_and_slice_clamp() -> Result<()> {
        let batch = numbers(5)?;
        assert_eq!(i64_values(&head(&batch, 2), "n")?, vec![Some(0), Some(1)]);
        assert_eq!(i64_values(&tail(&batch, 2), "n")?, vec![Some(3), Some(4)]);
        assert_eq!(head(&batch, 50).num_rows(), 5);
        assert_eq!(i64_values(&slice(&batch, 1, 3), "n")?, vec![Some(1), Some(2)]);
        assert_eq!(slice(&batch, 4, 2).num_rows(), 0);
        Ok(())
    }

    #[test]
    fn append_keeps_order() -> Result<()> {
        let out = append_rows(&numbers(2)?, &numbers(1)?)?;
        assert_eq!(i64_values(&out, "n")?, vec![Some(0), Some(1), Some(0)]);
        Ok(())
    }

    #[test]
    fn sample_is_reproducible_and_distinct() -> Result<()> {
        let batch = numbers(20)?;
        let a = sample(&batch, 5, &mut StdRng::seed_from_u64(42))?;
        let b = sample(&batch, 5, &mut StdRng::seed_from_u64(42))?;
        let va = i64_values(&a, "n")?;
        assert_eq!(va, i64_values(&b, "n")?);
        let mut sorted = va.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 5);
        Ok(())
    }
}
