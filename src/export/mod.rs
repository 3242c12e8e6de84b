//! Report outputs: CSV, Parquet and JSON writers plus output listing.
//!
//! Every writer creates `<name>.tmp` next to the target and renames it into
//! place once the file is closed, so a half-written output never carries the
//! final name.

use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use glob::glob;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    Ok(())
}

/// Write `batch` as CSV with a header row.
#[instrument(level = "debug", skip(batch), fields(path = %path.display()))]
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let tmp = tmp_path(path);

    // 1) write everything to the tmp file
    {
        let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        let mut writer = WriterBuilder::new()
            .with_header(true)
            .build(BufWriter::new(file));
        writer
            .write(batch)
            .with_context(|| format!("writing CSV {}", path.display()))?;
        writer.into_inner().flush()?;
    }

    // 2) move into place
    fs::rename(&tmp, path).with_context(|| format!("renaming {}", tmp.display()))?;
    info!(rows = batch.num_rows(), "wrote {}", path.display());
    Ok(())
}

/// Write `batch` as a Snappy-compressed Parquet snapshot.
#[instrument(level = "debug", skip(batch), fields(path = %path.display()))]
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let tmp = tmp_path(path);

    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    fs::rename(&tmp, path).with_context(|| format!("renaming {}", tmp.display()))?;
    info!(rows = batch.num_rows(), "wrote {}", path.display());
    Ok(())
}

/// Read a Parquet file back into one table.
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {}", path.display()))?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.with_context(|| format!("decoding {}", path.display()))?);
    }
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    crate::table::concat(&batches)
}

/// Pretty-printed JSON document (used for chart specifications).
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let tmp = tmp_path(path);
    {
        let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, value)
            .with_context(|| format!("serialising {}", path.display()))?;
        out.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("renaming {}", tmp.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Files in `dir` with extension `ext`, sorted by name.
pub fn list_outputs(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.{}", dir.display(), ext);
    let mut files: Vec<PathBuf> = glob(&pattern)
        .context("invalid glob pattern for output listing")?
        .filter_map(Result::ok)
        .collect();
    files.sort();
    Ok(files)
}
