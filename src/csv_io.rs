use crate::schema::SchemaError;
use crate::util::{create_with_backoff, ensure_parent, open_with_backoff, replace_file_atomic_backoff, tmp_path_for};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Check that every `required` column exists in `headers`.
/// The first missing column is reported by name (fail fast, no partial output).
pub fn require_columns(headers: &csv::StringRecord, required: &[&str], path: &Path) -> Result<(), SchemaError> {
    for col in required {
        if !headers.iter().any(|h| h.trim() == *col) {
            return Err(SchemaError::MissingColumn { column: (*col).to_string(), path: path.display().to_string() });
        }
    }
    Ok(())
}

/// Header row of a CSV file.
pub fn read_headers(path: &Path) -> Result<csv::StringRecord> {
    let f = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(BufReader::new(f));
    Ok(rdr.headers().with_context(|| format!("read header of {}", path.display()))?.clone())
}

/// Read every row of a headed CSV file into `T`, after validating `required` columns.
/// Extra columns are ignored.
pub fn read_rows<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let f = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(BufReader::with_capacity(256 * 1024, f));
    let headers = rdr.headers().with_context(|| format!("read header of {}", path.display()))?.clone();
    require_columns(&headers, required, path)?;

    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<T>().enumerate() {
        let row = row.with_context(|| format!("{}: row {}", path.display(), i + 2))?;
        out.push(row);
    }
    Ok(out)
}

/// Buffered CSV writer that writes to a temp sibling and promotes atomically
/// on `finish()`, so readers never observe half-written stage outputs.
pub struct CsvSink {
    tmp: PathBuf,
    dest: PathBuf,
    w: csv::Writer<BufWriter<File>>,
}

impl CsvSink {
    pub fn create(dest: &Path) -> Result<Self> {
        ensure_parent(dest)?;
        let tmp = tmp_path_for(dest);
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        let w = csv::Writer::from_writer(BufWriter::with_capacity(256 * 1024, f));
        Ok(Self { tmp, dest: dest.to_path_buf(), w })
    }

    #[inline]
    pub fn write<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.w.serialize(row).with_context(|| format!("write row to {}", self.dest.display()))
    }

    /// Write a raw header/record (for tables whose columns are only known at runtime).
    pub fn write_record<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.w.write_record(fields).with_context(|| format!("write record to {}", self.dest.display()))
    }

    pub fn finish(self) -> Result<PathBuf> {
        let mut inner = self.w.into_inner().map_err(|e| anyhow::anyhow!("flush {}: {}", self.tmp.display(), e.error()))?;
        inner.flush().with_context(|| format!("flush {}", self.tmp.display()))?;
        drop(inner);
        replace_file_atomic_backoff(&self.tmp, &self.dest)?;
        Ok(self.dest)
    }
}

/// Write all rows to `dest` in one go.
pub fn write_rows<T: Serialize>(dest: &Path, rows: &[T]) -> Result<PathBuf> {
    let mut sink = CsvSink::create(dest)?;
    for r in rows {
        sink.write(r)?;
    }
    sink.finish()
}
