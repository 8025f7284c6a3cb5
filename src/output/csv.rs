//! CSV sink with append-or-create semantics
//!
//! A report file that ends up with zero bytes is deleted on close, so a run that finds
//! nothing never leaves an empty artifact behind.

use csv::{Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Flush every N rows
const FLUSH_INTERVAL: u64 = 1_000;

/// A row that can be written to a CSV report
pub trait CsvRecord {
    /// Column names; identical for every record written to one file
    fn header(&self) -> Vec<String>;

    /// Values in header order
    fn values(&self) -> Vec<String>;
}

/// CSV file writer that removes its file when nothing was written
pub struct CsvSink {
    writer: Writer<BufWriter<File>>,
    path: PathBuf,
    rows_written: u64,
    header_pending: bool,
}

impl CsvSink {
    /// Create (or truncate) `path`; the header is written with the first record
    pub fn create<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::open(path.as_ref(), false)
    }

    /// Append to `path`, creating it if needed; the header is written only if the file is empty
    pub fn append<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::open(path.as_ref(), true)
    }

    fn open(path: &Path, append: bool) -> OutputResult<Self> {
        info!("Opening CSV writer: path={} append={}", path.display(), append);

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|e| OutputError::IoError(format!("Failed to open file: {e}")))?;

        let existing_len = file
            .metadata()
            .map_err(|e| OutputError::IoError(format!("Failed to read metadata: {e}")))?
            .len();

        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(buf_writer);

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows_written: 0,
            header_pending: existing_len == 0,
        })
    }

    /// Never write a header (single-column id lists)
    pub fn without_header(mut self) -> Self {
        self.header_pending = false;
        self
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written by this sink
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Write one record
    pub fn write<R: CsvRecord + ?Sized>(&mut self, record: &R) -> OutputResult<()> {
        if self.header_pending {
            self.writer
                .write_record(record.header())
                .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;
            self.header_pending = false;
        }

        self.writer
            .write_record(record.values())
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {e}")))?;
        self.rows_written += 1;

        if self.rows_written % FLUSH_INTERVAL == 0 {
            self.flush()?;
            debug!("Progress: {} rows written", self.rows_written);
        }
        Ok(())
    }

    /// Write every record in order
    pub fn write_all<'a, R, I>(&mut self, records: I) -> OutputResult<()>
    where
        R: CsvRecord + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Close the file, removing it when it is empty
    ///
    /// Returns the path when the file was kept.
    pub fn finish(self) -> OutputResult<Option<PathBuf>> {
        let path = self.path.clone();
        let rows = self.rows_written;
        self.close()?;

        let len = std::fs::metadata(&path)
            .map_err(|e| OutputError::IoError(format!("Failed to read metadata: {e}")))?
            .len();
        if len == 0 {
            std::fs::remove_file(&path)
                .map_err(|e| OutputError::IoError(format!("Failed to remove empty file: {e}")))?;
            info!("Removed empty report: path={}", path.display());
            return Ok(None);
        }

        info!("Report written: path={} rows={}", path.display(), rows);
        Ok(Some(path))
    }
}

impl OutputWriter for CsvSink {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    fn close(mut self) -> OutputResult<()> {
        debug!("Closing CSV writer: {} rows written", self.rows_written);
        self.flush()?;

        let buf_writer = self.writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get inner writer: {e}"))
        })?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to flush buffer: {e}")))?;
        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;
        Ok(())
    }
}

/// Write `records` to a fresh file at `path`
///
/// Returns `None` (and leaves no file) when `records` is empty.
pub fn write_records<R: CsvRecord>(path: &Path, records: &[R]) -> OutputResult<Option<PathBuf>> {
    let mut sink = CsvSink::create(path)?;
    sink.write_all(records)?;
    sink.finish()
}

impl CsvRecord for String {
    fn header(&self) -> Vec<String> {
        vec!["id".to_string()]
    }

    fn values(&self) -> Vec<String> {
        vec![self.clone()]
    }
}
