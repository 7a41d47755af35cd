use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{JksError, Result};
use crate::providers::jenkins::ResultRecord;

use super::CollectionProgress;

/// Destination for collected records.
pub trait RecordSink {
    fn append(&mut self, record: &ResultRecord) -> Result<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn append(&mut self, record: &ResultRecord) -> Result<()> {
        (**self).append(record)
    }
}

impl RecordSink for Vec<ResultRecord> {
    fn append(&mut self, record: &ResultRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
///
/// The file is opened once in append mode and created with `0600`
/// permissions on unix. Buffered output is flushed by [`JsonLinesSink::finish`]
/// and again on drop, so an early return or a panic unwinding through the
/// caller still leaves every appended line on disk.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl JsonLinesSink {
    pub fn open(path: &Path) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options.open(path).map_err(|source| JksError::Sink {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Appending records to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes buffered lines and syncs the file to disk.
    pub fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .and_then(|()| self.writer.get_ref().sync_all())
            .map_err(|source| JksError::Sink {
                path: self.path.clone(),
                source,
            })
    }
}

impl RecordSink for JsonLinesSink {
    fn append(&mut self, record: &ResultRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(|source| JksError::Sink {
                path: self.path.clone(),
                source,
            })?;
        self.written += 1;
        Ok(())
    }
}

impl Drop for JsonLinesSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Ticks a progress display after every successful append.
pub struct ProgressSink<'a, S> {
    inner: S,
    progress: &'a CollectionProgress,
}

impl<'a, S: RecordSink> ProgressSink<'a, S> {
    pub fn new(inner: S, progress: &'a CollectionProgress) -> Self {
        Self { inner, progress }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RecordSink> RecordSink for ProgressSink<'_, S> {
    fn append(&mut self, record: &ResultRecord) -> Result<()> {
        self.inner.append(record)?;
        self.progress.record_written();
        Ok(())
    }
}
