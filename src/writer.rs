//! Offset file writer that places byte ranges at arbitrary offsets in one file.
//!
//! The destination file is created lazily on the first write (parent
//! directories included, any existing file truncated). All writes go through a
//! single mutex covering the create/seek/write sequence, so concurrent callers
//! never interleave a seek with another caller's write. Written ranges are
//! recorded so a download can check that no planned range was left out.

use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

#[derive(Default)]
struct WriterState {
    file: Option<File>,
    written: Vec<Range<u64>>,
    bytes_written: u64,
    closed: bool,
}

/// Serialized, offset-addressed writer for a single destination file.
///
/// One instance serves exactly one download; after [`close`](Self::close) every
/// further write fails with [`Error::WriterClosed`].
pub struct OffsetWriter {
    path: PathBuf,
    state: Mutex<WriterState>,
}

impl OffsetWriter {
    /// Writer for `path`; nothing touches the filesystem until the first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(WriterState::default()),
        }
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` at byte `offset`, creating the file on first use
    pub async fn write_at(&self, data: &[u8], offset: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(Error::WriterClosed(self.path.clone()));
        }

        if state.file.is_none() {
            state.file = Some(self.create().await?);
        }
        let Some(file) = state.file.as_mut() else {
            return Err(Error::WriterClosed(self.path.clone()));
        };

        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| self.file_error(e))?;
        file.write_all(data).await.map_err(|e| self.file_error(e))?;
        // Completes the in-flight write so the next seek is accepted
        file.flush().await.map_err(|e| self.file_error(e))?;

        let len = data.len() as u64;
        if len > 0 {
            insert_range(&mut state.written, offset..offset + len);
        }
        state.bytes_written += len;

        tracing::trace!(path = %self.path.display(), offset, bytes = len, "Range written");
        Ok(())
    }

    /// Flush file data to stable storage and release the handle
    ///
    /// Closing a writer that never wrote anything only marks it closed.
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.closed = true;
        let Some(file) = state.file.take() else {
            tracing::debug!(path = %self.path.display(), "Writer closed without any writes");
            return Ok(());
        };

        file.sync_all().await.map_err(|e| self.file_error(e))?;
        drop(file);

        tracing::info!(
            path = %self.path.display(),
            bytes = state.bytes_written,
            "Write completed"
        );
        Ok(())
    }

    /// Total bytes passed to successful writes
    pub async fn bytes_written(&self) -> u64 {
        self.state.lock().await.bytes_written
    }

    /// Sub-ranges of `0..total` that no write has covered
    pub async fn missing_ranges(&self, total: u64) -> Vec<Range<u64>> {
        let state = self.state.lock().await;
        let mut missing = Vec::new();
        let mut cursor = 0;
        for range in &state.written {
            if range.start >= total {
                break;
            }
            if range.start > cursor {
                missing.push(cursor..range.start);
            }
            cursor = cursor.max(range.end);
        }
        if cursor < total {
            missing.push(cursor..total);
        }
        missing
    }

    async fn create(&self) -> Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::File {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        let file = File::create(&self.path)
            .await
            .map_err(|e| self.file_error(e))?;
        tracing::debug!(path = %self.path.display(), "Destination file created");
        Ok(file)
    }

    fn file_error(&self, source: std::io::Error) -> Error {
        Error::File {
            path: self.path.clone(),
            source,
        }
    }
}

/// Insert `new` into sorted, non-overlapping `ranges`, merging neighbours
fn insert_range(ranges: &mut Vec<Range<u64>>, new: Range<u64>) {
    let mut merged = new;
    let mut out = Vec::with_capacity(ranges.len() + 1);
    let mut placed = false;
    for range in ranges.drain(..) {
        if range.end < merged.start {
            out.push(range);
        } else if merged.end < range.start {
            if !placed {
                out.push(merged.clone());
                placed = true;
            }
            out.push(range);
        } else {
            merged = merged.start.min(range.start)..merged.end.max(range.end);
        }
    }
    if !placed {
        out.push(merged);
    }
    *ranges = out;
}
