//! Core types shared by the planner, orchestrator and writer

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;

/// HTTP request method; no request ever carries a body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Metadata request used for planning
    Head,
    /// Content request, optionally with a `Range` header
    Get,
}

impl Method {
    /// Method token as it appears on the request line
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
        }
    }

    /// Whether a response to this method carries a body
    pub fn expects_body(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a resource is fetched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One plain `GET`, written at offset 0
    Single,
    /// `worker_count` concurrent `Range` requests
    Parallel,
}

/// One contiguous byte sub-range of the resource
///
/// `range` is half-open; the `Range` header uses the inclusive form
/// `bytes=<start>-<end - 1>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the plan, `0..worker_count`
    pub index: usize,
    /// Byte range covered by this chunk
    pub range: Range<u64>,
}

impl Chunk {
    /// First byte of the chunk; also its write offset
    pub fn offset(&self) -> u64 {
        self.range.start
    }

    /// Number of bytes in the chunk
    pub fn len(&self) -> u64 {
        self.range.end.saturating_sub(self.range.start)
    }

    /// Whether the chunk covers no bytes
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Value of the `Range` request header, `None` for an empty chunk
    pub fn range_header(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!(
            "bytes={}-{}",
            self.range.start,
            self.range.end - 1
        ))
    }
}

/// Result of planning a download from the HEAD response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPlan {
    /// Total resource size from `Content-Length` (0 when unknown)
    pub content_length: u64,
    /// Whether the server sent `Accept-Ranges: bytes`
    pub accepts_ranges: bool,
    /// Number of workers justified by size, capped at `max_workers`
    pub worker_count: usize,
    /// Selected strategy
    pub strategy: Strategy,
    /// Ordered chunks; a single chunk for [`Strategy::Single`]
    pub chunks: Vec<Chunk>,
}

/// Summary of a finished download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReport {
    /// Destination file
    pub path: PathBuf,
    /// Strategy used
    pub strategy: Strategy,
    /// Content length reported by the server (0 when unknown)
    pub content_length: u64,
    /// Number of workers launched
    pub worker_count: usize,
    /// Bytes written to the destination file
    pub bytes_written: u64,
    /// Chunks whose fetch failed and contributed nothing
    pub failed_chunks: usize,
}
