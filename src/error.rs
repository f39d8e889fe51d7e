//! Error types for range-fetch
//!
//! Errors are split by layer:
//! - [`TransportError`] - socket connect/write/read failures for one request
//! - [`ChunkError`] - a single range fetch that failed in the parallel path
//! - [`Error`] - everything a download can fail with

use std::net::SocketAddr;
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for range-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for range-fetch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_workers")
        key: Option<String>,
    },

    /// Socket-level failure outside of planning (single download path)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The HEAD request used for planning failed
    #[error("failed to plan download of {resource}: {source}")]
    Plan {
        /// Resource the HEAD request was issued for
        resource: String,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// Destination directory/file create, seek, write or sync failed
    #[error("file error at {}: {source}", .path.display())]
    File {
        /// Destination path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Resource name cannot be mapped to a path under the download directory
    #[error("invalid resource name: {0}")]
    InvalidResource(String),

    /// Not every planned byte range reached the destination file
    #[error(
        "incomplete download at {}: {} byte range(s) missing, {failed_chunks} chunk(s) failed",
        .path.display(),
        .missing.len()
    )]
    Incomplete {
        /// Destination path
        path: PathBuf,
        /// Byte ranges that were never written
        missing: Vec<Range<u64>>,
        /// Number of chunk fetches that failed
        failed_chunks: usize,
    },

    /// Write attempted after the writer was closed
    #[error("writer for {} is already closed", .0.display())]
    WriterClosed(PathBuf),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Socket-level failures for a single request/response exchange
#[derive(Debug, Error)]
pub enum TransportError {
    /// Opening the TCP connection failed
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Remote address as configured (`host:port`)
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing the request to the socket failed
    #[error("failed to write request to {addr}: {source}")]
    Write {
        /// Peer address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading the response failed for a reason other than idle timeout
    #[error("failed to read response from {addr}: {source}")]
    Read {
        /// Peer address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one range fetch in the parallel path
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The request for this chunk could not be completed
    #[error("chunk {index}: {source}")]
    Transport {
        /// Chunk index
        index: usize,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// The server returned more bytes than the requested range
    #[error("chunk {index}: expected at most {expected} bytes, got {actual}")]
    Oversized {
        /// Chunk index
        index: usize,
        /// Length of the requested range
        expected: u64,
        /// Length of the returned body
        actual: u64,
    },

    /// The fetch task panicked or was aborted
    #[error("chunk task failed: {0}")]
    Join(String),
}

impl Error {
    /// Build a [`Error::Config`] for a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
