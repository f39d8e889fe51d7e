//! # range-fetch
//!
//! Downloads a single resource from one HTTP/1.1 server over raw TCP, using a
//! hand-rolled request/response codec instead of an HTTP library.
//!
//! ## How a download runs
//!
//! 1. A `HEAD` request discovers `Content-Length` and `Accept-Ranges`.
//! 2. If the server accepts byte ranges and the resource is large enough, the
//!    resource is split into up to `max_workers` chunks fetched concurrently
//!    with `Range` requests; otherwise one plain `GET` fetches it.
//! 3. Every body is written at its byte offset in the destination file under
//!    the download directory, and the file is synced once at the end.
//!
//! Each request uses its own connection. A response ends when the server
//! closes the connection or stays silent for the configured receive timeout.
//!
//! ## Quick Start
//!
//! ```no_run
//! use range_fetch::{Config, HttpDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::for_server("127.0.0.1", 8080);
//!     let downloader = HttpDownloader::new(config)?;
//!
//!     let report = downloader.download("videos/big.mp4").await?;
//!     println!("wrote {} bytes to {}", report.bytes_written, report.path.display());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP/1.1 request building and response parsing
pub mod codec;
/// Configuration types
pub mod config;
/// Download planning and orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Raw TCP transport
pub mod transport;
/// Core types
pub mod types;
/// Offset-addressed destination file writer
pub mod writer;

// Re-export commonly used types
pub use codec::{Request, Response};
pub use config::{Config, DownloadConfig, ResponseCompletion, ServerConfig, TransportConfig};
pub use downloader::HttpDownloader;
pub use error::{ChunkError, Error, Result, TransportError};
pub use transport::{Connection, TcpTransport, Transport};
pub use types::{Chunk, DownloadPlan, DownloadReport, Method, Strategy};
pub use writer::OffsetWriter;
