//! Configuration types for range-fetch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Size a single worker is expected to fetch (16 MiB)
pub const CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// Upper bound on concurrent range fetches
pub const MAX_WORKERS: usize = 8;

/// Target server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server address (IP or hostname)
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, as used for connecting and for the `Host` header
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Download planning and output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base directory downloads are written under (default: "data")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Bytes of content that justify one worker (default: 16 MiB)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Maximum number of concurrent range fetches (default: 8)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Fail the download when any planned byte range was not written (default: true)
    ///
    /// When disabled, failed chunks are logged and the download still reports
    /// success, leaving the missing ranges as holes in the destination file.
    #[serde(default = "default_true")]
    pub require_complete: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            chunk_size: default_chunk_size(),
            max_workers: default_max_workers(),
            require_complete: true,
        }
    }
}

/// How the transport decides a response has been fully received
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCompletion {
    /// Read until the peer closes or no bytes arrive within `receive_timeout` (default)
    ///
    /// A keep-alive server never closes, so the idle timeout is the normal end
    /// of every response. A server that stalls longer than the timeout mid-body
    /// produces a truncated response.
    #[default]
    IdleTimeout,
    /// Stop once the headers and `Content-Length` body bytes have arrived
    ///
    /// HEAD responses stop at the end of the headers. Responses without a
    /// usable `Content-Length` fall back to [`ResponseCompletion::IdleTimeout`].
    ContentLength,
}

/// Socket behaviour for each request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Idle time after which a read loop treats the response as complete (default: 10s)
    #[serde(default = "default_receive_timeout", with = "duration_ms_serde")]
    pub receive_timeout: Duration,

    /// Size of the buffer each socket read fills (default: 4096)
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Response completion policy
    #[serde(default)]
    pub completion: ResponseCompletion,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            receive_timeout: default_receive_timeout(),
            read_buffer_size: default_read_buffer_size(),
            completion: ResponseCompletion::default(),
        }
    }
}

/// Main configuration for [`HttpDownloader`](crate::HttpDownloader)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server to download from
    #[serde(default)]
    pub server: ServerConfig,

    /// Planning and output settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Socket settings
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Config {
    /// Configuration for `host:port` with every other setting at its default
    pub fn for_server(host: impl Into<String>, port: u16) -> Self {
        Self {
            server: ServerConfig {
                host: host.into(),
                port,
            },
            ..Default::default()
        }
    }

    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::File {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloader cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::config("server.host", "host must not be empty"));
        }
        if self.download.chunk_size == 0 {
            return Err(Error::config(
                "download.chunk_size",
                "chunk size must be greater than zero",
            ));
        }
        if self.download.max_workers == 0 {
            return Err(Error::config(
                "download.max_workers",
                "at least one worker is required",
            ));
        }
        if self.transport.read_buffer_size == 0 {
            return Err(Error::config(
                "transport.read_buffer_size",
                "read buffer size must be greater than zero",
            ));
        }
        if self.transport.receive_timeout.is_zero() {
            return Err(Error::config(
                "transport.receive_timeout",
                "receive timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    80
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_chunk_size() -> u64 {
    CHUNK_SIZE
}

fn default_max_workers() -> usize {
    MAX_WORKERS
}

fn default_true() -> bool {
    true
}

fn default_receive_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_read_buffer_size() -> usize {
    4096
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
