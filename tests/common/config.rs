//! Test configuration helpers

use std::time::Duration;
use tempfile::TempDir;
use range_fetch::{Config, HttpDownloader};

/// Config pointing at a local test server, writing into a fresh temp dir
///
/// The receive timeout is short so keep-alive responses end quickly.
pub fn local_config(port: u16) -> (Config, TempDir) {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut config = Config::for_server("127.0.0.1", port);
    config.download.download_dir = temp_dir.path().join("data");
    config.transport.receive_timeout = Duration::from_millis(300);
    (config, temp_dir)
}

/// Downloader for `config`
pub fn downloader(config: Config) -> HttpDownloader {
    HttpDownloader::new(config).expect("config should be valid")
}
