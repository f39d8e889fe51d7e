//! Core downloader implementation split into focused submodules.
//!
//! - [`planner`] - HEAD discovery and chunk partitioning
//! - [`orchestration`] - Single fetch and parallel range fan-out/fan-in

mod orchestration;
mod planner;


use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::{TcpTransport, Transport};
use crate::types::{DownloadReport, Strategy};
use crate::writer::OffsetWriter;

use orchestration::{FetchContext, parallel_download, single_download};

/// Downloads resources from one HTTP/1.1 server, in parallel when it supports ranges.
///
/// All settings come from the [`Config`] given at construction. Log output of
/// every download is nested under this downloader's `downloader` span.
pub struct HttpDownloader {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    host: Arc<str>,
    span: tracing::Span,
}

impl HttpDownloader {
    /// Create a downloader that talks to `config.server` over plain TCP
    pub fn new(config: Config) -> Result<Self> {
        let transport = TcpTransport::new(config.server.clone(), config.transport.clone());
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a downloader with a custom [`Transport`]
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let host: Arc<str> = config.server.authority().into();
        let span = tracing::info_span!("downloader", addr = %host);
        Ok(Self {
            config: Arc::new(config),
            transport,
            host,
            span,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path `resource` is written to under the download directory
    ///
    /// Directory components of `resource` are kept; absolute paths and `..`
    /// components are rejected.
    pub fn destination(&self, resource: &str) -> Result<PathBuf> {
        destination_path(&self.config.download.download_dir, resource)
    }

    /// Download `resource` into the download directory
    ///
    /// An existing file at the destination is truncated and fully overwritten.
    pub async fn download(&self, resource: &str) -> Result<DownloadReport> {
        let writer = OffsetWriter::new(self.destination(resource)?);
        self.download_with_writer(resource, &writer).await
    }

    /// Download `resource` through a caller-supplied writer
    ///
    /// The writer is closed before this returns, whether or not the download
    /// succeeds; it cannot be reused for another download.
    pub async fn download_with_writer(
        &self,
        resource: &str,
        writer: &OffsetWriter,
    ) -> Result<DownloadReport> {
        let span = tracing::info_span!(parent: &self.span, "download", resource);
        self.run_download(resource, writer).instrument(span).await
    }

    async fn run_download(&self, resource: &str, writer: &OffsetWriter) -> Result<DownloadReport> {
        let plan = match self.plan(resource).await {
            Ok(plan) => plan,
            Err(e) => {
                if let Err(close_err) = writer.close().await {
                    tracing::warn!(error = %close_err, "Failed to close writer after planning error");
                }
                return Err(e);
            }
        };
        let ctx = FetchContext {
            transport: Arc::clone(&self.transport),
            resource: resource.into(),
            host: Arc::clone(&self.host),
        };

        let fetched = match plan.strategy {
            Strategy::Parallel => {
                tracing::info!(workers = plan.worker_count, "Parallel download");
                parallel_download(&ctx, &plan, writer).await
            }
            Strategy::Single => {
                tracing::info!("Single download");
                single_download(&ctx, writer).await.map(|()| 0)
            }
        };
        // Every task has finished (or the download failed); release the file either way
        let closed = writer.close().await;
        let failed_chunks = fetched?;
        closed?;

        let missing = if plan.content_length > 0 {
            writer.missing_ranges(plan.content_length).await
        } else {
            Vec::new()
        };
        if !missing.is_empty() {
            if self.config.download.require_complete {
                tracing::error!(
                    missing_ranges = missing.len(),
                    failed_chunks,
                    "Download incomplete"
                );
                return Err(Error::Incomplete {
                    path: writer.path().to_path_buf(),
                    missing,
                    failed_chunks,
                });
            }
            tracing::warn!(
                missing_ranges = missing.len(),
                failed_chunks,
                "Download finished with missing byte ranges"
            );
        }

        let report = DownloadReport {
            path: writer.path().to_path_buf(),
            strategy: plan.strategy,
            content_length: plan.content_length,
            worker_count: plan.worker_count,
            bytes_written: writer.bytes_written().await,
            failed_chunks,
        };
        tracing::info!(
            path = %report.path.display(),
            bytes = report.bytes_written,
            "Download finished"
        );
        Ok(report)
    }
}

fn destination_path(base: &Path, resource: &str) -> Result<PathBuf> {
    let relative = Path::new(resource.trim_start_matches('/'));
    let mut clean = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidResource(resource.to_string()));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(Error::InvalidResource(resource.to_string()));
    }
    Ok(base.join(clean))
}
