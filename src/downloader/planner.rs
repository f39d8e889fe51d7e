//! Download planning: HEAD discovery, strategy selection and chunk partitioning.

use crate::codec::{Request, Response};
use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, DownloadPlan, Strategy};

use super::HttpDownloader;

impl HttpDownloader {
    /// Issue a `HEAD` for `resource` and plan how to fetch it
    ///
    /// Any transport failure here aborts the download with [`Error::Plan`].
    pub async fn plan(&self, resource: &str) -> Result<DownloadPlan> {
        let request = Request::head(resource, &self.host);
        let raw = self
            .transport
            .round_trip(&request)
            .await
            .map_err(|e| Error::Plan {
                resource: resource.to_string(),
                source: e,
            })?;
        let head = Response::parse(&raw);
        let plan = plan_from_head(&head, &self.config.download);

        tracing::debug!(
            resource,
            content_length = plan.content_length,
            accepts_ranges = plan.accepts_ranges,
            worker_count = plan.worker_count,
            strategy = ?plan.strategy,
            "Download planned"
        );
        Ok(plan)
    }
}

/// Decide single vs parallel from a parsed HEAD response
///
/// Workers are justified one per `chunk_size` bytes (at least one), capped at
/// `max_workers`. Parallel fetching needs both `Accept-Ranges: bytes` and more
/// than one justified worker; an unknown length (0) therefore always falls back
/// to a single `GET`.
pub(crate) fn plan_from_head(head: &Response, config: &DownloadConfig) -> DownloadPlan {
    let content_length = head.content_length();
    let accepts_ranges = head.accepts_ranges();

    let max_chunks = (content_length / config.chunk_size.max(1)).max(1);
    let justified = usize::try_from(max_chunks).unwrap_or(usize::MAX);
    let worker_count = justified.min(config.max_workers.max(1));

    if accepts_ranges && worker_count > 1 {
        DownloadPlan {
            content_length,
            accepts_ranges,
            worker_count,
            strategy: Strategy::Parallel,
            chunks: partition(content_length, worker_count),
        }
    } else {
        DownloadPlan {
            content_length,
            accepts_ranges,
            worker_count: 1,
            strategy: Strategy::Single,
            chunks: vec![Chunk {
                index: 0,
                range: 0..content_length,
            }],
        }
    }
}

/// Split `0..content_length` into at most `workers` contiguous chunks
///
/// Every chunk but the last spans `ceil(content_length / workers)` bytes; the
/// last is clamped to the end of the resource. Chunks that would start past
/// the end are not produced. Lengths up to `u64::MAX` are handled without
/// overflow.
pub(crate) fn partition(content_length: u64, workers: usize) -> Vec<Chunk> {
    let workers = workers.max(1) as u64;
    let per_chunk = content_length.div_ceil(workers);
    if per_chunk == 0 {
        return Vec::new();
    }

    (0..workers)
        .map(|i| i.saturating_mul(per_chunk))
        .take_while(|&start| start < content_length)
        .enumerate()
        .map(|(index, start)| Chunk {
            index,
            range: start..start.saturating_add(per_chunk).min(content_length),
        })
        .collect()
}
