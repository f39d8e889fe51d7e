//! Chunk fetch orchestration for the single fetch and the parallel range fan-out.

use std::sync::Arc;

use tracing::Instrument;

use crate::codec::{Request, Response};
use crate::error::{ChunkError, Result};
use crate::transport::Transport;
use crate::types::{Chunk, DownloadPlan};
use crate::writer::OffsetWriter;

/// One finished chunk task, successful or not
struct ChunkOutcome {
    chunk: Chunk,
    result: std::result::Result<Vec<u8>, ChunkError>,
}

/// Parameters shared by every fetch of one download
#[derive(Clone)]
pub(super) struct FetchContext {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) resource: Arc<str>,
    pub(super) host: Arc<str>,
}

/// Fetch the whole resource with one plain `GET` and write it at offset 0.
///
/// Transport failures are fatal here.
pub(super) async fn single_download(ctx: &FetchContext, writer: &OffsetWriter) -> Result<()> {
    let request = Request::get(&ctx.resource, &ctx.host, None);
    let raw = ctx.transport.round_trip(&request).await?;
    let body = Response::parse(&raw).into_body();

    tracing::debug!(bytes = body.len(), "Single fetch complete");
    writer.write_at(&body, 0).await
}

/// Fetch every planned chunk concurrently and write results as they arrive.
///
/// One task per chunk runs on the runtime's worker threads; each reports on a
/// bounded channel sized to the worker count. Failed chunks are logged and
/// counted but do not stop the others. Returns once every task has finished,
/// with the number of failed chunks. A write failure aborts immediately.
pub(super) async fn parallel_download(
    ctx: &FetchContext,
    plan: &DownloadPlan,
    writer: &OffsetWriter,
) -> Result<usize> {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<ChunkOutcome>(plan.worker_count.max(1));

    let mut handles = Vec::with_capacity(plan.chunks.len());
    for chunk in plan.chunks.iter().cloned() {
        let tx = tx.clone();
        let ctx = ctx.clone();
        let span = tracing::info_span!("chunk", index = chunk.index);
        handles.push(tokio::spawn(
            async move {
                let result = fetch_chunk(&ctx, &chunk).await;
                if tx.send(ChunkOutcome { chunk, result }).await.is_err() {
                    tracing::warn!("Result channel closed before chunk was delivered");
                }
            }
            .instrument(span),
        ));
    }
    // Only task-held senders remain, so the channel closes when the last task ends
    drop(tx);

    let mut failed = 0;
    while let Some(ChunkOutcome { chunk, result }) = rx.recv().await {
        match result {
            Ok(body) => {
                tracing::debug!(
                    chunk = chunk.index,
                    offset = chunk.offset(),
                    bytes = body.len(),
                    "Chunk received"
                );
                writer.write_at(&body, chunk.offset()).await?;
            }
            Err(e) => {
                tracing::error!(chunk = chunk.index, error = %e, "Error downloading chunk");
                failed += 1;
            }
        }
    }

    // Tasks that panicked never reported; count them here
    for joined in futures::future::join_all(handles).await {
        if let Err(e) = joined {
            let e = ChunkError::Join(e.to_string());
            tracing::error!(error = %e, "Chunk task did not complete");
            failed += 1;
        }
    }

    Ok(failed)
}

/// Fetch one chunk with a `Range` request and return its body
pub(super) async fn fetch_chunk(
    ctx: &FetchContext,
    chunk: &Chunk,
) -> std::result::Result<Vec<u8>, ChunkError> {
    let request = Request::get(&ctx.resource, &ctx.host, chunk.range_header());
    let raw = ctx
        .transport
        .round_trip(&request)
        .await
        .map_err(|e| ChunkError::Transport {
            index: chunk.index,
            source: e,
        })?;
    let body = Response::parse(&raw).into_body();

    let actual = body.len() as u64;
    if actual > chunk.len() {
        return Err(ChunkError::Oversized {
            index: chunk.index,
            expected: chunk.len(),
            actual,
        });
    }
    if actual < chunk.len() {
        tracing::warn!(
            chunk = chunk.index,
            expected = chunk.len(),
            actual,
            "Chunk body shorter than requested range"
        );
    }
    Ok(body)
}
