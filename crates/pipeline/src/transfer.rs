//! Chunked, resumable byte transfer to a tus upload endpoint.
//!
//! A failed chunk is retried with exponential backoff after asking the
//! server how much it actually committed, so a partially written chunk is
//! never sent twice. Cancellation is honoured between chunks, while a
//! chunk is in flight, and during backoff.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vidhub_cloud::{ChunkTransport, CloudError};

/// Default chunk size (5 MiB, a multiple of 256 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Chunk sizes must be multiples of this for the ingest service.
pub const CHUNK_ALIGNMENT: usize = 256 * 1024;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Consecutive failed attempts tolerated for one chunk.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub chunk_size: usize,
    pub retry: RetryPolicy,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

/// Summary of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub bytes: u64,
    pub chunks_sent: u32,
    pub retries: u32,
}

/// Double the delay, clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    current.saturating_mul(2).min(policy.max_delay)
}

/// Upload `bytes` to `endpoint` in chunks.
///
/// Returns [`CloudError::Cancelled`] as soon as `cancel` fires, or the last
/// chunk error once `max_attempts` consecutive attempts have failed.
pub async fn upload_resumable(
    transport: &dyn ChunkTransport,
    endpoint: &str,
    bytes: &[u8],
    options: &TransferOptions,
    cancel: &CancellationToken,
) -> Result<TransferReport, CloudError> {
    let total = bytes.len() as u64;
    let chunk_size = options.chunk_size.max(1) as u64;
    let policy = &options.retry;

    let mut offset = 0u64;
    let mut failures = 0u32;
    let mut delay = policy.base_delay;
    let mut report = TransferReport {
        bytes: total,
        chunks_sent: 0,
        retries: 0,
    };

    while offset < total {
        if cancel.is_cancelled() {
            return Err(CloudError::Cancelled);
        }

        let end = (offset + chunk_size).min(total);
        let chunk = &bytes[offset as usize..end as usize];

        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(CloudError::Cancelled),
            result = transport.send_chunk(endpoint, offset, chunk) => result,
        };

        let error = match result {
            Ok(committed) if committed > offset && committed <= total => {
                offset = committed;
                report.chunks_sent += 1;
                failures = 0;
                delay = policy.base_delay;
                continue;
            }
            Ok(committed) => CloudError::Transcoder {
                status: 500,
                message: format!("Upload offset did not advance (at {offset}, got {committed})"),
            },
            Err(e) => e,
        };

        failures += 1;
        if failures >= policy.max_attempts {
            tracing::error!(
                endpoint,
                offset,
                attempts = failures,
                error = %error,
                "Chunk upload failed, giving up",
            );
            return Err(error);
        }

        tracing::warn!(
            endpoint,
            offset,
            attempt = failures,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Chunk upload failed, retrying",
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(CloudError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        delay = next_delay(delay, policy);
        report.retries += 1;

        // Resume from what the server actually holds.
        match transport.current_offset(endpoint).await {
            Ok(server_offset) if server_offset <= total => offset = server_offset,
            Ok(server_offset) => {
                tracing::warn!(endpoint, server_offset, "Server offset beyond upload length");
            }
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Could not read upload offset");
            }
        }
    }

    tracing::debug!(
        endpoint,
        bytes = total,
        chunks = report.chunks_sent,
        retries = report.retries,
        "Transfer complete",
    );
    Ok(report)
}
