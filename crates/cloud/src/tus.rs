//! Chunk transport for tus resumable uploads.
//!
//! The transfer loop in the pipeline only needs two primitives: ask the
//! server how many bytes it already holds, and append a chunk at an
//! offset. Keeping them behind [`ChunkTransport`] lets the loop be tested
//! against an in-memory server.

use async_trait::async_trait;

use crate::error::CloudError;
use crate::transcoding::TUS_VERSION;

/// Byte-level operations on a tus upload URL.
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    /// Number of bytes the server has committed for this upload.
    async fn current_offset(&self, endpoint: &str) -> Result<u64, CloudError>;

    /// Append `chunk` at `offset`; returns the new committed offset.
    async fn send_chunk(&self, endpoint: &str, offset: u64, chunk: &[u8])
        -> Result<u64, CloudError>;
}

/// [`ChunkTransport`] speaking tus 1.0 over HTTP (`HEAD` / `PATCH`).
#[derive(Clone, Default)]
pub struct TusTransport {
    client: reqwest::Client,
}

impl TusTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn parse_offset(response: &reqwest::Response) -> Result<u64, CloudError> {
    response
        .headers()
        .get("upload-offset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| CloudError::Transcoder {
            status: response.status().as_u16(),
            message: "Missing or invalid Upload-Offset header".into(),
        })
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CloudError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(CloudError::Transcoder {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ChunkTransport for TusTransport {
    async fn current_offset(&self, endpoint: &str) -> Result<u64, CloudError> {
        let response = self
            .client
            .head(endpoint)
            .header("Tus-Resumable", TUS_VERSION)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        parse_offset(&response)
    }

    async fn send_chunk(
        &self,
        endpoint: &str,
        offset: u64,
        chunk: &[u8],
    ) -> Result<u64, CloudError> {
        let response = self
            .client
            .patch(endpoint)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Offset", offset.to_string())
            .header("Content-Type", "application/offset+octet-stream")
            .body(chunk.to_vec())
            .send()
            .await?;
        let response = ensure_success(response).await?;
        parse_offset(&response)
    }
}
