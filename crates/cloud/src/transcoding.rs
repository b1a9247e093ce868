//! Managed video-ingest gateway (Cloudflare Stream API).
//!
//! Uploads use tus direct-creator uploads: the service hands back a
//! one-time upload URL in the `Location` header and the asset id in the
//! `stream-media-id` header. Bytes are then sent with [`crate::tus`].

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use vidhub_core::video::VideoStatus;

use crate::config::StreamConfig;
use crate::error::CloudError;

/// tus protocol version sent on every tus request.
pub const TUS_VERSION: &str = "1.0.0";

/// A one-time upload endpoint bound to a new remote asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadTarget {
    pub endpoint: String,
    pub asset_id: String,
}

/// Processing state reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetState {
    PendingUpload,
    Downloading,
    Queued,
    InProgress,
    Ready,
    Error,
    #[serde(other)]
    Unknown,
}

/// Snapshot of a remote asset's processing status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetStatus {
    pub state: AssetState,
    pub duration_secs: Option<f64>,
    pub ready_to_stream: bool,
}

impl AssetStatus {
    pub fn is_ready(&self) -> bool {
        self.ready_to_stream || self.state == AssetState::Ready
    }

    /// Collapse the remote state into the status stored on the video row.
    pub fn video_status(&self) -> VideoStatus {
        match self.state {
            _ if self.is_ready() => VideoStatus::Ready,
            AssetState::Error => VideoStatus::Error,
            _ => VideoStatus::Processing,
        }
    }
}

/// Operations against the managed video service.
#[async_trait]
pub trait TranscodingGateway: Send + Sync {
    /// Reserve an upload endpoint for a file of exactly `upload_length`
    /// bytes.
    async fn create_upload_target(&self, upload_length: u64) -> Result<UploadTarget, CloudError>;

    async fn get_status(&self, asset_id: &str) -> Result<AssetStatus, CloudError>;

    /// Pick the poster frame as a fraction (`0.0..=1.0`) of the duration.
    async fn set_poster_by_timestamp_fraction(
        &self,
        asset_id: &str,
        fraction: f64,
    ) -> Result<(), CloudError>;

    /// Replace the poster with an uploaded still image.
    async fn set_poster_by_image(
        &self,
        asset_id: &str,
        image: Bytes,
        content_type: &str,
    ) -> Result<(), CloudError>;

    async fn delete_asset(&self, asset_id: &str) -> Result<(), CloudError>;
}

/// Response envelope of the Cloudflare v4 API.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetails {
    #[serde(default)]
    ready_to_stream: bool,
    status: Option<StateField>,
    /// `-1` until the duration is known.
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StateField {
    state: AssetState,
}

/// [`TranscodingGateway`] over the Cloudflare Stream REST API.
pub struct StreamClient {
    client: reqwest::Client,
    config: StreamConfig,
}

impl StreamClient {
    pub fn new(config: StreamConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] (shares its connection pool).
    pub fn with_client(client: reqwest::Client, config: StreamConfig) -> Self {
        Self { client, config }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/accounts/{}/stream",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_id
        )
    }

    fn asset_url(&self, asset_id: &str) -> String {
        format!("{}/{asset_id}", self.stream_url())
    }

    /// Return the response unchanged on success, or a
    /// [`CloudError::Transcoder`] carrying the status and the API's error
    /// messages.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CloudError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .filter(|env| !env.errors.is_empty())
            .map(|env| {
                env.errors
                    .iter()
                    .map(|e| format!("{} ({})", e.message, e.code))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or(body);
        Err(CloudError::Transcoder {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_result<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CloudError> {
        let status = response.status().as_u16();
        let envelope: Envelope<T> = Self::ensure_success(response).await?.json().await?;
        match envelope.result {
            Some(result) if envelope.success => Ok(result),
            _ => Err(CloudError::Transcoder {
                status,
                message: "Response did not contain a result".into(),
            }),
        }
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl TranscodingGateway for StreamClient {
    async fn create_upload_target(&self, upload_length: u64) -> Result<UploadTarget, CloudError> {
        let response = self
            .client
            .post(format!("{}?direct_user=true", self.stream_url()))
            .bearer_auth(&self.config.api_token)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Length", upload_length.to_string())
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let status = response.status().as_u16();

        let endpoint = header_value(&response, "location");
        let asset_id = header_value(&response, "stream-media-id");
        match (endpoint, asset_id) {
            (Some(endpoint), Some(asset_id)) => {
                tracing::info!(asset_id = %asset_id, upload_length, "Created upload target");
                Ok(UploadTarget { endpoint, asset_id })
            }
            _ => Err(CloudError::Transcoder {
                status,
                message: "Upload target response is missing Location or stream-media-id".into(),
            }),
        }
    }

    async fn get_status(&self, asset_id: &str) -> Result<AssetStatus, CloudError> {
        let response = self
            .client
            .get(self.asset_url(asset_id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        let details: VideoDetails = Self::parse_result(response).await?;

        Ok(AssetStatus {
            state: details
                .status
                .map(|s| s.state)
                .unwrap_or(AssetState::Unknown),
            duration_secs: details.duration.filter(|d| *d > 0.0),
            ready_to_stream: details.ready_to_stream,
        })
    }

    async fn set_poster_by_timestamp_fraction(
        &self,
        asset_id: &str,
        fraction: f64,
    ) -> Result<(), CloudError> {
        let response = self
            .client
            .post(self.asset_url(asset_id))
            .bearer_auth(&self.config.api_token)
            .json(&serde_json::json!({ "thumbnailTimestampPct": fraction }))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        tracing::debug!(asset_id, fraction, "Set poster frame");
        Ok(())
    }

    async fn set_poster_by_image(
        &self,
        asset_id: &str,
        image: Bytes,
        content_type: &str,
    ) -> Result<(), CloudError> {
        let length = image.len() as u64;
        let part = reqwest::multipart::Part::stream_with_length(image, length)
            .file_name("poster")
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/thumbnail", self.asset_url(asset_id)))
            .bearer_auth(&self.config.api_token)
            .multipart(form)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        tracing::debug!(asset_id, "Set poster image");
        Ok(())
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), CloudError> {
        let response = self
            .client
            .delete(self.asset_url(asset_id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        tracing::info!(asset_id, "Deleted remote asset");
        Ok(())
    }
}
