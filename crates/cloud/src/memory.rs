//! In-process gateway implementations.
//!
//! Used by the test suites and by local development with
//! `CLOUD_BACKEND=memory`. Both fakes record what was done to them and can
//! be told to fail specific operations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CloudError;
use crate::storage::{PresignedUpload, StorageGateway};
use crate::transcoding::{AssetState, AssetStatus, TranscodingGateway, UploadTarget};
use crate::tus::ChunkTransport;

const UPLOAD_PREFIX: &str = "memory://uploads/";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn injected(status: u16, what: &str) -> CloudError {
    CloudError::Transcoder {
        status,
        message: format!("injected {what} failure"),
    }
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// [`StorageGateway`] keeping objects in a map.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    deleted: Mutex<Vec<String>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Place an object directly, as a client holding a presigned URL would.
    pub fn insert(&self, key: &str, bytes: impl Into<Bytes>, content_type: &str) {
        lock(&self.objects).insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(key).cloned()
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.objects).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Keys successfully deleted, in call order.
    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }
}

#[async_trait]
impl StorageGateway for InMemoryStorage {
    async fn issue_presigned_upload(
        &self,
        key: &str,
        _content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUpload, CloudError> {
        Ok(PresignedUpload {
            url: format!("memory://objects/{key}?expires={}", ttl.as_secs()),
            key: key.to_string(),
            expires_in_secs: ttl.as_secs(),
        })
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), CloudError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(CloudError::Storage(format!("injected put failure for {key}")));
        }
        self.insert(key, bytes, content_type);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), CloudError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CloudError::Storage(format!("injected delete failure for {key}")));
        }
        lock(&self.objects).remove(key);
        lock(&self.deleted).push(key.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transcoder
// ---------------------------------------------------------------------------

/// How an asset's poster was last set.
#[derive(Debug, Clone, PartialEq)]
pub enum Poster {
    Fraction(f64),
    Image { size: usize, content_type: String },
}

/// Server-side state of one fake asset.
#[derive(Debug, Clone)]
pub struct FakeAsset {
    pub upload_length: u64,
    pub received: Vec<u8>,
    pub status: AssetStatus,
    pub poster: Option<Poster>,
}

/// [`TranscodingGateway`] and tus [`ChunkTransport`] in one in-memory
/// service.
///
/// A completed upload flips the asset to ready with the configured
/// duration unless [`FakeTranscoder::auto_ready`] is switched off. Injected
/// chunk failures commit the first half of the chunk before failing, so a
/// correct client has to re-read the offset to resume.
pub struct FakeTranscoder {
    assets: Mutex<HashMap<String, FakeAsset>>,
    deleted: Mutex<Vec<String>>,
    next_id: AtomicU64,
    ready_duration: Mutex<Option<f64>>,
    auto_ready: AtomicBool,
    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
    chunk_calls: AtomicUsize,
    fail_next_chunks: AtomicUsize,
    fail_create: AtomicBool,
    fail_status: AtomicBool,
    fail_posters: AtomicBool,
    fail_deletes: AtomicBool,
}

impl Default for FakeTranscoder {
    fn default() -> Self {
        Self {
            assets: Mutex::default(),
            deleted: Mutex::default(),
            next_id: AtomicU64::new(1),
            ready_duration: Mutex::new(Some(60.0)),
            auto_ready: AtomicBool::new(true),
            create_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            chunk_calls: AtomicUsize::new(0),
            fail_next_chunks: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            fail_posters: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported once an upload completes (`None` = unknown).
    pub fn set_ready_duration(&self, duration_secs: Option<f64>) {
        *lock(&self.ready_duration) = duration_secs;
    }

    pub fn auto_ready(&self, enabled: bool) {
        self.auto_ready.store(enabled, Ordering::SeqCst);
    }

    /// Make the next `n` chunk sends fail.
    pub fn fail_next_chunks(&self, n: usize) {
        self.fail_next_chunks.store(n, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_status(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    pub fn fail_posters(&self, fail: bool) {
        self.fail_posters.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Register an asset uploaded out of band (client-direct upload).
    pub fn register_asset(&self, asset_id: &str, status: AssetStatus) {
        lock(&self.assets).insert(
            asset_id.to_string(),
            FakeAsset {
                upload_length: 0,
                received: Vec::new(),
                status,
                poster: None,
            },
        );
    }

    pub fn set_status(&self, asset_id: &str, status: AssetStatus) {
        if let Some(asset) = lock(&self.assets).get_mut(asset_id) {
            asset.status = status;
        }
    }

    pub fn asset(&self, asset_id: &str) -> Option<FakeAsset> {
        lock(&self.assets).get(asset_id).cloned()
    }

    pub fn asset_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.assets).keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn deleted_assets(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn chunk_calls(&self) -> usize {
        self.chunk_calls.load(Ordering::SeqCst)
    }

    fn asset_id_from(endpoint: &str) -> Result<&str, CloudError> {
        endpoint.strip_prefix(UPLOAD_PREFIX).ok_or_else(|| CloudError::Transcoder {
            status: 404,
            message: format!("unknown upload endpoint {endpoint}"),
        })
    }

    fn pending() -> AssetStatus {
        AssetStatus {
            state: AssetState::PendingUpload,
            duration_secs: None,
            ready_to_stream: false,
        }
    }

    fn take_chunk_failure(&self) -> bool {
        self.fail_next_chunks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl TranscodingGateway for FakeTranscoder {
    async fn create_upload_target(&self, upload_length: u64) -> Result<UploadTarget, CloudError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(injected(503, "create"));
        }
        let asset_id = format!("asset-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        lock(&self.assets).insert(
            asset_id.clone(),
            FakeAsset {
                upload_length,
                received: Vec::new(),
                status: Self::pending(),
                poster: None,
            },
        );
        Ok(UploadTarget {
            endpoint: format!("{UPLOAD_PREFIX}{asset_id}"),
            asset_id,
        })
    }

    async fn get_status(&self, asset_id: &str) -> Result<AssetStatus, CloudError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(injected(503, "status"));
        }
        lock(&self.assets)
            .get(asset_id)
            .map(|a| a.status.clone())
            .ok_or_else(|| CloudError::Transcoder {
                status: 404,
                message: format!("asset {asset_id} not found"),
            })
    }

    async fn set_poster_by_timestamp_fraction(
        &self,
        asset_id: &str,
        fraction: f64,
    ) -> Result<(), CloudError> {
        if self.fail_posters.load(Ordering::SeqCst) {
            return Err(injected(502, "poster"));
        }
        match lock(&self.assets).get_mut(asset_id) {
            Some(asset) => {
                asset.poster = Some(Poster::Fraction(fraction));
                Ok(())
            }
            None => Err(injected(404, "poster lookup")),
        }
    }

    async fn set_poster_by_image(
        &self,
        asset_id: &str,
        image: Bytes,
        content_type: &str,
    ) -> Result<(), CloudError> {
        if self.fail_posters.load(Ordering::SeqCst) {
            return Err(injected(502, "poster"));
        }
        match lock(&self.assets).get_mut(asset_id) {
            Some(asset) => {
                asset.poster = Some(Poster::Image {
                    size: image.len(),
                    content_type: content_type.to_string(),
                });
                Ok(())
            }
            None => Err(injected(404, "poster lookup")),
        }
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), CloudError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected(503, "delete"));
        }
        lock(&self.assets).remove(asset_id);
        lock(&self.deleted).push(asset_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl ChunkTransport for FakeTranscoder {
    async fn current_offset(&self, endpoint: &str) -> Result<u64, CloudError> {
        let asset_id = Self::asset_id_from(endpoint)?;
        lock(&self.assets)
            .get(asset_id)
            .map(|a| a.received.len() as u64)
            .ok_or_else(|| injected(404, "offset lookup"))
    }

    async fn send_chunk(
        &self,
        endpoint: &str,
        offset: u64,
        chunk: &[u8],
    ) -> Result<u64, CloudError> {
        self.chunk_calls.fetch_add(1, Ordering::SeqCst);
        let asset_id = Self::asset_id_from(endpoint)?;
        let fail = self.take_chunk_failure();
        let ready_duration = *lock(&self.ready_duration);
        let auto_ready = self.auto_ready.load(Ordering::SeqCst);

        let mut assets = lock(&self.assets);
        let asset = assets
            .get_mut(asset_id)
            .ok_or_else(|| injected(404, "upload lookup"))?;

        if offset != asset.received.len() as u64 {
            return Err(CloudError::Transcoder {
                status: 409,
                message: format!(
                    "offset mismatch: sent {offset}, server has {}",
                    asset.received.len()
                ),
            });
        }
        if offset + chunk.len() as u64 > asset.upload_length {
            return Err(CloudError::Transcoder {
                status: 413,
                message: "chunk exceeds declared Upload-Length".into(),
            });
        }

        if fail {
            asset.received.extend_from_slice(&chunk[..chunk.len() / 2]);
            return Err(injected(503, "chunk"));
        }

        asset.received.extend_from_slice(chunk);
        if asset.received.len() as u64 == asset.upload_length {
            asset.status = if auto_ready {
                AssetStatus {
                    state: AssetState::Ready,
                    duration_secs: ready_duration,
                    ready_to_stream: true,
                }
            } else {
                AssetStatus {
                    state: AssetState::Queued,
                    duration_secs: None,
                    ready_to_stream: false,
                }
            };
        }
        Ok(asset.received.len() as u64)
    }
}
