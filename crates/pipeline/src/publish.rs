//! The video publish pipeline and the edit/delete paths.
//!
//! Publishing runs four stages strictly in order:
//!
//! 1. acquire a one-time upload target (size checked first)
//! 2. resumable transfer of the video bytes
//! 3. thumbnail: stream poster by timestamp, or a custom image in storage
//! 4. persist the `videos` row
//!
//! Nothing is written to the database unless every earlier stage
//! succeeded. External side effects of a failed publish are undone with a
//! best-effort [`CleanupPlan`].

use std::sync::Arc;

use bytes::Bytes;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use vidhub_cloud::{ChunkTransport, StorageGateway, TranscodingGateway, UploadTarget};
use vidhub_core::error::CoreError;
use vidhub_core::media::{probe_dimensions, validate_image, validate_thumbnail_aspect};
use vidhub_core::roles::{Action, Actor};
use vidhub_core::storage_keys::{new_key, validate_key_for, KeyPurpose};
use vidhub_core::types::DbId;
use vidhub_core::video::{
    poster_fraction, validate_metadata, validate_video_content_type, validate_video_size,
    ThumbnailSetting, ValidMetadata, VideoStatus, VideoType, MAX_VIDEO_BYTES,
};
use vidhub_db::models::video::{CreateVideo, Video};
use vidhub_db::repositories::{UploadTargetRepo, VideoRepo};

use crate::cleanup::{CleanupPlan, CleanupReport};
use crate::error::PipelineResult;
use crate::status::{wait_for_ready, PollOutcome, PollPolicy};
use crate::transfer::{upload_resumable, TransferOptions};

/// Tunables for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub transfer: TransferOptions,
    pub poll: PollPolicy,
    pub max_video_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transfer: TransferOptions::default(),
            poll: PollPolicy::default(),
            max_video_bytes: MAX_VIDEO_BYTES,
        }
    }
}

/// User-supplied metadata for a new video.
#[derive(Debug, Clone)]
pub struct VideoMetadataInput {
    pub title: String,
    pub description: Option<String>,
    pub game_type: String,
    pub tags: Vec<String>,
}

/// Partial metadata edit; `None` keeps the stored value. A blank
/// description clears it.
#[derive(Debug, Clone, Default)]
pub struct VideoMetadataPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub game_type: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Where the poster for a video should come from.
#[derive(Debug, Clone)]
pub enum ThumbnailChoice {
    /// A frame of the video, `timestamp_secs` from the start.
    Stream { timestamp_secs: f64 },
    /// Image bytes relayed through the server.
    Upload { bytes: Bytes, content_type: String },
    /// Image the client already uploaded with a presigned URL.
    Uploaded { key: String },
}

#[derive(Debug, Clone)]
pub struct VideoFile {
    pub bytes: Bytes,
    pub content_type: String,
}

/// One-shot publish where the server relays the video bytes.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub uploader: Actor,
    pub video_type: VideoType,
    pub metadata: VideoMetadataInput,
    pub video: VideoFile,
    pub thumbnail: ThumbnailChoice,
}

/// Completion of a client-direct upload to an already acquired target.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub uploader: Actor,
    pub video_type: VideoType,
    pub metadata: VideoMetadataInput,
    pub asset_id: String,
    pub thumbnail: ThumbnailChoice,
}

/// A thumbnail choice that passed validation.
enum PreparedThumbnail {
    Stream(f64),
    Upload {
        bytes: Bytes,
        content_type: String,
        ext: &'static str,
    },
    Uploaded(String),
}

fn prepare_thumbnail(
    choice: ThumbnailChoice,
    video_type: VideoType,
) -> Result<PreparedThumbnail, CoreError> {
    match choice {
        ThumbnailChoice::Stream { timestamp_secs } => {
            ThumbnailSetting::Stream { timestamp_secs }.validate()?;
            Ok(PreparedThumbnail::Stream(timestamp_secs))
        }
        ThumbnailChoice::Upload {
            bytes,
            content_type,
        } => {
            let ext = validate_image(&bytes, &content_type)?;
            validate_thumbnail_aspect(probe_dimensions(&bytes)?, video_type)?;
            Ok(PreparedThumbnail::Upload {
                bytes,
                content_type,
                ext,
            })
        }
        ThumbnailChoice::Uploaded { key } => {
            validate_key_for(KeyPurpose::Thumbnail(video_type), &key)?;
            Ok(PreparedThumbnail::Uploaded(key))
        }
    }
}

fn validate_input(metadata: &VideoMetadataInput) -> Result<ValidMetadata, CoreError> {
    validate_metadata(
        &metadata.title,
        metadata.description.as_deref(),
        &metadata.game_type,
        &metadata.tags,
    )
}

fn video_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "Video",
        id,
    }
}

/// Orchestrates the transcoder, object storage and the database for
/// everything that writes videos.
#[derive(Clone)]
pub struct PublishPipeline {
    pool: PgPool,
    storage: Arc<dyn StorageGateway>,
    transcoder: Arc<dyn TranscodingGateway>,
    transport: Arc<dyn ChunkTransport>,
    config: PipelineConfig,
}

impl PublishPipeline {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn StorageGateway>,
        transcoder: Arc<dyn TranscodingGateway>,
        transport: Arc<dyn ChunkTransport>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            pool,
            storage,
            transcoder,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage 1: reserve an upload endpoint for `declared_bytes`.
    ///
    /// Oversized or empty files are rejected before the transcoder is
    /// contacted. The acquiring user is recorded as the owner of the asset;
    /// only they can [`finalize`](Self::finalize) it.
    pub async fn acquire_upload_target(
        &self,
        actor: &Actor,
        declared_bytes: u64,
    ) -> PipelineResult<UploadTarget> {
        actor.ensure(Action::PublishVideo, None)?;
        validate_video_size(declared_bytes, self.config.max_video_bytes)?;

        let target = self.transcoder.create_upload_target(declared_bytes).await?;
        let recorded =
            UploadTargetRepo::record(&self.pool, &target.asset_id, actor.user_id).await;
        if let Err(e) = recorded {
            tracing::error!(
                asset_id = %target.asset_id,
                error = %e,
                "Failed to record upload target",
            );
            self.cleanup(CleanupPlan::new().delete_asset(&target.asset_id)).await;
            return Err(e.into());
        }
        tracing::info!(
            user_id = actor.user_id,
            asset_id = %target.asset_id,
            declared_bytes,
            "Upload target acquired",
        );
        Ok(target)
    }

    /// Run the whole pipeline for a server-relayed upload.
    ///
    /// A thumbnail failure is fatal here: the asset and any stored image
    /// are cleaned up and no row is created. Cancelling `cancel` stops the
    /// transfer and likewise persists nothing.
    pub async fn publish(
        &self,
        request: PublishRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult<Video> {
        let PublishRequest {
            uploader,
            video_type,
            metadata,
            video,
            thumbnail,
        } = request;

        uploader.ensure(Action::PublishVideo, None)?;
        let metadata = validate_input(&metadata)?;
        validate_video_content_type(&video.content_type)?;
        let thumbnail = prepare_thumbnail(thumbnail, video_type)?;

        // Stage 1
        let target = self
            .acquire_upload_target(&uploader, video.bytes.len() as u64)
            .await?;
        let asset_id = target.asset_id.clone();

        // Stage 2
        if let Err(e) = upload_resumable(
            self.transport.as_ref(),
            &target.endpoint,
            &video.bytes,
            &self.config.transfer,
            cancel,
        )
        .await
        {
            tracing::warn!(asset_id = %asset_id, error = %e, "Video transfer failed");
            self.cleanup(CleanupPlan::new().delete_asset(&asset_id)).await;
            return Err(e.into());
        }

        let outcome = wait_for_ready(self.transcoder.as_ref(), &asset_id, &self.config.poll).await;
        if let PollOutcome::Failed(_) = outcome {
            self.cleanup(CleanupPlan::new().delete_asset(&asset_id)).await;
            return Err(CoreError::ExternalService("Video processing failed".into()).into());
        }

        // Stage 3
        let mut created = Vec::new();
        let setting = match self
            .apply_thumbnail(
                Some(&asset_id),
                thumbnail,
                video_type,
                outcome.duration_secs(),
                &mut created,
            )
            .await
        {
            Ok(setting) => setting,
            Err(e) => {
                tracing::warn!(asset_id = %asset_id, error = %e, "Thumbnail stage failed");
                self.cleanup(CleanupPlan::new().delete_asset(&asset_id).delete_objects(created))
                    .await;
                return Err(e);
            }
        };

        // Stage 4
        let input = CreateVideo {
            title: metadata.title,
            description: metadata.description,
            game_type: metadata.game_type,
            video_type,
            tags: metadata.tags,
            duration_secs: outcome.duration_secs(),
            status: status_of(&outcome),
            stream_uid: asset_id.clone(),
            thumbnail: setting,
            uploaded_by: uploader.user_id,
        };
        match VideoRepo::create(&self.pool, &input).await {
            Ok(video) => {
                tracing::info!(
                    video_id = video.id,
                    user_id = uploader.user_id,
                    asset_id = %asset_id,
                    "Video published",
                );
                Ok(video)
            }
            Err(e) => {
                tracing::error!(asset_id = %asset_id, error = %e, "Failed to persist video");
                self.cleanup(CleanupPlan::new().delete_asset(&asset_id).delete_objects(created))
                    .await;
                Err(e.into())
            }
        }
    }

    /// Persist a video the client uploaded directly to an acquired target.
    ///
    /// The asset must come from [`acquire_upload_target`](Self::acquire_upload_target)
    /// called by the same user, and the transcoder must have acknowledged it
    /// at least once. A thumbnail failure is logged and the poster falls
    /// back to the first frame.
    pub async fn finalize(&self, request: FinalizeRequest) -> PipelineResult<Video> {
        let FinalizeRequest {
            uploader,
            video_type,
            metadata,
            asset_id,
            thumbnail,
        } = request;

        uploader.ensure(Action::PublishVideo, None)?;
        let metadata = validate_input(&metadata)?;
        if asset_id.trim().is_empty() {
            return Err(CoreError::Validation("Upload id is required".into()).into());
        }
        let thumbnail = prepare_thumbnail(thumbnail, video_type)?;

        match UploadTargetRepo::owner(&self.pool, &asset_id).await? {
            Some(owner) if owner == uploader.user_id => {}
            Some(owner) => {
                tracing::warn!(
                    asset_id = %asset_id,
                    owner,
                    user_id = uploader.user_id,
                    "Finalize attempted on another user's upload",
                );
                return Err(CoreError::Forbidden("Upload belongs to another user".into()).into());
            }
            None => {
                return Err(CoreError::Validation(format!(
                    "Upload '{asset_id}' was not issued by this service"
                ))
                .into());
            }
        }

        let outcome = wait_for_ready(self.transcoder.as_ref(), &asset_id, &self.config.poll).await;
        match &outcome {
            PollOutcome::Failed(_) => {
                self.cleanup(CleanupPlan::new().delete_asset(&asset_id)).await;
                return Err(CoreError::ExternalService("Video processing failed".into()).into());
            }
            PollOutcome::TimedOut(None) => {
                return Err(CoreError::Validation(format!(
                    "Upload '{asset_id}' is not known to the video service"
                ))
                .into());
            }
            _ => {}
        }

        let mut created = Vec::new();
        let setting = match self
            .apply_thumbnail(
                Some(&asset_id),
                thumbnail,
                video_type,
                outcome.duration_secs(),
                &mut created,
            )
            .await
        {
            Ok(setting) => setting,
            Err(e) => {
                tracing::warn!(
                    asset_id = %asset_id,
                    error = %e,
                    "Thumbnail failed, falling back to first frame",
                );
                self.cleanup(CleanupPlan::new().delete_objects(std::mem::take(&mut created)))
                    .await;
                ThumbnailSetting::Stream {
                    timestamp_secs: 0.0,
                }
            }
        };

        let input = CreateVideo {
            title: metadata.title,
            description: metadata.description,
            game_type: metadata.game_type,
            video_type,
            tags: metadata.tags,
            duration_secs: outcome.duration_secs(),
            status: status_of(&outcome),
            stream_uid: asset_id.clone(),
            thumbnail: setting,
            uploaded_by: uploader.user_id,
        };
        match VideoRepo::create(&self.pool, &input).await {
            Ok(video) => {
                tracing::info!(
                    video_id = video.id,
                    user_id = uploader.user_id,
                    asset_id = %asset_id,
                    "Video finalized",
                );
                Ok(video)
            }
            Err(e) => {
                tracing::error!(asset_id = %asset_id, error = %e, "Failed to persist video");
                self.cleanup(CleanupPlan::new().delete_objects(created)).await;
                Err(e.into())
            }
        }
    }

    /// Change the poster of an existing video.
    ///
    /// The previous custom image is deleted only after the row update
    /// commits, and only best-effort.
    pub async fn update_thumbnail(
        &self,
        video_id: DbId,
        actor: &Actor,
        choice: ThumbnailChoice,
    ) -> PipelineResult<Video> {
        let video = self.owned_video(video_id, actor, Action::EditVideo).await?;
        let video_type = video.video_type()?;
        let previous = video.thumbnail()?;
        let thumbnail = prepare_thumbnail(choice, video_type)?;

        let mut created = Vec::new();
        let setting = match self
            .apply_thumbnail(
                video.stream_uid.as_deref(),
                thumbnail,
                video_type,
                video.duration_secs,
                &mut created,
            )
            .await
        {
            Ok(setting) => setting,
            Err(e) => {
                self.cleanup(CleanupPlan::new().delete_objects(created)).await;
                return Err(e);
            }
        };

        let updated = match VideoRepo::update_thumbnail(&self.pool, video_id, &setting).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.cleanup(CleanupPlan::new().delete_objects(created)).await;
                return Err(video_not_found(video_id).into());
            }
            Err(e) => {
                self.cleanup(CleanupPlan::new().delete_objects(created)).await;
                return Err(e.into());
            }
        };

        if let Some(old_key) = previous.custom_key() {
            if setting.custom_key() != Some(old_key) {
                self.cleanup(CleanupPlan::new().delete_object(old_key)).await;
            }
        }

        tracing::info!(
            video_id,
            user_id = actor.user_id,
            source = setting.source().as_str(),
            "Video thumbnail updated",
        );
        Ok(updated)
    }

    /// Apply a partial metadata edit.
    pub async fn update_metadata(
        &self,
        video_id: DbId,
        actor: &Actor,
        patch: VideoMetadataPatch,
    ) -> PipelineResult<Video> {
        let video = self.owned_video(video_id, actor, Action::EditVideo).await?;

        let description = match &patch.description {
            Some(d) => Some(d.as_str()),
            None => video.description.as_deref(),
        };
        let metadata = validate_metadata(
            patch.title.as_deref().unwrap_or(&video.title),
            description,
            patch.game_type.as_deref().unwrap_or(&video.game_type),
            patch.tags.as_deref().unwrap_or(&video.tags),
        )?;

        let updated = VideoRepo::update_metadata(&self.pool, video_id, &metadata)
            .await?
            .ok_or_else(|| video_not_found(video_id))?;
        tracing::info!(video_id, user_id = actor.user_id, "Video metadata updated");
        Ok(updated)
    }

    /// Re-read the transcoder's status and store it on the row.
    pub async fn refresh_status(&self, video_id: DbId, actor: &Actor) -> PipelineResult<Video> {
        let video = self.owned_video(video_id, actor, Action::EditVideo).await?;
        let Some(asset_id) = video.stream_uid.as_deref() else {
            return Ok(video);
        };

        let status = self.transcoder.get_status(asset_id).await?;
        let updated = VideoRepo::update_status(
            &self.pool,
            video_id,
            status.video_status(),
            status.duration_secs,
        )
        .await?
        .ok_or_else(|| video_not_found(video_id))?;

        tracing::debug!(video_id, status = %updated.status, "Video status refreshed");
        Ok(updated)
    }

    /// Delete a video: remote asset, then custom thumbnail, then the row.
    ///
    /// External deletions are best-effort and never stop the row delete.
    pub async fn delete_video(&self, video_id: DbId, actor: &Actor) -> PipelineResult<CleanupReport> {
        let video = self.owned_video(video_id, actor, Action::DeleteVideo).await?;

        let mut plan = CleanupPlan::new();
        if let Some(asset_id) = &video.stream_uid {
            plan = plan.delete_asset(asset_id);
        }
        if let Some(key) = &video.custom_thumbnail_key {
            plan = plan.delete_object(key);
        }
        let report = self.cleanup(plan).await;

        if !VideoRepo::delete(&self.pool, video_id).await? {
            return Err(video_not_found(video_id).into());
        }

        tracing::info!(
            video_id,
            user_id = actor.user_id,
            cleanup_failures = report.failed.len(),
            "Video deleted",
        );
        Ok(report)
    }

    /// Load a video and check `action` against its owner.
    async fn owned_video(
        &self,
        video_id: DbId,
        actor: &Actor,
        action: Action,
    ) -> PipelineResult<Video> {
        let video = VideoRepo::find_by_id(&self.pool, video_id)
            .await?
            .ok_or_else(|| video_not_found(video_id))?;
        actor.ensure(action, Some(video.uploaded_by))?;
        Ok(video)
    }

    /// Stage 3. Keys of objects written to storage are pushed onto
    /// `created` as soon as they exist, so the caller can undo them.
    async fn apply_thumbnail(
        &self,
        asset_id: Option<&str>,
        thumbnail: PreparedThumbnail,
        video_type: VideoType,
        duration_secs: Option<f64>,
        created: &mut Vec<String>,
    ) -> PipelineResult<ThumbnailSetting> {
        match thumbnail {
            PreparedThumbnail::Stream(timestamp_secs) => {
                if let Some(asset_id) = asset_id {
                    match poster_fraction(timestamp_secs, duration_secs) {
                        Some(fraction) => {
                            self.transcoder
                                .set_poster_by_timestamp_fraction(asset_id, fraction)
                                .await?;
                        }
                        None => tracing::warn!(
                            asset_id,
                            timestamp_secs,
                            "Duration unknown, leaving default poster",
                        ),
                    }
                }
                Ok(ThumbnailSetting::Stream { timestamp_secs })
            }
            PreparedThumbnail::Upload {
                bytes,
                content_type,
                ext,
            } => {
                let key = new_key(KeyPurpose::Thumbnail(video_type), ext);
                self.storage
                    .put_object(&key, bytes.clone(), &content_type)
                    .await?;
                created.push(key.clone());

                if let Some(asset_id) = asset_id {
                    if let Err(e) = self
                        .transcoder
                        .set_poster_by_image(asset_id, bytes, &content_type)
                        .await
                    {
                        tracing::warn!(asset_id, key = %key, error = %e, "Failed to set stream poster image");
                    }
                }
                Ok(ThumbnailSetting::Custom { key })
            }
            PreparedThumbnail::Uploaded(key) => Ok(ThumbnailSetting::Custom { key }),
        }
    }

    async fn cleanup(&self, plan: CleanupPlan) -> CleanupReport {
        if plan.is_empty() {
            return CleanupReport::default();
        }
        plan.run_in_order(self.storage.as_ref(), self.transcoder.as_ref())
            .await
    }
}

fn status_of(outcome: &PollOutcome) -> VideoStatus {
    outcome
        .status()
        .map(|s| s.video_status())
        .unwrap_or(VideoStatus::Processing)
}
