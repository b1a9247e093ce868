//! Post creation and deletion with their image objects.

use std::sync::Arc;

use bytes::Bytes;
use sqlx::PgPool;
use vidhub_cloud::{StorageGateway, TranscodingGateway};
use vidhub_core::error::CoreError;
use vidhub_core::media::validate_image;
use vidhub_core::post::validate_post;
use vidhub_core::roles::{Action, Actor};
use vidhub_core::storage_keys::{new_key, KeyPurpose};
use vidhub_core::types::DbId;
use vidhub_db::models::post::{CreatePost, Post};
use vidhub_db::repositories::PostRepo;

use crate::cleanup::{CleanupPlan, CleanupReport, BULK_CLEANUP_CONCURRENCY};
use crate::error::PipelineResult;

/// One image attached to a new post.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub content_type: String,
}

/// A stored post and its image keys in display order.
#[derive(Debug, Clone)]
pub struct PublishedPost {
    pub post: Post,
    pub image_keys: Vec<String>,
}

#[derive(Clone)]
pub struct PostPublisher {
    pool: PgPool,
    storage: Arc<dyn StorageGateway>,
    transcoder: Arc<dyn TranscodingGateway>,
}

impl PostPublisher {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn StorageGateway>,
        transcoder: Arc<dyn TranscodingGateway>,
    ) -> Self {
        Self {
            pool,
            storage,
            transcoder,
        }
    }

    /// Validate, upload the images, then insert the post.
    ///
    /// Images are stored before the row exists; if any upload or the insert
    /// fails, the objects already stored are deleted again.
    pub async fn create_post(
        &self,
        author: &Actor,
        content: &str,
        images: Vec<ImageUpload>,
    ) -> PipelineResult<PublishedPost> {
        author.ensure(Action::CreatePost, None)?;
        let content = validate_post(content, images.len())?;
        let extensions = images
            .iter()
            .map(|image| validate_image(&image.bytes, &image.content_type))
            .collect::<Result<Vec<_>, CoreError>>()?;

        let mut uploaded = Vec::with_capacity(images.len());
        for (index, (image, ext)) in images.into_iter().zip(extensions).enumerate() {
            let key = new_key(KeyPurpose::PostImage { index }, ext);
            if let Err(e) = self
                .storage
                .put_object(&key, image.bytes, &image.content_type)
                .await
            {
                tracing::warn!(key = %key, error = %e, "Post image upload failed");
                self.cleanup(uploaded).await;
                return Err(e.into());
            }
            uploaded.push(key);
        }

        let input = CreatePost {
            author_id: author.user_id,
            content,
            image_keys: uploaded.clone(),
        };
        match PostRepo::create(&self.pool, &input).await {
            Ok(post) => {
                tracing::info!(
                    post_id = post.id,
                    user_id = author.user_id,
                    images = uploaded.len(),
                    "Post created",
                );
                Ok(PublishedPost {
                    post,
                    image_keys: uploaded,
                })
            }
            Err(e) => {
                tracing::error!(user_id = author.user_id, error = %e, "Failed to persist post");
                self.cleanup(uploaded).await;
                Err(e.into())
            }
        }
    }

    /// Delete the post row, then its image objects.
    pub async fn delete_post(&self, post_id: DbId, actor: &Actor) -> PipelineResult<CleanupReport> {
        let not_found = || CoreError::NotFound {
            entity: "Post",
            id: post_id,
        };

        let post = PostRepo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(not_found)?;
        actor.ensure(Action::DeletePost, Some(post.author_id))?;

        let keys = PostRepo::delete(&self.pool, post_id)
            .await?
            .ok_or_else(not_found)?;
        let report = self.cleanup(keys).await;

        tracing::info!(
            post_id,
            user_id = actor.user_id,
            images = report.attempted,
            cleanup_failures = report.failed.len(),
            "Post deleted",
        );
        Ok(report)
    }

    async fn cleanup(&self, keys: Vec<String>) -> CleanupReport {
        if keys.is_empty() {
            return CleanupReport::default();
        }
        CleanupPlan::new()
            .delete_objects(keys)
            .run_bounded(
                self.storage.as_ref(),
                self.transcoder.as_ref(),
                BULK_CLEANUP_CONCURRENCY,
            )
            .await
    }
}
