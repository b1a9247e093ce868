//! Seeding helpers shared by the repository integration tests.

#![allow(dead_code)]

use sqlx::PgPool;
use vidhub_core::urls::PublicUrls;
use vidhub_core::video::{ThumbnailSetting, VideoStatus, VideoType};
use vidhub_db::models::comment::{Comment, CreateComment};
use vidhub_db::models::user::{CreateUser, User};
use vidhub_db::models::video::{CreateVideo, Video};
use vidhub_db::repositories::{CommentRepo, UserRepo, VideoRepo};

pub fn urls() -> PublicUrls {
    PublicUrls::new("https://cdn.test", "https://stream.test")
}

pub async fn user(pool: &PgPool, name: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            image: None,
            role: "viewer".to_string(),
        },
    )
    .await
    .unwrap()
}

pub fn new_video(uploaded_by: i64, title: &str, video_type: VideoType, uid: &str) -> CreateVideo {
    CreateVideo {
        title: title.to_string(),
        description: None,
        game_type: "puzzle".to_string(),
        video_type,
        tags: Vec::new(),
        duration_secs: Some(60.0),
        status: VideoStatus::Ready,
        stream_uid: uid.to_string(),
        thumbnail: ThumbnailSetting::Stream {
            timestamp_secs: 3.0,
        },
        uploaded_by,
    }
}

pub async fn video(pool: &PgPool, uploaded_by: i64, title: &str, video_type: VideoType) -> Video {
    let uid = format!("uid-{}", title.to_lowercase().replace(' ', "-"));
    VideoRepo::create(pool, &new_video(uploaded_by, title, video_type, &uid))
        .await
        .unwrap()
}

pub async fn set_views(pool: &PgPool, video_id: i64, views: i64) {
    sqlx::query("UPDATE videos SET view_count = $2 WHERE id = $1")
        .bind(video_id)
        .bind(views)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn comment(
    pool: &PgPool,
    video_id: i64,
    user_id: i64,
    content: &str,
    parent_id: Option<i64>,
) -> Result<Comment, sqlx::Error> {
    CommentRepo::create(
        pool,
        &CreateComment {
            video_id,
            user_id,
            content: content.to_string(),
            parent_id,
        },
    )
    .await
}
