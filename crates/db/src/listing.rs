//! Read-only listing and search over videos, comments and posts.
//!
//! Every function here is side-effect free. Cursor-paginated lists fetch
//! one row more than the page size and trim it with
//! [`Page::from_overfetch`], so `has_more` costs no second round-trip.
//! Items are decorated with public URLs and, when a viewer is known, with
//! that viewer's reaction state. Anonymous viewers never touch the reaction
//! tables.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::PgPool;
use vidhub_core::comment::COMMENT_PAGE_SIZE;
use vidhub_core::pagination::{fetch_size, Page};
use vidhub_core::search::{normalize_query, SearchCursor};
use vidhub_core::types::{DbId, Timestamp};
use vidhub_core::urls::PublicUrls;
use vidhub_core::video::{VideoSort, VideoType};

use crate::models::comment::CommentWithAuthor;
use crate::models::like::LikeKind;
use crate::models::post::PostWithAuthor;
use crate::models::video::{Video, VideoSummary};
use crate::repositories::{CommentRepo, LikeRepo, PostRepo, VideoRepo};

/// Display identity of a video uploader, comment author or post author.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub id: DbId,
    pub name: String,
    pub image_url: Option<String>,
}

/// A video as shown in lists and search results.
#[derive(Debug, Clone, Serialize)]
pub struct VideoCard {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub game_type: String,
    pub video_type: String,
    pub tags: Vec<String>,
    pub duration_secs: Option<f64>,
    pub status: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub thumbnail_url: Option<String>,
    pub playback_url: Option<String>,
    pub uploader: AuthorView,
    pub created_at: Timestamp,
}

/// A single video with the viewer's reaction state.
#[derive(Debug, Clone, Serialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub card: VideoCard,
    pub thumbnail_source: String,
    pub thumbnail_timestamp: Option<f64>,
    pub favorite_count: i64,
    pub is_liked: bool,
    pub is_favorited: bool,
}

/// A comment annotated for the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: DbId,
    pub video_id: DbId,
    pub parent_id: Option<DbId>,
    pub content: String,
    pub author: AuthorView,
    pub like_count: i64,
    pub reply_count: i64,
    pub is_liked: bool,
    pub created_at: Timestamp,
}

/// A post annotated for the viewer, with images in display order.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: DbId,
    pub content: String,
    pub author: AuthorView,
    pub image_urls: Vec<String>,
    pub like_count: i64,
    pub is_liked: bool,
    pub created_at: Timestamp,
}

/// Search results with the normalized query echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    #[serde(flatten)]
    pub page: Page<VideoCard, SearchCursor>,
}

/// Public thumbnail URL for a video: the custom object when one is set,
/// otherwise the transcoder's frame at the chosen timestamp.
pub fn thumbnail_url(urls: &PublicUrls, video: &Video) -> Option<String> {
    if let Some(key) = &video.custom_thumbnail_key {
        return Some(urls.object(key));
    }
    video
        .stream_uid
        .as_deref()
        .map(|uid| urls.stream_thumbnail(uid, video.thumbnail_timestamp))
}

fn author(urls: &PublicUrls, id: DbId, name: String, image: Option<String>) -> AuthorView {
    AuthorView {
        id,
        name,
        image_url: image.as_deref().map(|i| urls.user_image(i)),
    }
}

fn video_card(urls: &PublicUrls, summary: VideoSummary) -> VideoCard {
    let thumbnail_url = thumbnail_url(urls, &summary.video);
    let playback_url = summary
        .video
        .stream_uid
        .as_deref()
        .map(|uid| urls.stream_playback(uid));
    let v = summary.video;
    VideoCard {
        id: v.id,
        title: v.title,
        description: v.description,
        game_type: v.game_type,
        video_type: v.video_type,
        tags: v.tags,
        duration_secs: v.duration_secs,
        status: v.status,
        view_count: v.view_count,
        like_count: summary.like_count,
        comment_count: summary.comment_count,
        thumbnail_url,
        playback_url,
        uploader: author(urls, v.uploaded_by, summary.uploader_name, summary.uploader_image),
        created_at: v.created_at,
    }
}

/// IDs the viewer has reacted to, or an empty set without a query when
/// there is no viewer.
async fn viewer_likes(
    pool: &PgPool,
    kind: LikeKind,
    viewer: Option<DbId>,
    ids: &[DbId],
) -> Result<HashSet<DbId>, sqlx::Error> {
    match viewer {
        Some(user_id) if !ids.is_empty() => Ok(LikeRepo::liked_ids(pool, kind, user_id, ids)
            .await?
            .into_iter()
            .collect()),
        _ => Ok(HashSet::new()),
    }
}

/// Playable videos of one type in the requested order.
///
/// Single-page contract: the result carries no continuation cursor, though
/// a caller may still pass the id of the last item it holds.
pub async fn list_videos(
    pool: &PgPool,
    urls: &PublicUrls,
    video_type: VideoType,
    sort: VideoSort,
    limit: i64,
    cursor: Option<DbId>,
) -> Result<Vec<VideoCard>, sqlx::Error> {
    let rows = VideoRepo::list_playable(pool, video_type, sort, limit, cursor).await?;
    Ok(rows.into_iter().map(|s| video_card(urls, s)).collect())
}

/// Search playable videos, most viewed first.
///
/// A blank query returns an empty page without touching the database.
pub async fn search_videos(
    pool: &PgPool,
    urls: &PublicUrls,
    query: &str,
    limit: i64,
    cursor: Option<&SearchCursor>,
) -> Result<SearchResults, sqlx::Error> {
    let Some(query) = normalize_query(query) else {
        return Ok(SearchResults {
            query: String::new(),
            page: Page::empty(),
        });
    };

    let rows = VideoRepo::search(pool, &query, fetch_size(limit), cursor).await?;
    let page = Page::from_overfetch(rows, limit, |s| SearchCursor {
        view_count: s.video.view_count,
        created_at: s.video.created_at,
        id: s.video.id,
    })
    .map(|s| video_card(urls, s));
    Ok(SearchResults { query, page })
}

/// One video with counts and the viewer's like/favorite state.
pub async fn video_detail(
    pool: &PgPool,
    urls: &PublicUrls,
    video_id: DbId,
    viewer: Option<DbId>,
) -> Result<Option<VideoDetail>, sqlx::Error> {
    let Some(summary) = VideoRepo::find_summary(pool, video_id).await? else {
        return Ok(None);
    };

    let (is_liked, is_favorited) = match viewer {
        Some(user_id) => (
            LikeRepo::is_liked(pool, LikeKind::VideoLike, video_id, user_id).await?,
            LikeRepo::is_liked(pool, LikeKind::Favorite, video_id, user_id).await?,
        ),
        None => (false, false),
    };
    let favorite_count = LikeRepo::count(pool, LikeKind::Favorite, video_id).await?;

    let thumbnail_source = summary.video.thumbnail_source.clone();
    let thumbnail_timestamp = summary.video.thumbnail_timestamp;
    Ok(Some(VideoDetail {
        card: video_card(urls, summary),
        thumbnail_source,
        thumbnail_timestamp,
        favorite_count,
        is_liked,
        is_favorited,
    }))
}

/// One level of a video's comment thread, newest first.
///
/// `parent_id = None` lists top-level comments only; `Some(id)` lists the
/// direct replies to that comment.
pub async fn list_comments(
    pool: &PgPool,
    urls: &PublicUrls,
    video_id: DbId,
    viewer: Option<DbId>,
    cursor: Option<DbId>,
    parent_id: Option<DbId>,
) -> Result<Page<CommentView>, sqlx::Error> {
    let rows = CommentRepo::list_thread(
        pool,
        video_id,
        parent_id,
        cursor,
        fetch_size(COMMENT_PAGE_SIZE),
    )
    .await?;
    let page = Page::from_overfetch(rows, COMMENT_PAGE_SIZE, |c| c.comment.id);

    let ids: Vec<DbId> = page.items.iter().map(|c| c.comment.id).collect();
    let liked = viewer_likes(pool, LikeKind::CommentLike, viewer, &ids).await?;

    Ok(page.map(|row: CommentWithAuthor| {
        let c = row.comment;
        CommentView {
            is_liked: liked.contains(&c.id),
            id: c.id,
            video_id: c.video_id,
            parent_id: c.parent_id,
            content: c.content,
            author: author(urls, c.user_id, row.author_name, row.author_image),
            like_count: row.like_count,
            reply_count: row.reply_count,
            created_at: c.created_at,
        }
    }))
}

/// Community posts, newest first.
pub async fn list_posts(
    pool: &PgPool,
    urls: &PublicUrls,
    viewer: Option<DbId>,
    cursor: Option<DbId>,
    limit: i64,
) -> Result<Page<PostView>, sqlx::Error> {
    let rows = PostRepo::list_page(pool, cursor, fetch_size(limit)).await?;
    let page = Page::from_overfetch(rows, limit, |p| p.post.id);

    let ids: Vec<DbId> = page.items.iter().map(|p| p.post.id).collect();
    let liked = viewer_likes(pool, LikeKind::PostLike, viewer, &ids).await?;

    let mut images: HashMap<DbId, Vec<String>> = HashMap::new();
    for image in PostRepo::images_for_posts(pool, &ids).await? {
        images
            .entry(image.post_id)
            .or_default()
            .push(urls.object(&image.image_key));
    }

    Ok(page.map(|row: PostWithAuthor| {
        let p = row.post;
        PostView {
            is_liked: liked.contains(&p.id),
            image_urls: images.remove(&p.id).unwrap_or_default(),
            id: p.id,
            content: p.content,
            author: author(urls, p.author_id, row.author_name, row.author_image),
            like_count: row.like_count,
            created_at: p.created_at,
        }
    }))
}
