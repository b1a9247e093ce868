//! Integration tests for the listing and search service.
//!
//! Covers ordering, playability filtering, keyset continuation (including
//! deletions between pages), the blank-query short circuit, and viewer
//! annotations.

mod common;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use vidhub_core::video::{VideoSort, VideoType};
use vidhub_db::listing;
use vidhub_db::models::like::LikeKind;
use vidhub_db::models::post::CreatePost;
use vidhub_db::repositories::{LikeRepo, PostRepo, VideoRepo};

use common::{comment, set_views, urls, user, video};

// ---------------------------------------------------------------------------
// listVideos
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_shorts_sorted_by_views(pool: PgPool) {
    let u = user(&pool, "alice").await;
    let a = video(&pool, u.id, "A", VideoType::Shorts).await;
    let b = video(&pool, u.id, "B", VideoType::Shorts).await;
    let c = video(&pool, u.id, "C", VideoType::Shorts).await;
    set_views(&pool, a.id, 5).await;
    set_views(&pool, b.id, 9).await;
    set_views(&pool, c.id, 1).await;

    let cards = listing::list_videos(&pool, &urls(), VideoType::Shorts, VideoSort::Viewed, 2, None)
        .await
        .unwrap();

    let views: Vec<i64> = cards.iter().map(|v| v.view_count).collect();
    assert_eq!(views, vec![9, 5]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_videos_filters_type_and_playability(pool: PgPool) {
    let u = user(&pool, "alice").await;
    let normal = video(&pool, u.id, "Normal one", VideoType::Normal).await;
    video(&pool, u.id, "Short one", VideoType::Shorts).await;
    sqlx::query(
        "INSERT INTO videos (title, game_type, video_type, thumbnail_source,
                             thumbnail_timestamp, uploaded_by)
         VALUES ('Unplayable', 'g', 'normal', 'stream', 0, $1)",
    )
    .bind(u.id)
    .execute(&pool)
    .await
    .unwrap();

    let cards = listing::list_videos(&pool, &urls(), VideoType::Normal, VideoSort::Latest, 10, None)
        .await
        .unwrap();

    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id, normal.id);
    assert_eq!(
        cards[0].playback_url.as_deref(),
        Some("https://stream.test/uid-normal-one/manifest/video.m3u8")
    );
    assert_eq!(
        cards[0].thumbnail_url.as_deref(),
        Some("https://stream.test/uid-normal-one/thumbnails/thumbnail.jpg?time=3s")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_videos_orderings_and_cursor(pool: PgPool) {
    let u = user(&pool, "alice").await;
    let fan = user(&pool, "fan").await;
    let first = video(&pool, u.id, "First", VideoType::Normal).await;
    let second = video(&pool, u.id, "Second", VideoType::Normal).await;
    let third = video(&pool, u.id, "Third", VideoType::Normal).await;
    LikeRepo::toggle(&pool, LikeKind::VideoLike, second.id, fan.id)
        .await
        .unwrap();
    LikeRepo::toggle(&pool, LikeKind::VideoLike, second.id, u.id)
        .await
        .unwrap();
    LikeRepo::toggle(&pool, LikeKind::VideoLike, first.id, fan.id)
        .await
        .unwrap();

    let ids = |cards: Vec<listing::VideoCard>| cards.into_iter().map(|c| c.id).collect::<Vec<_>>();
    let list = |sort, cursor| {
        let pool = pool.clone();
        async move {
            listing::list_videos(&pool, &urls(), VideoType::Normal, sort, 10, cursor)
                .await
                .unwrap()
        }
    };

    assert_eq!(ids(list(VideoSort::Latest, None).await), vec![third.id, second.id, first.id]);
    assert_eq!(ids(list(VideoSort::Earliest, None).await), vec![first.id, second.id, third.id]);
    assert_eq!(ids(list(VideoSort::Liked, None).await), vec![second.id, first.id, third.id]);

    // The cursor row is excluded; only rows strictly after it come back.
    assert_eq!(ids(list(VideoSort::Latest, Some(second.id)).await), vec![first.id]);
    assert_eq!(ids(list(VideoSort::Earliest, Some(second.id)).await), vec![third.id]);

    let liked = list(VideoSort::Liked, None).await;
    assert_eq!(liked[0].like_count, 2);

    // Time orderings continue by id once the cursor video is gone.
    assert!(VideoRepo::delete(&pool, second.id).await.unwrap());
    assert_eq!(ids(list(VideoSort::Latest, Some(second.id)).await), vec![first.id]);
    assert_eq!(ids(list(VideoSort::Earliest, Some(second.id)).await), vec![third.id]);
}

// ---------------------------------------------------------------------------
// searchVideos
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_blank_search_never_touches_the_database() {
    // A lazy pool pointing nowhere: any query would fail.
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://nobody@127.0.0.1:1/none")
        .unwrap();

    let results = listing::search_videos(&pool, &urls(), "   ", 10, None)
        .await
        .unwrap();

    assert!(results.page.items.is_empty());
    assert!(!results.page.has_more);
    assert_eq!(results.page.next_cursor, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_matches_fields_and_whole_tags(pool: PgPool) {
    let alice = user(&pool, "Alice Speedrunner").await;
    let bob = user(&pool, "bob").await;

    let by_title = video(&pool, bob.id, "Puzzle Marathon", VideoType::Normal).await;
    let by_uploader = video(&pool, alice.id, "Chill run", VideoType::Normal).await;

    let mut tagged = common::new_video(bob.id, "Tagged", VideoType::Shorts, "uid-tagged");
    tagged.tags = vec!["Speed".to_string()];
    let tagged = VideoRepo::create(&pool, &tagged).await.unwrap();

    let mut partial_tag = common::new_video(bob.id, "Other", VideoType::Normal, "uid-other");
    partial_tag.tags = vec!["speedrun-any".to_string()];
    let partial_tag = VideoRepo::create(&pool, &partial_tag).await.unwrap();

    let results = listing::search_videos(&pool, &urls(), "  speed ", 10, None)
        .await
        .unwrap();
    let ids: Vec<i64> = results.page.items.iter().map(|v| v.id).collect();

    assert_eq!(results.query, "speed");
    assert!(ids.contains(&by_uploader.id), "uploader name substring");
    assert!(ids.contains(&tagged.id), "whole tag, case-insensitive");
    assert!(!ids.contains(&partial_tag.id), "tag substrings do not match");
    assert!(!ids.contains(&by_title.id));

    let results = listing::search_videos(&pool, &urls(), "MARATHON", 10, None)
        .await
        .unwrap();
    assert_eq!(results.page.items.len(), 1);
    assert_eq!(results.page.items[0].id, by_title.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_escapes_like_wildcards(pool: PgPool) {
    let u = user(&pool, "u").await;
    video(&pool, u.id, "Plain title", VideoType::Normal).await;
    let percent = video(&pool, u.id, "100% run", VideoType::Normal).await;

    let results = listing::search_videos(&pool, &urls(), "%", 10, None)
        .await
        .unwrap();

    let ids: Vec<i64> = results.page.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![percent.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_pages_cover_every_match_once(pool: PgPool) {
    let u = user(&pool, "u").await;
    let mut expected = Vec::new();
    for (i, views) in [3, 7, 7, 1, 9].into_iter().enumerate() {
        let v = video(&pool, u.id, &format!("Match {i}"), VideoType::Normal).await;
        set_views(&pool, v.id, views).await;
        expected.push((views, v.id));
    }
    // view_count DESC, then newest first among equal counts.
    expected.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    let expected: Vec<i64> = expected.into_iter().map(|(_, id)| id).collect();

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let results = listing::search_videos(&pool, &urls(), "match", 2, cursor.as_ref())
            .await
            .unwrap();
        let page = results.page;
        assert!(page.items.len() <= 2);
        seen.extend(page.items.iter().map(|v| v.id));
        if !page.has_more {
            assert_eq!(page.next_cursor, None);
            break;
        }
        let next = page.next_cursor.unwrap();
        let last = page.items.last().unwrap();
        assert_eq!((next.id, next.view_count), (last.id, last.view_count));
        cursor = Some(next);
    }

    assert_eq!(seen, expected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_continues_after_cursor_video_is_deleted(pool: PgPool) {
    let u = user(&pool, "u").await;
    let mut ids = Vec::new();
    for (i, views) in [50, 40, 30, 20].into_iter().enumerate() {
        let v = video(&pool, u.id, &format!("Match {i}"), VideoType::Normal).await;
        set_views(&pool, v.id, views).await;
        ids.push(v.id);
    }

    let first = listing::search_videos(&pool, &urls(), "match", 2, None)
        .await
        .unwrap()
        .page;
    let cursor = first.next_cursor.unwrap();
    assert_eq!(cursor.id, ids[1]);
    assert!(VideoRepo::delete(&pool, cursor.id).await.unwrap());

    let rest = listing::search_videos(&pool, &urls(), "match", 2, Some(&cursor))
        .await
        .unwrap()
        .page;
    let rest_ids: Vec<i64> = rest.items.iter().map(|v| v.id).collect();
    assert_eq!(rest_ids, ids[2..].to_vec());
    assert!(!rest.has_more);
}

// ---------------------------------------------------------------------------
// listComments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_thread_levels(pool: PgPool) {
    let u = user(&pool, "u").await;
    let v = video(&pool, u.id, "V", VideoType::Normal).await;
    let c1 = comment(&pool, v.id, u.id, "top", None).await.unwrap();
    let r1 = comment(&pool, v.id, u.id, "reply", Some(c1.id)).await.unwrap();

    let top = listing::list_comments(&pool, &urls(), v.id, None, None, None)
        .await
        .unwrap();
    assert_eq!(top.items.len(), 1);
    assert_eq!(top.items[0].id, c1.id);
    assert_eq!(top.items[0].reply_count, 1);

    let replies = listing::list_comments(&pool, &urls(), v.id, None, None, Some(c1.id))
        .await
        .unwrap();
    let ids: Vec<i64> = replies.items.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![r1.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_pages_survive_deletions(pool: PgPool) {
    let u = user(&pool, "u").await;
    let v = video(&pool, u.id, "V", VideoType::Normal).await;
    let mut ids = Vec::new();
    for i in 0..13 {
        ids.push(comment(&pool, v.id, u.id, &format!("c{i}"), None).await.unwrap().id);
    }
    ids.reverse();

    let first = listing::list_comments(&pool, &urls(), v.id, None, None, None)
        .await
        .unwrap();
    assert_eq!(first.items.len(), 10);
    assert!(first.has_more);
    assert_eq!(first.next_cursor, Some(ids[9]));

    // Delete rows already shown; the continuation is unaffected.
    for id in &ids[..3] {
        vidhub_db::repositories::CommentRepo::delete(&pool, *id)
            .await
            .unwrap();
    }

    let second = listing::list_comments(&pool, &urls(), v.id, None, first.next_cursor, None)
        .await
        .unwrap();
    let second_ids: Vec<i64> = second.items.iter().map(|c| c.id).collect();
    assert_eq!(second_ids, ids[10..].to_vec());
    assert!(!second.has_more);
    assert_eq!(second.next_cursor, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_is_liked_only_for_viewer(pool: PgPool) {
    let u = user(&pool, "u").await;
    let viewer = user(&pool, "viewer").await;
    let v = video(&pool, u.id, "V", VideoType::Normal).await;
    let c = comment(&pool, v.id, u.id, "hello", None).await.unwrap();
    LikeRepo::toggle(&pool, LikeKind::CommentLike, c.id, viewer.id)
        .await
        .unwrap();

    let as_viewer = listing::list_comments(&pool, &urls(), v.id, Some(viewer.id), None, None)
        .await
        .unwrap();
    assert!(as_viewer.items[0].is_liked);
    assert_eq!(as_viewer.items[0].like_count, 1);

    let anonymous = listing::list_comments(&pool, &urls(), v.id, None, None, None)
        .await
        .unwrap();
    assert!(!anonymous.items[0].is_liked);

    let author = listing::list_comments(&pool, &urls(), v.id, Some(u.id), None, None)
        .await
        .unwrap();
    assert!(!author.items[0].is_liked);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleted_cursor_comment_continues_by_id(pool: PgPool) {
    let u = user(&pool, "u").await;
    let v = video(&pool, u.id, "V", VideoType::Normal).await;
    let mut ids = Vec::new();
    for i in 0..13 {
        ids.push(comment(&pool, v.id, u.id, &format!("c{i}"), None).await.unwrap().id);
    }
    ids.reverse();

    let first = listing::list_comments(&pool, &urls(), v.id, None, None, None)
        .await
        .unwrap();
    let cursor = first.next_cursor.unwrap();
    assert!(vidhub_db::repositories::CommentRepo::delete(&pool, cursor)
        .await
        .unwrap());

    let second = listing::list_comments(&pool, &urls(), v.id, None, Some(cursor), None)
        .await
        .unwrap();
    let second_ids: Vec<i64> = second.items.iter().map(|c| c.id).collect();
    assert_eq!(second_ids, ids[10..].to_vec());
    assert!(!second.has_more);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_cursor_continues_below_its_id(pool: PgPool) {
    let u = user(&pool, "u").await;
    let v = video(&pool, u.id, "V", VideoType::Normal).await;
    let c = comment(&pool, v.id, u.id, "hello", None).await.unwrap();

    let page = listing::list_comments(&pool, &urls(), v.id, None, Some(c.id + 1000), None)
        .await
        .unwrap();
    let ids: Vec<i64> = page.items.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![c.id]);

    let page = listing::list_comments(&pool, &urls(), v.id, None, Some(c.id), None)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more);
}

// ---------------------------------------------------------------------------
// listPosts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_posts_carry_ordered_images_and_likes(pool: PgPool) {
    let admin = user(&pool, "admin").await;
    let viewer = user(&pool, "viewer").await;
    let older = PostRepo::create(
        &pool,
        &CreatePost {
            author_id: admin.id,
            content: "older".into(),
            image_keys: Vec::new(),
        },
    )
    .await
    .unwrap();
    let newer = PostRepo::create(
        &pool,
        &CreatePost {
            author_id: admin.id,
            content: "newer".into(),
            image_keys: vec!["posts/1-a-0.png".into(), "posts/1-b-1.jpg".into()],
        },
    )
    .await
    .unwrap();
    LikeRepo::toggle(&pool, LikeKind::PostLike, older.id, viewer.id)
        .await
        .unwrap();

    let page = listing::list_posts(&pool, &urls(), Some(viewer.id), None, 1)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, newer.id);
    assert_eq!(
        page.items[0].image_urls,
        vec![
            "https://cdn.test/posts/1-a-0.png".to_string(),
            "https://cdn.test/posts/1-b-1.jpg".to_string(),
        ]
    );
    assert!(!page.items[0].is_liked);
    assert_eq!(page.next_cursor, Some(newer.id));

    let rest = listing::list_posts(&pool, &urls(), Some(viewer.id), page.next_cursor, 1)
        .await
        .unwrap();
    assert_eq!(rest.items[0].id, older.id);
    assert!(rest.items[0].is_liked);
    assert_eq!(rest.items[0].like_count, 1);
    assert!(!rest.has_more);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleted_cursor_post_continues_by_id(pool: PgPool) {
    let admin = user(&pool, "admin").await;
    let mut ids = Vec::new();
    for i in 0..4 {
        let post = PostRepo::create(
            &pool,
            &CreatePost {
                author_id: admin.id,
                content: format!("p{i}"),
                image_keys: Vec::new(),
            },
        )
        .await
        .unwrap();
        ids.push(post.id);
    }
    ids.reverse();

    let first = listing::list_posts(&pool, &urls(), None, None, 2).await.unwrap();
    let cursor = first.next_cursor.unwrap();
    assert_eq!(cursor, ids[1]);
    PostRepo::delete(&pool, cursor).await.unwrap().unwrap();

    let rest = listing::list_posts(&pool, &urls(), None, Some(cursor), 2)
        .await
        .unwrap();
    let rest_ids: Vec<i64> = rest.items.iter().map(|p| p.id).collect();
    assert_eq!(rest_ids, ids[2..].to_vec());
    assert!(!rest.has_more);
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_video_detail_reports_viewer_state(pool: PgPool) {
    let u = user(&pool, "u").await;
    let viewer = user(&pool, "viewer").await;
    let v = video(&pool, u.id, "V", VideoType::Normal).await;
    LikeRepo::toggle(&pool, LikeKind::Favorite, v.id, viewer.id)
        .await
        .unwrap();

    let detail = listing::video_detail(&pool, &urls(), v.id, Some(viewer.id))
        .await
        .unwrap()
        .unwrap();
    assert!(detail.is_favorited);
    assert!(!detail.is_liked);
    assert_eq!(detail.favorite_count, 1);
    assert_eq!(detail.thumbnail_source, "stream");

    let missing = listing::video_detail(&pool, &urls(), v.id + 100, None)
        .await
        .unwrap();
    assert!(missing.is_none());
}
