//! Integration tests for the `/videos` resource.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    body_json, delete_auth, get, get_auth, json_auth, mp4_bytes, post_empty, post_json_auth,
    post_multipart_auth, seed_video, Part,
};
use serde_json::json;
use sqlx::PgPool;
use vidhub_cloud::memory::Poster;
use vidhub_cloud::{AssetState, AssetStatus};
use vidhub_core::roles::Role;
use vidhub_core::video::{VideoType, MAX_VIDEO_BYTES};

// ---------------------------------------------------------------------------
// Listing and search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_type_and_returns_a_single_page(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (uploader, _) = t.user("mod", Role::Moderator).await;
    let first = seed_video(&t.pool, uploader, "first", VideoType::Normal, "a-1").await;
    let second = seed_video(&t.pool, uploader, "second", VideoType::Normal, "a-2").await;
    let third = seed_video(&t.pool, uploader, "third", VideoType::Normal, "a-3").await;
    seed_video(&t.pool, uploader, "short", VideoType::Shorts, "a-4").await;

    let response = get(t.app(), "/api/v1/videos?type=normal&limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["success"], true);
    let items = json["data"]["items"].as_array().unwrap();
    let ids: Vec<i64> = items.iter().map(|v| v["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![third.id, second.id]);
    assert!(json["data"]["next_cursor"].is_null());
    assert_eq!(items[0]["uploader"]["name"], "mod");
    assert_eq!(
        items[0]["playback_url"],
        "https://stream.test/a-3/manifest/video.m3u8"
    );

    // The cursor row itself is never repeated.
    let response = get(
        t.app(),
        &format!("/api/v1/videos?type=normal&limit=2&cursor={}", second.id),
    )
    .await;
    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![first.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_with_bad_query_still_carries_an_empty_page(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/videos?sort=sideways").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;

    assert_eq!(json["success"], false);
    assert_eq!(json["items"], json!([]));
    assert_eq!(json["has_more"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_search_returns_empty_success(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (uploader, _) = t.user("mod", Role::Moderator).await;
    seed_video(&t.pool, uploader, "speedrun", VideoType::Normal, "a-1").await;

    let response = get(t.app(), "/api/v1/videos/search?q=%20%20").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["items"], json!([]));
    assert_eq!(json["data"]["has_more"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_paginates_by_views_with_over_fetch(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (uploader, _) = t.user("mod", Role::Moderator).await;
    let popular = seed_video(&t.pool, uploader, "Celeste any%", VideoType::Normal, "a-1").await;
    let quiet = seed_video(&t.pool, uploader, "Celeste 100%", VideoType::Normal, "a-2").await;
    seed_video(&t.pool, uploader, "Hollow Knight", VideoType::Normal, "a-3").await;

    for _ in 0..3 {
        let response = post_empty(
            t.app(),
            &format!("/api/v1/videos/{}/views", popular.id),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json = body_json(get(t.app(), "/api/v1/videos/search?q=celeste&limit=1").await).await;
    assert_eq!(json["data"]["query"], "celeste");
    assert_eq!(json["data"]["items"][0]["id"], popular.id);
    assert_eq!(json["data"]["items"][0]["view_count"], 3);
    assert_eq!(json["data"]["has_more"], true);
    let cursor = json["data"]["next_cursor"].as_str().unwrap().to_string();
    assert!(cursor.starts_with("3:"));
    assert!(cursor.ends_with(&format!(":{}", popular.id)));

    let json = body_json(
        get(
            t.app(),
            &format!("/api/v1/videos/search?q=celeste&limit=1&cursor={cursor}"),
        )
        .await,
    )
    .await;
    assert_eq!(json["data"]["items"][0]["id"], quiet.id);
    assert_eq!(json["data"]["has_more"], false);
    assert!(json["data"]["next_cursor"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_rejects_a_malformed_cursor(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/videos/search?q=celeste&cursor=42").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["items"], serde_json::json!([]));
    assert_eq!(json["has_more"], false);
}

// ---------------------------------------------------------------------------
// Detail and views
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn detail_reports_reactions_for_the_viewer_only(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (uploader, _) = t.user("mod", Role::Moderator).await;
    let (_, viewer_token) = t.user("fan", Role::Viewer).await;
    let video = seed_video(&t.pool, uploader, "run", VideoType::Normal, "a-1").await;

    let response = post_empty(
        t.app(),
        &format!("/api/v1/videos/{}/like", video.id),
        Some(&viewer_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/api/v1/videos/{}", video.id);
    let json = body_json(get_auth(t.app(), &uri, &viewer_token).await).await;
    assert_eq!(json["data"]["is_liked"], true);
    assert_eq!(json["data"]["is_favorited"], false);
    assert_eq!(json["data"]["like_count"], 1);
    assert_eq!(json["data"]["title"], "run");

    let json = body_json(get(t.app(), &uri).await).await;
    assert_eq!(json["data"]["is_liked"], false);
    assert_eq!(json["data"]["like_count"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_video_is_404(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/videos/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_empty(t.app(), "/api/v1/videos/999999/views", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_target_checks_role_and_size(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (_, viewer) = t.user("fan", Role::Viewer).await;
    let (_, moderator) = t.user("mod", Role::Moderator).await;
    let uri = "/api/v1/videos/upload-target";

    let response = post_json_auth(t.app(), uri, &viewer, json!({ "size_bytes": 1000 })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        t.app(),
        uri,
        &moderator,
        json!({ "size_bytes": MAX_VIDEO_BYTES + 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.transcoder.create_calls(), 0);

    let response = post_json_auth(t.app(), uri, &moderator, json!({ "size_bytes": 1000 })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["asset_id"], "asset-1");
    assert!(json["data"]["endpoint"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn multipart_publish_creates_a_playable_video(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (uploader, token) = t.user("mod", Role::Moderator).await;
    let bytes = mp4_bytes(3000);

    let response = post_multipart_auth(
        t.app(),
        "/api/v1/videos/publish",
        &token,
        vec![
            Part::Text("video_type", "normal"),
            Part::Text("title", "Any% in 12 minutes"),
            Part::Text("game_type", "platformer"),
            Part::Text("tags", "speedrun"),
            Part::Text("tags", "Speedrun"),
            Part::Text("thumbnail_timestamp", "30"),
            Part::File {
                name: "video",
                content_type: "video/mp4",
                bytes: bytes.clone(),
            },
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;

    assert_eq!(json["data"]["stream_uid"], "asset-1");
    assert_eq!(json["data"]["status"], "ready");
    assert_eq!(json["data"]["uploaded_by"], uploader);
    assert_eq!(json["data"]["tags"], json!(["speedrun"]));
    assert_eq!(json["data"]["thumbnail_timestamp"], 30.0);
    assert_eq!(t.transcoder.asset("asset-1").unwrap().received, bytes);

    let json = body_json(get(t.app(), "/api/v1/videos?type=normal").await).await;
    assert_eq!(json["data"]["items"][0]["title"], "Any% in 12 minutes");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn multipart_publish_requires_every_field(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (_, token) = t.user("mod", Role::Moderator).await;

    let response = post_multipart_auth(
        t.app(),
        "/api/v1/videos/publish",
        &token,
        vec![
            Part::Text("video_type", "normal"),
            Part::Text("title", "No file"),
            Part::Text("game_type", "platformer"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.transcoder.create_calls(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn viewers_cannot_publish(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (_, token) = t.user("fan", Role::Viewer).await;

    let response = post_multipart_auth(
        t.app(),
        "/api/v1/videos/publish",
        &token,
        vec![Part::File {
            name: "video",
            content_type: "video/mp4",
            bytes: mp4_bytes(100),
        }],
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(t.transcoder.create_calls(), 0);
}

async fn acquire_target(t: &common::TestApp, token: &str) -> String {
    let response = post_json_auth(
        t.app(),
        "/api/v1/videos/upload-target",
        token,
        json!({ "size_bytes": 1000 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["asset_id"].as_str().unwrap().to_string()
}

fn finalize_body(asset_id: &str) -> serde_json::Value {
    json!({
        "asset_id": asset_id,
        "video_type": "shorts",
        "title": "Wall clip",
        "game_type": "platformer",
        "tags": ["clip"],
        "thumbnail": { "source": "stream", "timestamp_secs": 5.0 }
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn finalize_persists_a_client_uploaded_asset(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (_, token) = t.user("mod", Role::Moderator).await;
    let asset_id = acquire_target(&t, &token).await;
    t.transcoder.set_status(
        &asset_id,
        AssetStatus {
            state: AssetState::Ready,
            duration_secs: Some(20.0),
            ready_to_stream: true,
        },
    );

    let response =
        post_json_auth(t.app(), "/api/v1/videos", &token, finalize_body(&asset_id)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["video_type"], "shorts");
    assert_eq!(json["data"]["duration_secs"], 20.0);

    let json = body_json(get(t.app(), "/api/v1/videos?type=shorts").await).await;
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn finalize_rejects_another_users_upload(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (_, owner) = t.user("owner", Role::Moderator).await;
    let (_, other) = t.user("other", Role::Moderator).await;
    let asset_id = acquire_target(&t, &owner).await;

    let response =
        post_json_auth(t.app(), "/api/v1/videos", &other, finalize_body(&asset_id)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response =
        post_json_auth(t.app(), "/api/v1/videos", &other, finalize_body("never-issued")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get(t.app(), "/api/v1/videos?type=shorts").await).await;
    assert!(json["data"]["items"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Edit and delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_the_owner_or_an_admin_edits_metadata(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (owner, owner_token) = t.user("owner", Role::Moderator).await;
    let (_, other_token) = t.user("other", Role::Moderator).await;
    let (_, admin_token) = t.user("admin", Role::Admin).await;
    let video = seed_video(&t.pool, owner, "old title", VideoType::Normal, "a-1").await;
    let uri = format!("/api/v1/videos/{}", video.id);

    let response = json_auth(
        t.app(),
        Method::PATCH,
        &uri,
        &other_token,
        json!({ "title": "hijacked" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = json_auth(
        t.app(),
        Method::PATCH,
        &uri,
        &owner_token,
        json!({ "title": "new title", "description": "" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "new title");
    assert!(json["data"]["description"].is_null());
    assert_eq!(json["data"]["game_type"], "platformer");

    let response = json_auth(
        t.app(),
        Method::PATCH,
        &uri,
        &admin_token,
        json!({ "tags": ["wr"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn thumbnail_can_move_to_another_frame(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (owner, token) = t.user("owner", Role::Moderator).await;
    let video = seed_video(&t.pool, owner, "run", VideoType::Normal, "uid-3").await;
    t.transcoder.register_asset(
        "uid-3",
        AssetStatus {
            state: AssetState::Ready,
            duration_secs: Some(30.0),
            ready_to_stream: true,
        },
    );

    let response = json_auth(
        t.app(),
        Method::PUT,
        &format!("/api/v1/videos/{}/thumbnail", video.id),
        &token,
        json!({ "source": "stream", "timestamp_secs": 12.5 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["thumbnail_source"], "stream");
    assert_eq!(json["data"]["thumbnail_timestamp"], 12.5);
    assert_eq!(
        t.transcoder.asset("uid-3").unwrap().poster,
        Some(Poster::Fraction(12.5 / 30.0))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_refresh_reads_the_transcoder(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (owner, token) = t.user("owner", Role::Moderator).await;
    let video = seed_video(&t.pool, owner, "run", VideoType::Normal, "uid-9").await;
    t.transcoder.register_asset(
        "uid-9",
        AssetStatus {
            state: AssetState::Error,
            duration_secs: None,
            ready_to_stream: false,
        },
    );

    let response = get_auth(
        t.app(),
        &format!("/api/v1/videos/{}/status", video.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "error");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_is_admin_only_and_removes_the_asset(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (owner, owner_token) = t.user("owner", Role::Moderator).await;
    let (_, admin_token) = t.user("admin", Role::Admin).await;
    let video = seed_video(&t.pool, owner, "run", VideoType::Normal, "uid-5").await;
    let uri = format!("/api/v1/videos/{}", video.id);

    let response = delete_auth(t.app(), &uri, &owner_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(t.app(), &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(t.transcoder.deleted_assets(), vec!["uid-5".to_string()]);

    let response = get(t.app(), &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_survives_a_failing_transcoder(pool: PgPool) {
    let t = common::build_test_app(pool);
    let (owner, _) = t.user("owner", Role::Moderator).await;
    let (_, admin_token) = t.user("admin", Role::Admin).await;
    let video = seed_video(&t.pool, owner, "run", VideoType::Normal, "uid-5").await;
    t.transcoder.fail_deletes(true);

    let uri = format!("/api/v1/videos/{}", video.id);
    let response = delete_auth(t.app(), &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(t.app(), &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
