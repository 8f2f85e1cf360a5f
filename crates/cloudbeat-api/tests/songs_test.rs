//! Song ingestion and delivery integration tests.
//!
//! Run with: `cargo test -p cloudbeat-api --test songs_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use bytes::Bytes;
use cloudbeat_core::Credential;
use cloudbeat_db::SongRepository;
use cloudbeat_storage::SignedUrlResponse;
use helpers::auth::bearer;
use helpers::fixtures;
use helpers::storage::{RejectingSongRepository, StubBlobStore};
use helpers::{
    leftover_uploads, setup_test_app, setup_test_app_with_blobs, setup_test_app_with_songs,
    TestApp,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn audio_form(data: Vec<u8>, filename: &str, mime: &str) -> MultipartForm {
    let part = Part::bytes(Bytes::from(data))
        .file_name(filename)
        .mime_type(mime);
    MultipartForm::new().add_part("file", part)
}

async fn upload(app: &TestApp, user: &str, form: MultipartForm) -> axum_test::TestResponse {
    app.client()
        .post("/api/songs/")
        .add_header("Authorization", bearer(user))
        .multipart(form)
        .await
}

fn is_mss(duration: &str) -> bool {
    match duration.split_once(':') {
        Some((m, s)) => {
            !m.is_empty()
                && m.chars().all(|c| c.is_ascii_digit())
                && s.len() == 2
                && s.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

#[tokio::test]
async fn test_upload_mp3_records_metadata() {
    let app = setup_test_app().await;

    let form = audio_form(fixtures::three_minute_mp3(), "song.mp3", "audio/mpeg")
        .add_text("title", "Intro")
        .add_text("artist", "Band");
    let response = upload(&app, "u-123", form).await;
    response.assert_status_ok();

    let song: Value = response.json();
    assert_eq!(song["title"], "Intro");
    assert_eq!(song["artist"], "Band");
    assert_eq!(song["album"], "Unknown Album");
    assert_eq!(song["duration"], "3:00");
    assert_eq!(song["mime_type"], "audio/mpeg");
    assert_eq!(song["user_id"], "u-123");
    assert_eq!(song["is_favourite"], false);

    let key = song["drive_id"].as_str().unwrap();
    assert!(key.starts_with("u-123/"), "{}", key);
    assert!(key.ends_with("_song.mp3"), "{}", key);
    assert!(app.bucket_dir().join(key).exists());
    assert_eq!(leftover_uploads(&app), 0);
}

#[tokio::test]
async fn test_upload_defaults_title_to_filename() {
    let app = setup_test_app().await;

    let form = audio_form(fixtures::wav(8000, 1, 75), "take two.wav", "audio/wav")
        .add_text("title", "   ");
    let response = upload(&app, "u-1", form).await;
    response.assert_status_ok();

    let song: Value = response.json();
    assert_eq!(song["title"], "take two.wav");
    assert_eq!(song["artist"], "Unknown Artist");
    assert_eq!(song["duration"], "1:15");
    assert!(song["drive_id"].as_str().unwrap().ends_with("_take_two.wav"));
}

#[tokio::test]
async fn test_unparseable_audio_gets_zero_duration() {
    let app = setup_test_app().await;

    let response = upload(
        &app,
        "u-1",
        audio_form(fixtures::garbage(), "notes.mp3", "audio/mpeg"),
    )
    .await;
    response.assert_status_ok();

    let song: Value = response.json();
    assert_eq!(song["duration"], "0:00");
    assert!(is_mss(song["duration"].as_str().unwrap()));
}

#[tokio::test]
async fn test_identical_uploads_are_not_deduplicated() {
    let app = setup_test_app().await;

    let first: Value = upload(&app, "u-1", audio_form(fixtures::garbage(), "a.mp3", "audio/mpeg"))
        .await
        .json();
    // Keys carry a seconds timestamp; make sure the second upload lands in a new second.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let second: Value = upload(&app, "u-1", audio_form(fixtures::garbage(), "a.mp3", "audio/mpeg"))
        .await
        .json();

    assert_ne!(first["id"], second["id"]);
    assert_ne!(first["drive_id"], second["drive_id"]);
    assert_eq!(app.songs.len().await, 2);
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let app = setup_test_app().await;

    let response = upload(&app, "u-1", MultipartForm::new().add_text("title", "x")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No file part in the request");
    assert!(app.songs.is_empty().await);
}

#[tokio::test]
async fn test_upload_with_empty_filename() {
    let app = setup_test_app().await;

    let response = upload(&app, "u-1", audio_form(fixtures::garbage(), "", "audio/mpeg")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No selected file");
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = setup_test_app().await;
    let max = app.state.config.max_upload_size_bytes;

    let response = upload(
        &app,
        "u-1",
        audio_form(vec![0u8; max + 1], "big.wav", "audio/wav"),
    )
    .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.songs.is_empty().await);
    assert_eq!(leftover_uploads(&app), 0);
}

#[tokio::test]
async fn test_storage_failure_writes_no_row() {
    let app = setup_test_app_with_blobs(Arc::new(StubBlobStore::failing_uploads())).await;

    let response = upload(
        &app,
        "u-123",
        audio_form(fixtures::three_minute_mp3(), "song.mp3", "audio/mpeg"),
    )
    .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["code"], "STORAGE_WRITE_FAILED");
    assert_eq!(body["error"], "bucket unavailable");
    assert!(app.songs.is_empty().await);
    assert_eq!(leftover_uploads(&app), 0);
}

#[tokio::test]
async fn test_catalog_failure_keeps_uploaded_blob() {
    let songs = RejectingSongRepository::default();
    let app = setup_test_app_with_songs(Arc::new(songs.clone())).await;

    let response = upload(
        &app,
        "u-123",
        audio_form(fixtures::three_minute_mp3(), "song.mp3", "audio/mpeg"),
    )
    .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert_eq!(body["error"], "Database returned 503: catalog unavailable");
    assert!(songs.inner.is_empty().await);

    let blobs: Vec<_> = std::fs::read_dir(app.bucket_dir().join("u-123"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(blobs.len(), 1);
    assert!(blobs[0].ends_with("_song.mp3"), "{}", blobs[0]);
    assert_eq!(leftover_uploads(&app), 0);
}

#[tokio::test]
async fn test_list_only_returns_callers_songs_newest_first() {
    let app = setup_test_app().await;

    for name in ["one.mp3", "two.mp3"] {
        upload(&app, "alice", audio_form(fixtures::garbage(), name, "audio/mpeg"))
            .await
            .assert_status_ok();
    }
    upload(&app, "bob", audio_form(fixtures::garbage(), "bob.mp3", "audio/mpeg"))
        .await
        .assert_status_ok();

    let response = app
        .client()
        .get("/api/songs")
        .add_header("Authorization", bearer("alice"))
        .await;
    response.assert_status_ok();

    let songs: Vec<Value> = response.json();
    assert_eq!(songs.len(), 2);
    assert!(songs.iter().all(|s| s["user_id"] == "alice"));
    assert_eq!(songs[0]["title"], "two.mp3");
    assert_eq!(songs[1]["title"], "one.mp3");
}

#[tokio::test]
async fn test_favourite_toggle_is_an_involution() {
    let app = setup_test_app().await;
    let song: Value = upload(&app, "u-1", audio_form(fixtures::garbage(), "a.mp3", "audio/mpeg"))
        .await
        .json();
    let path = format!("/api/songs/{}/favourite", song["id"].as_str().unwrap());

    let once: Value = app
        .client()
        .post(&path)
        .add_header("Authorization", bearer("u-1"))
        .await
        .json();
    assert_eq!(once["is_favourite"], true);

    let twice: Value = app
        .client()
        .post(&path)
        .add_header("Authorization", bearer("u-1"))
        .await
        .json();
    assert_eq!(twice["is_favourite"], false);
}

#[tokio::test]
async fn test_favourite_on_foreign_song_is_not_found() {
    let app = setup_test_app().await;
    let song: Value = upload(&app, "alice", audio_form(fixtures::garbage(), "a.mp3", "audio/mpeg"))
        .await
        .json();

    let response = app
        .client()
        .post(&format!("/api/songs/{}/favourite", song["id"].as_str().unwrap()))
        .add_header("Authorization", bearer("bob"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let stored = app
        .songs
        .find(song["id"].as_str().unwrap(), &Credential::Service)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_favourite);
}

#[tokio::test]
async fn test_signed_url_serves_the_blob() {
    let app = setup_test_app().await;
    let audio = fixtures::three_minute_mp3();
    let song: Value = upload(&app, "u-1", audio_form(audio.clone(), "song.mp3", "audio/mpeg"))
        .await
        .json();

    let response = app
        .client()
        .get(&format!("/api/songs/{}/url", song["id"].as_str().unwrap()))
        .add_header("Authorization", bearer("u-1"))
        .await;
    response.assert_status_ok();

    let url = response.json::<Value>()["url"].as_str().unwrap().to_string();
    let path = url
        .strip_prefix(helpers::BASE_URL)
        .expect("signed URL points at the gateway");
    assert!(path.starts_with("/files/u-1/"));
    assert!(path.contains("token="));

    let file = app.client().get(path).await;
    file.assert_status_ok();
    assert_eq!(file.as_bytes().as_ref(), audio.as_slice());
}

#[tokio::test]
async fn test_signed_url_for_unknown_song() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/songs/999/url")
        .add_header("Authorization", bearer("u-1"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Song not found");
}

#[tokio::test]
async fn test_signed_url_for_foreign_song_is_not_found() {
    let app = setup_test_app().await;
    let song: Value = upload(&app, "alice", audio_form(fixtures::garbage(), "a.mp3", "audio/mpeg"))
        .await
        .json();

    let response = app
        .client()
        .get(&format!("/api/songs/{}/url", song["id"].as_str().unwrap()))
        .add_header("Authorization", bearer("bob"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Song not found");
    assert!(body.get("url").is_none());
}

#[tokio::test]
async fn test_public_file_rejects_bad_token() {
    let app = setup_test_app().await;
    upload(&app, "u-1", audio_form(fixtures::garbage(), "a.mp3", "audio/mpeg"))
        .await
        .assert_status_ok();

    let response = app.client().get("/files/u-1/1_a.mp3?token=forged").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signing_error_is_upstream_failure() {
    let stub = StubBlobStore::signing(SignedUrlResponse::Upstream(
        "not_found: Object not found".to_string(),
    ));
    let app = setup_test_app_with_blobs(Arc::new(stub)).await;
    let song: Value = upload(&app, "u-1", audio_form(fixtures::garbage(), "a.mp3", "audio/mpeg"))
        .await
        .json();

    let response = app
        .client()
        .get(&format!("/api/songs/{}/url", song["id"].as_str().unwrap()))
        .add_header("Authorization", bearer("u-1"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert_eq!(body["error"], "not_found: Object not found");
}

#[tokio::test]
async fn test_malformed_signing_response_is_upstream_failure() {
    let stub = StubBlobStore::signing(SignedUrlResponse::Malformed(json!({"data": null})));
    let app = setup_test_app_with_blobs(Arc::new(stub)).await;
    let song: Value = upload(&app, "u-1", audio_form(fixtures::garbage(), "a.mp3", "audio/mpeg"))
        .await
        .json();

    let response = app
        .client()
        .get(&format!("/api/songs/{}/url", song["id"].as_str().unwrap()))
        .add_header("Authorization", bearer("u-1"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}
