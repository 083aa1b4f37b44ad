use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use practice_services::{
    ApiConfig, ApiError, AuthSession, Credentials, HttpPracticeApi, PracticeApi,
};

#[derive(Clone, Default)]
struct Backend {
    set_calls: Arc<AtomicUsize>,
    refresh_calls: Arc<AtomicUsize>,
    /// Reject every request, even with a refreshed token.
    always_unauthorized: bool,
    /// Answer every request with a server error.
    broken: bool,
}

async fn sets(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.set_calls.fetch_add(1, Ordering::SeqCst);
    if backend.broken {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "boom"}))).into_response();
    }
    let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if backend.always_unauthorized || bearer != Some("Bearer fresh") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([
        {"video_id": "v1", "type": "novice", "title": "Day One", "questionCount": 3, "progress": 0}
    ]))
    .into_response()
}

async fn refresh(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if body["refresh"] == "good-refresh" {
        Json(json!({"access": "fresh"})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "token invalid"}))).into_response()
    }
}

async fn serve(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/practice/sets/", get(sets))
        .route("/api/auth/refresh/", post(refresh))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn client(base_url: String, refresh: &str) -> (HttpPracticeApi, AuthSession) {
    let auth = AuthSession::in_memory(Some(Credentials {
        access: "stale".into(),
        refresh: refresh.into(),
    }));
    let api = HttpPracticeApi::new(ApiConfig::new(base_url), auth.clone()).unwrap();
    (api, auth)
}

#[tokio::test]
async fn stale_token_is_refreshed_once_and_replayed() {
    let backend = Backend::default();
    let (api, auth) = client(serve(backend.clone()).await, "good-refresh");

    let sets = api.fetch_practice_sets().await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.set_calls.load(Ordering::SeqCst), 2);
    assert_eq!(auth.access_token().as_deref(), Some("fresh"));
    assert_eq!(auth.refresh_token().as_deref(), Some("good-refresh"));

    api.fetch_practice_sets().await.unwrap();
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_refresh_clears_credentials() {
    let backend = Backend::default();
    let (api, auth) = client(serve(backend.clone()).await, "revoked");

    let err = api.fetch_practice_sets().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthExpired));
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn second_unauthorized_gives_up_and_signs_out() {
    let backend = Backend {
        always_unauthorized: true,
        ..Backend::default()
    };
    let (api, auth) = client(serve(backend.clone()).await, "good-refresh");

    let err = api.fetch_practice_sets().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthExpired));
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.set_calls.load(Ordering::SeqCst), 2);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn server_error_is_neither_refreshed_nor_replayed() {
    let backend = Backend {
        broken: true,
        ..Backend::default()
    };
    let (api, auth) = client(serve(backend.clone()).await, "good-refresh");

    let err = api.fetch_practice_sets().await.unwrap_err();
    match err {
        ApiError::HttpStatus { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message.as_deref(), Some("boom"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.set_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn missing_transcript_reads_as_none() {
    let backend = Backend::default();
    let (api, _auth) = client(serve(backend).await, "good-refresh");
    let transcript = api
        .fetch_transcript(&practice_core::model::VideoId::new("nope"))
        .await;
    assert!(transcript.is_none());
}
