//! End-to-end tests for the HTTP routes
//!
//! Requests go through `dispatch` exactly as the server would route them,
//! against the in-memory store and a canned identity provider.

use bytes::Bytes;
use clap::Parser;
use http_body_util::BodyExt;
use hyper::header::{HeaderValue, AUTHORIZATION, COOKIE, LOCATION, SET_COOKIE};
use hyper::{HeaderMap, Method, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use myratingis_api::auth::{CodeExchanger, JwtValidator, Session};
use myratingis_api::db::schemas::{
    CommentDoc, PollDoc, ProfileDoc, ProfileUpdate, ProjectDoc, RatingDoc,
};
use myratingis_api::db::{FeedbackStore, InMemoryStore};
use myratingis_api::routes::BoxBody;
use myratingis_api::{dispatch, ApiError, AppState, Args};

const SECRET: &str = "integration-test-secret";
const SITE: &str = "https://mri.test";

#[derive(Default)]
struct CannedExchanger {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl CodeExchanger for CannedExchanger {
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Session, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if code == "good" && verifier == "v1" {
            Ok(Session {
                access_token: "acc-token".into(),
                refresh_token: "ref-token".into(),
                expires_in: 3600,
            })
        } else {
            Err(ApiError::Upstream("invalid grant".into()))
        }
    }
}

fn test_args() -> Args {
    Args::parse_from([
        "myratingis-api",
        "--jwt-secret",
        SECRET,
        "--site-url",
        SITE,
        "--og-service-url",
        "http://127.0.0.1:9",
        "--og-timeout-ms",
        "300",
    ])
}

fn test_state() -> (AppState, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(test_args(), store.clone(), "memory")
        .unwrap()
        .with_code_exchanger(Arc::new(CannedExchanger::default()));
    (state, store)
}

/// Store whose rating listings fail; everything else is in memory
struct UnavailableStore {
    inner: InMemoryStore,
}

#[async_trait::async_trait]
impl FeedbackStore for UnavailableStore {
    async fn get_project(&self, id: &str) -> Result<Option<ProjectDoc>, ApiError> {
        self.inner.get_project(id).await
    }
    async fn set_project_config(&self, id: &str, config: &Value) -> Result<(), ApiError> {
        self.inner.set_project_config(id, config).await
    }
    async fn ratings_for_project(&self, _id: &str) -> Result<Vec<RatingDoc>, ApiError> {
        Err(ApiError::Store("ratings collection unavailable".into()))
    }
    async fn polls_for_project(&self, id: &str) -> Result<Vec<PollDoc>, ApiError> {
        self.inner.polls_for_project(id).await
    }
    async fn comments_for_project(&self, id: &str) -> Result<Vec<CommentDoc>, ApiError> {
        self.inner.comments_for_project(id).await
    }
    async fn get_profile(&self, id: &str) -> Result<Option<ProfileDoc>, ApiError> {
        self.inner.get_profile(id).await
    }
    async fn profiles_by_ids(&self, ids: &[String]) -> Result<Vec<ProfileDoc>, ApiError> {
        self.inner.profiles_by_ids(ids).await
    }
    async fn upsert_profile(&self, id: &str, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.inner.upsert_profile(id, update).await
    }
    async fn guest_ratings(&self, _guest_id: &str) -> Result<Vec<RatingDoc>, ApiError> {
        Err(ApiError::Store("guest lookup timed out".into()))
    }
    async fn user_rating_for_project(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Option<RatingDoc>, ApiError> {
        self.inner.user_rating_for_project(project_id, user_id).await
    }
    async fn delete_rating(&self, id: &str) -> Result<(), ApiError> {
        self.inner.delete_rating(id).await
    }
    async fn reassign_rating(&self, id: &str, user_id: &str) -> Result<(), ApiError> {
        self.inner.reassign_rating(id, user_id).await
    }
    async fn reassign_guest_comments(&self, guest_id: &str, user_id: &str) -> Result<u64, ApiError> {
        self.inner.reassign_guest_comments(guest_id, user_id).await
    }
}

fn unavailable_state() -> (AppState, Arc<UnavailableStore>) {
    let store = Arc::new(UnavailableStore {
        inner: InMemoryStore::new(),
    });
    let state = AppState::new(test_args(), store.clone(), "memory").unwrap();
    (state, store)
}

fn token_for(user_id: &str) -> String {
    JwtValidator::new(SECRET.into(), "authenticated".into())
        .unwrap()
        .generate_token(user_id, None, 600)
        .unwrap()
}

fn bearer(user_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token_for(user_id))).unwrap(),
    );
    headers
}

fn session_cookie(user_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("mri-access-token={}", token_for(user_id))).unwrap(),
    );
    headers
}

async fn call(
    state: &AppState,
    method: Method,
    uri: &str,
    headers: &HeaderMap,
    body: Value,
) -> Response<BoxBody> {
    let (path, query) = match uri.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (uri, None),
    };
    let body = if body.is_null() {
        Bytes::new()
    } else {
        Bytes::from(body.to_string())
    };
    dispatch(state, &method, path, query, headers, body).await
}

async fn json_body(response: Response<BoxBody>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_claim_requires_bearer() {
    let (state, store) = test_state();
    let response = call(
        &state,
        Method::POST,
        "/api/auth/claim-ratings",
        &HeaderMap::new(),
        json!({ "guest_id": "g" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(json_body(response).await["error"].is_string());
    assert_eq!(store.mutation_count(), 0);
}

#[tokio::test]
async fn test_claim_requires_guest_id() {
    let (state, _store) = test_state();
    let response = call(
        &state,
        Method::POST,
        "/api/auth/claim-ratings",
        &bearer("user-1"),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_claim_merges_guest_history() {
    let (state, store) = test_state();
    store.insert_rating(RatingDoc::by_guest("g1", "p1", "guest-9", 4.0)).await;
    store.insert_rating(RatingDoc::by_guest("g2", "p2", "guest-9", 2.0)).await;
    store.insert_rating(RatingDoc::by_user("u2", "p2", "user-1", 5.0)).await;
    let mut comment = CommentDoc::new("c1", "p1", "nice", false);
    comment.guest_id = Some("guest-9".into());
    store.insert_comment(comment).await;

    let response = call(
        &state,
        Method::POST,
        "/api/auth/claim-ratings",
        &bearer("user-1"),
        json!({ "guest_id": "guest-9" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true, "merged_count": 2 }));

    let moved = store.rating("g1").await.unwrap();
    assert_eq!(moved.user_id.as_deref(), Some("user-1"));
    assert_eq!(moved.guest_id, None);
    assert!(store.rating("g2").await.is_none());
    assert_eq!(store.rating("u2").await.unwrap().score, 5.0);
    assert_eq!(store.comment("c1").await.unwrap().user_id.as_deref(), Some("user-1"));

    // Nothing left to claim
    let before = store.mutation_count();
    let again = call(
        &state,
        Method::POST,
        "/api/auth/claim-ratings",
        &bearer("user-1"),
        json!({ "guest_id": "guest-9" }),
    )
    .await;
    assert_eq!(json_body(again).await["merged_count"], 0);
    assert_eq!(store.mutation_count(), before);
}

#[tokio::test]
async fn test_feedback_report() {
    let (state, store) = test_state();
    store.insert_rating(RatingDoc::by_guest("a", "p1", "g", 5.0)).await;
    store.insert_rating(RatingDoc::by_user("b", "p1", "u1", 3.0)).await;
    store.insert_rating(RatingDoc::by_guest("c", "p1", "g2", 1.0)).await;
    store.insert_rating(RatingDoc::by_guest("other", "p2", "g", 5.0)).await;
    store.insert_poll(PollDoc::new("v1", "p1", "launch")).await;
    store.insert_poll(PollDoc::new("v2", "p1", "research")).await;
    store.insert_poll(PollDoc::new("v3", "p1", "needs_research")).await;
    store.insert_comment(CommentDoc::new("c1", "p1", "idea", true)).await;
    store
        .insert_profile(ProfileDoc {
            id: "u1".into(),
            expertise: myratingis_api::db::schemas::Expertise {
                fields: vec!["Design".into()],
            },
            ..Default::default()
        })
        .await;

    let response = call(
        &state,
        Method::GET,
        "/api/projects/p1/feedback-report",
        &HeaderMap::new(),
        Value::Null,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let stats = &body["stats"];
    assert_eq!(stats["michelinAvg"], 3.0);
    assert_eq!(stats["totalRatings"], 3);
    assert_eq!(stats["scoreDistribution"], json!([1, 0, 1, 0, 1]));
    assert_eq!(stats["topStickers"][0]["type"], "needs_research");
    assert_eq!(stats["topStickers"][0]["count"], 2);
    assert_eq!(stats["secretProposals"], 1);
    assert_eq!(stats["totalComments"], 1);
    assert_eq!(stats["expertiseDistribution"], json!({ "Design": 1 }));
}

#[tokio::test]
async fn test_feedback_report_rejects_other_methods() {
    let (state, _store) = test_state();
    let response = call(
        &state,
        Method::POST,
        "/api/projects/p1/feedback-report",
        &HeaderMap::new(),
        Value::Null,
    )
    .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_feedback_report_store_failure_is_not_partial() {
    let (state, store) = unavailable_state();
    store.inner.insert_poll(PollDoc::new("v1", "p1", "launch")).await;
    store.inner.insert_comment(CommentDoc::new("c1", "p1", "idea", true)).await;

    let response = call(
        &state,
        Method::GET,
        "/api/projects/p1/feedback-report",
        &HeaderMap::new(),
        Value::Null,
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({ "success": false, "error": "ratings collection unavailable" })
    );
    assert!(body.get("stats").is_none());
}

#[tokio::test]
async fn test_claim_store_failure_surfaces_message() {
    let (state, store) = unavailable_state();
    let mut comment = CommentDoc::new("c1", "p1", "hello", false);
    comment.guest_id = Some("guest-9".into());
    store.inner.insert_comment(comment).await;

    let response = call(
        &state,
        Method::POST,
        "/api/auth/claim-ratings",
        &bearer("user-1"),
        json!({ "guest_id": "guest-9" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "guest lookup timed out" })
    );

    // Listing failed before any row was touched
    assert_eq!(store.inner.mutation_count(), 0);
    assert_eq!(store.inner.comment("c1").await.unwrap().guest_id.as_deref(), Some("guest-9"));
}

#[tokio::test]
async fn test_feedback_report_decodes_project_id() {
    let (state, store) = test_state();
    store.insert_rating(RatingDoc::by_guest("a", "my project", "g", 4.0)).await;

    let response = call(
        &state,
        Method::GET,
        "/api/projects/my%20project/feedback-report",
        &HeaderMap::new(),
        Value::Null,
    )
    .await;
    assert_eq!(json_body(response).await["stats"]["totalRatings"], 1);
}

#[tokio::test]
async fn test_profile_round_trip() {
    let (state, store) = test_state();

    let unauthenticated = call(
        &state,
        Method::POST,
        "/api/user/profile",
        &HeaderMap::new(),
        json!({ "nickname": "kim" }),
    )
    .await;
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let saved = call(
        &state,
        Method::POST,
        "/api/user/profile",
        &session_cookie("user-1"),
        json!({ "id": "spoofed", "nickname": "kim", "occupation": "PM" }),
    )
    .await;
    assert_eq!(saved.status(), StatusCode::OK);
    assert_eq!(json_body(saved).await, json!({ "success": true }));

    let stored = store.get_profile("user-1").await.unwrap().unwrap();
    assert_eq!(stored.nickname, "kim");
    assert!(stored.expertise.fields.is_empty());
    assert!(store.get_profile("spoofed").await.unwrap().is_none());

    let fetched = call(
        &state,
        Method::GET,
        "/api/user/profile",
        &session_cookie("user-1"),
        Value::Null,
    )
    .await;
    let body = json_body(fetched).await;
    assert_eq!(body["profile"]["occupation"], "PM");
    assert_eq!(body["profile"]["expertise"], json!({ "fields": [] }));
}

#[tokio::test]
async fn test_custom_config_owner_only() {
    let (state, store) = test_state();
    store.insert_project(ProjectDoc::new("p1", "owner", "App")).await;

    let denied = call(
        &state,
        Method::PATCH,
        "/api/projects/p1/custom-config",
        &bearer("someone"),
        json!({ "audit_type": "deep" }),
    )
    .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let ok = call(
        &state,
        Method::PATCH,
        "/api/projects/p1/custom-config",
        &bearer("owner"),
        json!({ "audit_type": "deep" }),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(json_body(ok).await["custom_config"], json!({ "audit_type": "deep" }));
}

#[tokio::test]
async fn test_og_preview() {
    let (state, _store) = test_state();

    let missing = call(&state, Method::GET, "/api/og-preview", &HeaderMap::new(), Value::Null).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    // Preview service is unreachable: still 200 with empty fields
    let degraded = call(
        &state,
        Method::GET,
        "/api/og-preview?url=https%3A%2F%2Fexample.com",
        &HeaderMap::new(),
        Value::Null,
    )
    .await;
    assert_eq!(degraded.status(), StatusCode::OK);
    assert_eq!(
        json_body(degraded).await,
        json!({ "title": "", "description": "", "image": "", "screenshot": "" })
    );
}

#[tokio::test]
async fn test_auth_callback_redirects() {
    let (state, _store) = test_state();
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_static("mri-access-token-code-verifier=v1"));

    let missing_code = call(&state, Method::GET, "/auth/callback", &headers, Value::Null).await;
    assert_eq!(missing_code.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        missing_code.headers()[LOCATION],
        "https://mri.test/login?error=auth_callback_failed"
    );

    let bad_code =
        call(&state, Method::GET, "/auth/callback?code=bad", &headers, Value::Null).await;
    assert_eq!(
        bad_code.headers()[LOCATION],
        "https://mri.test/login?error=auth_callback_failed"
    );
    assert!(bad_code.headers().get(SET_COOKIE).is_none());

    let next = call(
        &state,
        Method::GET,
        "/auth/callback?code=good&next=%2Fprojects%2Fp1",
        &headers,
        Value::Null,
    )
    .await;
    assert_eq!(next.headers()[LOCATION], "https://mri.test/projects/p1");
    assert_eq!(next.headers().get_all(SET_COOKIE).iter().count(), 3);

    let recovery = call(
        &state,
        Method::GET,
        "/auth/callback?code=good&type=recovery&next=%2Fignored",
        &headers,
        Value::Null,
    )
    .await;
    assert_eq!(recovery.headers()[LOCATION], "https://mri.test/reset-password");

    let open_redirect = call(
        &state,
        Method::GET,
        "/auth/callback?code=good&next=%2F%2Fevil.test",
        &headers,
        Value::Null,
    )
    .await;
    assert_eq!(open_redirect.headers()[LOCATION], "https://mri.test/");
}

#[tokio::test]
async fn test_auth_callback_without_verifier_skips_exchange() {
    let exchanger = Arc::new(CannedExchanger::default());
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(test_args(), store, "memory")
        .unwrap()
        .with_code_exchanger(exchanger.clone());

    let response = call(
        &state,
        Method::GET,
        "/auth/callback?code=good",
        &HeaderMap::new(),
        Value::Null,
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[LOCATION],
        "https://mri.test/login?error=auth_callback_failed"
    );
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(exchanger.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_health_and_unknown_routes() {
    let (state, _store) = test_state();

    let health = call(&state, Method::GET, "/health", &HeaderMap::new(), Value::Null).await;
    assert_eq!(health.status(), StatusCode::OK);
    let body = json_body(health).await;
    assert_eq!(body["healthy"], true);
    assert_eq!(body["store"], "memory");

    let missing = call(&state, Method::GET, "/nope", &HeaderMap::new(), Value::Null).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let preflight =
        call(&state, Method::OPTIONS, "/api/user/profile", &HeaderMap::new(), Value::Null).await;
    assert_eq!(preflight.status(), StatusCode::NO_CONTENT);
}
