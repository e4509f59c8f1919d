//! Mock upstream services
//!
//! A single axum server standing in for the remote catalog API, its token
//! endpoint, the GitHub API and the email provider. Fixtures are keyed by
//! resource type and id; every endpoint keeps a request counter so tests can
//! assert exactly how much upstream traffic an operation caused.

use super::constants::*;
use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct UpstreamCounters {
    pub token_requests: AtomicUsize,
    pub client_credentials_grants: AtomicUsize,
    pub refresh_grants: AtomicUsize,
    pub track_fetches: AtomicUsize,
    pub album_fetches: AtomicUsize,
    pub artist_fetches: AtomicUsize,
    pub playlist_fetches: AtomicUsize,
    pub repo_list_fetches: AtomicUsize,
    pub language_fetches: AtomicUsize,
    pub emails_accepted: AtomicUsize,
}

#[derive(Clone)]
struct UpstreamState {
    counters: Arc<UpstreamCounters>,
    fixtures: Arc<Mutex<HashMap<(String, String), Value>>>,
    repos: Arc<Mutex<Vec<Value>>>,
    fail_emails: Arc<AtomicBool>,
    token_expires_in: Arc<AtomicU64>,
    issued_refresh_token: Arc<Mutex<Option<String>>>,
    last_refresh_token: Arc<Mutex<Option<String>>>,
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

async fn token(State(state): State<UpstreamState>, Form(form): Form<TokenForm>) -> Json<Value> {
    let n = state.counters.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
    match form.grant_type.as_str() {
        "refresh_token" => {
            state.counters.refresh_grants.fetch_add(1, Ordering::SeqCst);
            *state.last_refresh_token.lock().unwrap() = form.refresh_token;
        }
        _ => {
            state
                .counters
                .client_credentials_grants
                .fetch_add(1, Ordering::SeqCst);
        }
    }

    let mut body = json!({
        "access_token": format!("test-token-{}", n),
        "token_type": "Bearer",
        "expires_in": state.token_expires_in.load(Ordering::SeqCst),
    });
    if let Some(refresh_token) = state.issued_refresh_token.lock().unwrap().as_ref() {
        body["refresh_token"] = json!(refresh_token);
    }
    Json(body)
}

fn lookup(state: &UpstreamState, resource: &str, id: &str, counter: &AtomicUsize) -> Response {
    counter.fetch_add(1, Ordering::SeqCst);
    let fixtures = state.fixtures.lock().unwrap();
    match fixtures.get(&(resource.to_string(), id.to_string())) {
        Some(value) => Json(value.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            format!("{} {} not found", resource, id),
        )
            .into_response(),
    }
}

async fn get_track(State(state): State<UpstreamState>, Path(id): Path<String>) -> Response {
    lookup(&state, "tracks", &id, &state.counters.track_fetches)
}

async fn get_album(State(state): State<UpstreamState>, Path(id): Path<String>) -> Response {
    lookup(&state, "albums", &id, &state.counters.album_fetches)
}

async fn get_artist(State(state): State<UpstreamState>, Path(id): Path<String>) -> Response {
    lookup(&state, "artists", &id, &state.counters.artist_fetches)
}

async fn get_playlist(State(state): State<UpstreamState>, Path(id): Path<String>) -> Response {
    lookup(&state, "playlists", &id, &state.counters.playlist_fetches)
}

async fn get_user_repos(State(state): State<UpstreamState>) -> Json<Value> {
    state
        .counters
        .repo_list_fetches
        .fetch_add(1, Ordering::SeqCst);
    Json(Value::Array(state.repos.lock().unwrap().clone()))
}

async fn get_repo_languages(
    State(state): State<UpstreamState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    lookup(
        &state,
        "languages",
        &format!("{}/{}", owner, repo),
        &state.counters.language_fetches,
    )
}

async fn post_email(State(state): State<UpstreamState>) -> Response {
    if state.fail_emails.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "provider down").into_response();
    }
    state.counters.emails_accepted.fetch_add(1, Ordering::SeqCst);
    Json(json!({"id": "email-1"})).into_response()
}

/// Mock upstream instance bound to a random local port.
///
/// When dropped, the server shuts down and the port is released.
pub struct MockUpstream {
    pub base_url: String,
    pub counters: Arc<UpstreamCounters>,
    fixtures: Arc<Mutex<HashMap<(String, String), Value>>>,
    repos: Arc<Mutex<Vec<Value>>>,
    fail_emails: Arc<AtomicBool>,
    token_expires_in: Arc<AtomicU64>,
    issued_refresh_token: Arc<Mutex<Option<String>>>,
    last_refresh_token: Arc<Mutex<Option<String>>>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockUpstream {
    pub async fn spawn() -> Self {
        let state = UpstreamState {
            counters: Arc::new(UpstreamCounters::default()),
            fixtures: Arc::new(Mutex::new(HashMap::new())),
            repos: Arc::new(Mutex::new(Vec::new())),
            fail_emails: Arc::new(AtomicBool::new(false)),
            token_expires_in: Arc::new(AtomicU64::new(TOKEN_EXPIRES_IN_SEC)),
            issued_refresh_token: Arc::new(Mutex::new(None)),
            last_refresh_token: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/tracks/{id}", get(get_track))
            .route("/v1/albums/{id}", get(get_album))
            .route("/v1/artists/{id}", get(get_artist))
            .route("/v1/playlists/{id}", get(get_playlist))
            .route("/user/repos", get(get_user_repos))
            .route("/repos/{owner}/{repo}/languages", get(get_repo_languages))
            .route("/emails", post(post_email))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock upstream port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock upstream failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            counters: state.counters,
            fixtures: state.fixtures,
            repos: state.repos,
            fail_emails: state.fail_emails,
            token_expires_in: state.token_expires_in,
            issued_refresh_token: state.issued_refresh_token,
            last_refresh_token: state.last_refresh_token,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.base_url)
    }

    pub fn api_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    pub fn email_api_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn github_api_url(&self) -> String {
        self.base_url.clone()
    }

    fn add(&self, resource: &str, payload: Value) {
        let id = payload["id"]
            .as_str()
            .expect("Fixture payload must have an id")
            .to_string();
        self.fixtures
            .lock()
            .unwrap()
            .insert((resource.to_string(), id), payload);
    }

    pub fn add_track(&self, payload: Value) {
        self.add("tracks", payload);
    }

    pub fn add_album(&self, payload: Value) {
        self.add("albums", payload);
    }

    pub fn add_artist(&self, payload: Value) {
        self.add("artists", payload);
    }

    pub fn add_playlist(&self, payload: Value) {
        self.add("playlists", payload);
    }

    pub fn add_repo(&self, payload: Value) {
        self.repos.lock().unwrap().push(payload);
    }

    pub fn add_repo_languages(&self, owner: &str, repo: &str, payload: Value) {
        self.fixtures
            .lock()
            .unwrap()
            .insert(("languages".to_string(), format!("{}/{}", owner, repo)), payload);
    }

    pub fn set_fail_emails(&self, fail: bool) {
        self.fail_emails.store(fail, Ordering::SeqCst);
    }

    pub fn set_token_expires_in(&self, seconds: u64) {
        self.token_expires_in.store(seconds, Ordering::SeqCst);
    }

    /// Makes every token grant response include this refresh token.
    pub fn set_issued_refresh_token(&self, refresh_token: &str) {
        *self.issued_refresh_token.lock().unwrap() = Some(refresh_token.to_string());
    }

    /// The refresh token sent with the most recent refresh grant.
    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
