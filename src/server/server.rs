use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::contact::{is_valid_email, ContactService};
use crate::github::GithubClient;
use crate::mirror::{ApiError, MirrorService};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub mirrored: crate::mirror_store::MirrorCounts,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingToken => StatusCode::BAD_GATEWAY,
            // A 404 from the upstream passes through, anything else is a
            // gateway failure
            ApiError::UpstreamFetch { status: 404, .. } => StatusCode::NOT_FOUND,
            ApiError::UpstreamFetch { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Deserialize, Debug)]
struct GetTracksBody {
    pub ids: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct ContactBody {
    pub email: String,
}

#[derive(Serialize)]
struct ContactResponse {
    pub sent: bool,
}

async fn home(State(state): State<ServerState>) -> Response {
    let mirrored = match state.mirror.counts() {
        Ok(counts) => counts,
        Err(err) => return err.into_response(),
    };
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        mirrored,
    };
    Json(stats).into_response()
}

async fn get_track(
    State(mirror): State<GuardedMirrorService>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(mirror.get_track(&id).await?).into_response())
}

async fn post_tracks(
    State(mirror): State<GuardedMirrorService>,
    Json(body): Json<GetTracksBody>,
) -> Result<Response, ApiError> {
    Ok(Json(mirror.get_tracks(&body.ids).await?).into_response())
}

async fn get_album(
    State(mirror): State<GuardedMirrorService>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(mirror.get_album(&id).await?).into_response())
}

async fn get_artist(
    State(mirror): State<GuardedMirrorService>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(mirror.get_artist(&id).await?).into_response())
}

async fn get_artist_tracks(
    State(mirror): State<GuardedMirrorService>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(mirror.get_artist_tracks(&id).await?).into_response())
}

async fn get_playlist(
    State(mirror): State<GuardedMirrorService>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(mirror.get_playlist(&id).await?).into_response())
}

async fn get_repos(State(github): State<GuardedGithubClient>) -> Result<Response, ApiError> {
    Ok(Json(github.fetch_repos().await?).into_response())
}

async fn get_repo_languages(
    State(github): State<GuardedGithubClient>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    Ok(Json(github.fetch_repo_languages(&owner, &repo).await?).into_response())
}

async fn post_contact(
    State(contact): State<GuardedContactService>,
    Json(body): Json<ContactBody>,
) -> Result<Response, ApiError> {
    if !is_valid_email(&body.email) {
        return Ok((StatusCode::BAD_REQUEST, "Invalid email address").into_response());
    }
    let sent = contact.send_contact(&body.email).await?;
    Ok(Json(ContactResponse { sent }).into_response())
}

pub fn make_app(
    config: ServerConfig,
    mirror: Arc<MirrorService>,
    contact: Arc<ContactService>,
    github: Arc<GithubClient>,
) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        mirror,
        contact,
        github,
        hash: env!("GIT_HASH").to_string(),
    };

    let catalog_routes: Router = Router::new()
        .route("/track/{id}", get(get_track))
        .route("/tracks", post(post_tracks))
        .route("/album/{id}", get(get_album))
        .route("/artist/{id}", get(get_artist))
        .route("/artist/{id}/tracks", get(get_artist_tracks))
        .route("/playlist/{id}", get(get_playlist))
        .with_state(state.clone());

    let contact_routes: Router = Router::new()
        .route("/", post(post_contact))
        .with_state(state.clone());

    let repo_routes: Router = Router::new()
        .route("/", get(get_repos))
        .route("/{owner}/{repo}/languages", get(get_repo_languages))
        .with_state(state.clone());

    let home_router: Router = Router::new().route("/", get(home)).with_state(state.clone());

    home_router
        .nest("/v1/catalog", catalog_routes)
        .nest("/v1/contact", contact_routes)
        .nest("/v1/repos", repo_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    mirror: Arc<MirrorService>,
    contact: Arc<ContactService>,
    github: Arc<GithubClient>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, mirror, contact, github);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
