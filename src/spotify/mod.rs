mod auth;
mod client;
mod models;

pub use auth::SpotifyAuthClient;
pub use client::SpotifyClient;
pub use models::*;

/// Failure while fetching from the remote catalog API. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
