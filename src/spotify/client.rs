//! HTTP client for the remote catalog API.
//!
//! One GET per resource, bearer auth, no retries. A non-2xx answer is
//! surfaced as `UpstreamError::Status` with whatever body the API returned.

use super::models::{SpotifyAlbum, SpotifyArtist, SpotifyPlaylist, SpotifyTrack};
use super::UpstreamError;
use serde::de::DeserializeOwned;
use std::time::Duration;

const FETCH_TIMEOUT_SEC: u64 = 30;

pub struct SpotifyClient {
    client: reqwest::Client,
    base_url: String,
}

impl SpotifyClient {
    /// `base_url` points at the API root, e.g. "https://api.spotify.com/v1".
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SEC))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_track(&self, token: &str, id: &str) -> Result<SpotifyTrack, UpstreamError> {
        self.fetch(token, "tracks", id).await
    }

    pub async fn fetch_album(&self, token: &str, id: &str) -> Result<SpotifyAlbum, UpstreamError> {
        self.fetch(token, "albums", id).await
    }

    pub async fn fetch_artist(&self, token: &str, id: &str) -> Result<SpotifyArtist, UpstreamError> {
        self.fetch(token, "artists", id).await
    }

    pub async fn fetch_playlist(
        &self,
        token: &str,
        id: &str,
    ) -> Result<SpotifyPlaylist, UpstreamError> {
        self.fetch(token, "playlists", id).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        token: &str,
        resource: &str,
        id: &str,
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}/{}", self.base_url, resource, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
