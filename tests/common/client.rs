//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all mirror-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Stats request failed")
    }

    /// GET /v1/catalog/track/{id}
    pub async fn get_track(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/catalog/track/{}", self.base_url, id))
            .send()
            .await
            .expect("Track request failed")
    }

    /// POST /v1/catalog/tracks
    pub async fn get_tracks(&self, ids: &[&str]) -> Response {
        self.client
            .post(format!("{}/v1/catalog/tracks", self.base_url))
            .json(&json!({ "ids": ids }))
            .send()
            .await
            .expect("Tracks request failed")
    }

    /// GET /v1/catalog/album/{id}
    pub async fn get_album(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/catalog/album/{}", self.base_url, id))
            .send()
            .await
            .expect("Album request failed")
    }

    /// GET /v1/catalog/artist/{id}
    pub async fn get_artist(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/catalog/artist/{}", self.base_url, id))
            .send()
            .await
            .expect("Artist request failed")
    }

    /// GET /v1/catalog/artist/{id}/tracks
    pub async fn get_artist_tracks(&self, id: &str) -> Response {
        self.client
            .get(format!(
                "{}/v1/catalog/artist/{}/tracks",
                self.base_url, id
            ))
            .send()
            .await
            .expect("Artist tracks request failed")
    }

    /// GET /v1/catalog/playlist/{id}
    pub async fn get_playlist(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/catalog/playlist/{}", self.base_url, id))
            .send()
            .await
            .expect("Playlist request failed")
    }

    /// GET /v1/repos
    pub async fn get_repos(&self) -> Response {
        self.client
            .get(format!("{}/v1/repos", self.base_url))
            .send()
            .await
            .expect("Repos request failed")
    }

    /// GET /v1/repos/{owner}/{repo}/languages
    pub async fn get_repo_languages(&self, owner: &str, repo: &str) -> Response {
        self.client
            .get(format!(
                "{}/v1/repos/{}/{}/languages",
                self.base_url, owner, repo
            ))
            .send()
            .await
            .expect("Repo languages request failed")
    }

    /// POST /v1/contact
    pub async fn send_contact(&self, email: &str) -> Response {
        self.client
            .post(format!("{}/v1/contact", self.base_url))
            .json(&json!({ "email": email }))
            .send()
            .await
            .expect("Contact request failed")
    }
}
