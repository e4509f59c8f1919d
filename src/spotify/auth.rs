//! OAuth token grants against the accounts service.

use super::models::TokenResponse;
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::time::Duration;

const AUTH_TIMEOUT_SEC: u64 = 10;

/// Client for the token endpoint. Both grants authenticate with HTTP Basic
/// auth built from the application credentials.
pub struct SpotifyAuthClient {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl SpotifyAuthClient {
    pub fn new(token_url: String, client_id: String, client_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(AUTH_TIMEOUT_SEC))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            token_url: token_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        }
    }

    fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64.encode(credentials))
    }

    /// Request a fresh access token via the client-credentials grant.
    pub async fn request_access_token(&self) -> Result<TokenResponse> {
        self.token_request(&[("grant_type", "client_credentials")])
            .await
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::AUTHORIZATION, self.basic_auth_header())
            .form(form)
            .send()
            .await
            .context("Failed to reach token endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Token endpoint returned status {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse token response")
    }
}
