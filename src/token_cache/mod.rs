//! Read-through cache for the upstream bearer token.
//!
//! The token lives in the state store with a TTL equal to the expiry the
//! token endpoint reports. There is no lock around refresh: two concurrent
//! misses may both hit the token endpoint, and the second write wins. Both
//! tokens are valid, so the race is harmless.

use crate::spotify::SpotifyAuthClient;
use crate::state_store::StateStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const TOKEN_KEY: &str = "spotify_token";
pub const REFRESH_TOKEN_KEY: &str = "spotify_refresh_token";

pub struct TokenCache {
    state_store: Arc<dyn StateStore>,
    auth: SpotifyAuthClient,
}

impl TokenCache {
    pub fn new(state_store: Arc<dyn StateStore>, auth: SpotifyAuthClient) -> Self {
        Self { state_store, auth }
    }

    /// Returns a valid bearer token, refreshing through the token endpoint
    /// when the cached one is absent or expired.
    pub async fn bearer_token(&self) -> Result<String> {
        if let Some(token) = self.state_store.get_state(TOKEN_KEY)? {
            return Ok(token);
        }

        let response = match self.state_store.get_state(REFRESH_TOKEN_KEY)? {
            Some(refresh_token) => {
                debug!("Cached token expired, using refresh token grant");
                self.auth.refresh_access_token(&refresh_token).await?
            }
            None => {
                debug!("Cached token expired, using client credentials grant");
                self.auth.request_access_token().await?
            }
        };

        if let Some(refresh_token) = &response.refresh_token {
            self.state_store
                .set_state(REFRESH_TOKEN_KEY, refresh_token, None)?;
        }
        self.state_store.set_state(
            TOKEN_KEY,
            &response.access_token,
            Some(Duration::from_secs(response.expires_in)),
        )?;

        Ok(response.access_token)
    }
}
