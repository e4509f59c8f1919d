//! Payload shapes returned by the remote catalog API.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// Simplified artist object embedded in track and album payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtistRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub href: Option<String>,
    pub uri: String,
}

/// Full artist object from `/artists/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: i64,
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub id: String,
    pub name: String,
    pub album_type: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub popularity: i64,
    pub release_date: String,
    pub release_date_precision: String,
    pub total_tracks: i64,
    #[serde(default)]
    pub genres: Vec<String>,
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    pub duration_ms: i64,
    pub explicit: bool,
    #[serde(default = "default_true")]
    pub is_playable: bool,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub popularity: i64,
    #[serde(default)]
    pub preview_url: Option<String>,
    pub track_number: i64,
    pub uri: String,
    pub album: SpotifyAlbum,
    pub artists: Vec<SpotifyArtistRef>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistOwner {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub owner: Option<SpotifyPlaylistOwner>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    #[serde(default)]
    pub public: bool,
    pub uri: String,
}
