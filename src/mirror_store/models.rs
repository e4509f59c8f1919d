//! Mirrored entity models.
//!
//! Rows are immutable once mirrored; the `New*` structs carry the payloads
//! the store turns into rows, keyed by Spotify ids rather than internal ids.

use serde::{Deserialize, Serialize};

/// Album type classification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlbumType {
    Album,
    Single,
    Compilation,
}

impl AlbumType {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "album" => AlbumType::Album,
            "single" => AlbumType::Single,
            "compilation" => AlbumType::Compilation,
            _ => AlbumType::Album, // Default fallback
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlbumType::Album => "album",
            AlbumType::Single => "single",
            AlbumType::Compilation => "compilation",
        }
    }
}

/// Granularity of an album release date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReleaseDatePrecision {
    Year,
    Month,
    Day,
}

impl ReleaseDatePrecision {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "year" => ReleaseDatePrecision::Year,
            "month" => ReleaseDatePrecision::Month,
            "day" => ReleaseDatePrecision::Day,
            _ => ReleaseDatePrecision::Day,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReleaseDatePrecision::Year => "year",
            ReleaseDatePrecision::Month => "month",
            ReleaseDatePrecision::Day => "day",
        }
    }
}

/// An image hosted on the Spotify CDN.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub spotify_id: String,
    pub name: String,
    pub duration_ms: i64,
    pub explicit: bool,
    pub is_playable: bool,
    pub is_local: bool,
    pub popularity: i64,
    pub preview_url: Option<String>,
    pub album_id: String,
    pub track_number: i64,
    pub uri: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub spotify_id: String,
    pub name: String,
    pub album_type: AlbumType,
    pub image: Option<Image>,
    pub label: Option<String>,
    pub popularity: i64,
    pub release_date: String,
    pub release_date_precision: ReleaseDatePrecision,
    pub total_tracks: i64,
    pub genres: Vec<String>,
    pub uri: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub id: String,
    pub spotify_id: String,
    pub name: String,
    pub href: Option<String>,
    pub image: Option<Image>,
    pub genres: Vec<String>,
    pub popularity: i64,
    pub uri: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub spotify_id: String,
    pub name: String,
    pub description: Option<String>,
    pub collaborative: bool,
    pub owner_id: Option<String>,
    pub image: Option<Image>,
    pub public: bool,
    pub uri: String,
}

/// A track joined with its album and all linked artists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackWithRelations {
    pub track: Track,
    pub album: Album,
    pub artists: Vec<Artist>,
}

/// An artist plus the locally mirrored tracks linked through track_artists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtistTracks {
    pub artist: Artist,
    pub tracks: Vec<Track>,
}

// =============================================================================
// Insert payloads
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTrack {
    pub spotify_id: String,
    pub name: String,
    pub duration_ms: i64,
    pub explicit: bool,
    pub is_playable: bool,
    pub is_local: bool,
    pub popularity: i64,
    pub preview_url: Option<String>,
    pub album_spotify_id: String,
    pub track_number: i64,
    pub uri: String,
    pub artist_spotify_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAlbum {
    pub spotify_id: String,
    pub name: String,
    pub album_type: AlbumType,
    pub image: Option<Image>,
    pub label: Option<String>,
    pub popularity: i64,
    pub release_date: String,
    pub release_date_precision: ReleaseDatePrecision,
    pub total_tracks: i64,
    pub genres: Vec<String>,
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewArtist {
    pub spotify_id: String,
    pub name: String,
    pub href: Option<String>,
    pub image: Option<Image>,
    pub genres: Vec<String>,
    pub popularity: i64,
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPlaylist {
    pub spotify_id: String,
    pub name: String,
    pub description: Option<String>,
    pub collaborative: bool,
    pub owner_id: Option<String>,
    pub image: Option<Image>,
    pub public: bool,
    pub uri: String,
}

/// Everything needed to mirror a set of tracks in one transaction.
///
/// Albums and artists are deduplicated by Spotify id; the store inserts the
/// complement of what already exists, then the tracks, then the join rows.
#[derive(Clone, Debug, Default)]
pub struct TrackGraph {
    pub tracks: Vec<NewTrack>,
    pub albums: Vec<NewAlbum>,
    pub artists: Vec<NewArtist>,
}

impl TrackGraph {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
