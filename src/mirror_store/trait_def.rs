//! Trait definition for mirror storage backends.

use super::models::*;
use anyhow::Result;

/// Read and write access to the local mirror of the remote catalog.
///
/// Lookups are keyed by Spotify id. Entities are immutable once mirrored;
/// the only mutable row is the per-sender email counter.
pub trait MirrorStore: Send + Sync {
    /// Get a track with its album and artists, or None if not mirrored.
    fn get_track(&self, spotify_id: &str) -> Result<Option<TrackWithRelations>>;

    /// Get all mirrored tracks among the given Spotify ids, joined with
    /// albums and artists. Ids with no local row are simply absent from
    /// the result.
    fn get_tracks(&self, spotify_ids: &[String]) -> Result<Vec<TrackWithRelations>>;

    fn get_album(&self, spotify_id: &str) -> Result<Option<Album>>;

    fn get_artist(&self, spotify_id: &str) -> Result<Option<Artist>>;

    fn get_playlist(&self, spotify_id: &str) -> Result<Option<Playlist>>;

    /// Get an artist plus the mirrored tracks linked through track_artists,
    /// or None if the artist itself is not mirrored.
    fn get_artist_tracks(&self, spotify_id: &str) -> Result<Option<ArtistTracks>>;

    /// Mirror a batch of tracks in a single transaction: insert the albums
    /// and artists that don't exist yet, then the missing tracks, then the
    /// track_artists and artist_albums join rows. All-or-nothing.
    fn insert_track_graph(&self, graph: &TrackGraph) -> Result<()>;

    /// Insert a single album if absent and return the stored row.
    fn insert_album(&self, album: &NewAlbum) -> Result<Album>;

    /// Insert a single artist if absent and return the stored row.
    fn insert_artist(&self, artist: &NewArtist) -> Result<Artist>;

    /// Insert a single playlist if absent and return the stored row.
    fn insert_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist>;

    /// Number of contact emails recorded for a sender, None if never seen.
    fn get_times_sent(&self, sender_email: &str) -> Result<Option<i64>>;

    /// Insert the sender with a count of 1, or increment the existing
    /// counter. Returns the new count.
    fn record_email_sent(&self, sender_email: &str) -> Result<i64>;

    /// Row counts for the stats endpoint.
    fn get_counts(&self) -> Result<MirrorCounts>;
}

#[derive(Clone, Copy, Debug, Default, serde::Serialize)]
pub struct MirrorCounts {
    pub tracks: i64,
    pub albums: i64,
    pub artists: i64,
    pub playlists: i64,
}
