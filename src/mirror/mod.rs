//! Read-through mirroring of remote catalog entities.
//!
//! Every lookup checks the local mirror first. On a miss the entity is
//! fetched with a cached bearer token, inserted in a single transaction,
//! then re-read so callers always see the stored shape. A track miss also
//! fetches the full album and artist objects, because the refs embedded in
//! the track payload lack label, genres and popularity and mirrored rows
//! are never rewritten.

use crate::github::GithubError;
use crate::mirror_store::{
    ArtistTracks, Album, AlbumType, Artist, Image, MirrorStore, NewAlbum, NewArtist, NewPlaylist,
    NewTrack, Playlist, ReleaseDatePrecision, TrackGraph, TrackWithRelations,
};
use crate::spotify::{
    SpotifyAlbum, SpotifyArtist, SpotifyArtistRef, SpotifyClient, SpotifyImage, SpotifyPlaylist,
    SpotifyTrack, UpstreamError,
};
use crate::token_cache::TokenCache;
use anyhow::anyhow;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Failures surfaced by the mirror operations. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("could not obtain an upstream bearer token")]
    MissingToken,
    #[error("upstream fetch failed with status {status}: {message}")]
    UpstreamFetch { status: u16, message: String },
    #[error("storage failure: {0}")]
    Store(#[from] anyhow::Error),
    #[error("not found")]
    NotFound,
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, message } => ApiError::UpstreamFetch { status, message },
            UpstreamError::Transport(e) => ApiError::UpstreamFetch {
                status: 502,
                message: e.to_string(),
            },
        }
    }
}

impl From<GithubError> for ApiError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Status { status, message } => ApiError::UpstreamFetch { status, message },
            GithubError::Transport(e) => ApiError::UpstreamFetch {
                status: 502,
                message: e.to_string(),
            },
        }
    }
}

pub struct MirrorService {
    store: Arc<dyn MirrorStore>,
    spotify: SpotifyClient,
    token_cache: TokenCache,
}

impl MirrorService {
    pub fn new(store: Arc<dyn MirrorStore>, spotify: SpotifyClient, token_cache: TokenCache) -> Self {
        Self {
            store,
            spotify,
            token_cache,
        }
    }

    async fn bearer(&self) -> Result<String, ApiError> {
        self.token_cache.bearer_token().await.map_err(|err| {
            warn!("Failed to obtain bearer token: {:#}", err);
            ApiError::MissingToken
        })
    }

    /// Get a track with album and artists, mirroring it on a local miss.
    /// The miss fetches the track, its full album and each of its artists.
    pub async fn get_track(&self, spotify_id: &str) -> Result<TrackWithRelations, ApiError> {
        if let Some(track) = self.store.get_track(spotify_id)? {
            return Ok(track);
        }

        let token = self.bearer().await?;
        let remote = self.spotify.fetch_track(&token, spotify_id).await?;
        let graph = self.build_track_graph(&token, vec![remote]).await?;
        self.store.insert_track_graph(&graph)?;

        self.store
            .get_track(spotify_id)?
            .ok_or_else(|| ApiError::Store(anyhow!("Track {} missing after mirror", spotify_id)))
    }

    /// Batch lookup. Missing tracks are fetched one by one, completed with
    /// their full albums and artists and mirrored in a single transaction;
    /// ids the upstream does not know are dropped from the result.
    pub async fn get_tracks(
        &self,
        spotify_ids: &[String],
    ) -> Result<Vec<TrackWithRelations>, ApiError> {
        let local = self.store.get_tracks(spotify_ids)?;

        let present: HashSet<&str> = local.iter().map(|t| t.track.spotify_id.as_str()).collect();
        let mut missing: Vec<&String> = Vec::new();
        let mut requested = HashSet::new();
        for id in spotify_ids {
            if requested.insert(id.as_str()) && !present.contains(id.as_str()) {
                missing.push(id);
            }
        }

        if missing.is_empty() {
            return Ok(local);
        }

        let token = self.bearer().await?;
        let mut fetched = Vec::with_capacity(missing.len());
        for id in missing {
            match self.spotify.fetch_track(&token, id).await {
                Ok(track) => fetched.push(track),
                Err(UpstreamError::Status { status: 404, .. }) => {
                    debug!("Dropping unknown track id {} from batch", id);
                }
                Err(err) => return Err(err.into()),
            }
        }

        if !fetched.is_empty() {
            let graph = self.build_track_graph(&token, fetched).await?;
            self.store.insert_track_graph(&graph)?;
        }

        Ok(self.store.get_tracks(spotify_ids)?)
    }

    /// Build the transactional insert batch for a set of fetched tracks.
    /// Albums and artists not yet mirrored are fetched in full; ones that
    /// already have a row are carried as embedded refs so the store can map
    /// the track relations without another fetch.
    async fn build_track_graph(
        &self,
        token: &str,
        tracks: Vec<SpotifyTrack>,
    ) -> Result<TrackGraph, ApiError> {
        let mut graph = TrackGraph::default();
        let mut seen_albums = HashSet::new();
        let mut seen_artists = HashSet::new();

        for track in &tracks {
            if seen_albums.insert(track.album.id.clone()) {
                if self.store.get_album(&track.album.id)?.is_some() {
                    graph.albums.push(new_album(&track.album));
                } else {
                    let remote = self.spotify.fetch_album(token, &track.album.id).await?;
                    graph.albums.push(new_album(&remote));
                }
            }
            for artist in &track.artists {
                if seen_artists.insert(artist.id.clone()) {
                    if self.store.get_artist(&artist.id)?.is_some() {
                        graph.artists.push(new_artist_ref(artist));
                    } else {
                        let remote = self.spotify.fetch_artist(token, &artist.id).await?;
                        graph.artists.push(new_artist_full(&remote));
                    }
                }
            }
        }

        graph.tracks = tracks.into_iter().map(new_track).collect();
        Ok(graph)
    }

    pub async fn get_album(&self, spotify_id: &str) -> Result<Album, ApiError> {
        if let Some(album) = self.store.get_album(spotify_id)? {
            return Ok(album);
        }

        let token = self.bearer().await?;
        let remote = self.spotify.fetch_album(&token, spotify_id).await?;
        Ok(self.store.insert_album(&new_album(&remote))?)
    }

    pub async fn get_artist(&self, spotify_id: &str) -> Result<Artist, ApiError> {
        if let Some(artist) = self.store.get_artist(spotify_id)? {
            return Ok(artist);
        }

        let token = self.bearer().await?;
        let remote = self.spotify.fetch_artist(&token, spotify_id).await?;
        Ok(self.store.insert_artist(&new_artist_full(&remote))?)
    }

    pub async fn get_playlist(&self, spotify_id: &str) -> Result<Playlist, ApiError> {
        if let Some(playlist) = self.store.get_playlist(spotify_id)? {
            return Ok(playlist);
        }

        let token = self.bearer().await?;
        let remote = self.spotify.fetch_playlist(&token, spotify_id).await?;
        Ok(self.store.insert_playlist(&new_playlist(&remote))?)
    }

    /// Local-only: an artist that was never mirrored is a plain miss, there
    /// is no fetch fallback for the track listing.
    pub async fn get_artist_tracks(&self, spotify_id: &str) -> Result<ArtistTracks, ApiError> {
        self.store
            .get_artist_tracks(spotify_id)?
            .ok_or(ApiError::NotFound)
    }

    pub fn counts(&self) -> Result<crate::mirror_store::MirrorCounts, ApiError> {
        Ok(self.store.get_counts()?)
    }
}

// =============================================================================
// Remote payload conversion
// =============================================================================

fn largest_image(images: &[SpotifyImage]) -> Option<Image> {
    images
        .iter()
        .max_by_key(|i| i.width.unwrap_or(0))
        .map(|i| Image {
            url: i.url.clone(),
            width: i.width,
            height: i.height,
        })
}

fn new_album(album: &SpotifyAlbum) -> NewAlbum {
    NewAlbum {
        spotify_id: album.id.clone(),
        name: album.name.clone(),
        album_type: AlbumType::from_db_str(&album.album_type),
        image: largest_image(&album.images),
        label: album.label.clone(),
        popularity: album.popularity,
        release_date: album.release_date.clone(),
        release_date_precision: ReleaseDatePrecision::from_db_str(&album.release_date_precision),
        total_tracks: album.total_tracks,
        genres: album.genres.clone(),
        uri: album.uri.clone(),
    }
}

/// Simplified artist as embedded in a track payload. Only used for artists
/// that already have a mirrored row, so the missing fields are never stored.
fn new_artist_ref(artist: &SpotifyArtistRef) -> NewArtist {
    NewArtist {
        spotify_id: artist.id.clone(),
        name: artist.name.clone(),
        href: artist.href.clone(),
        image: None,
        genres: vec![],
        popularity: 0,
        uri: artist.uri.clone(),
    }
}

fn new_artist_full(artist: &SpotifyArtist) -> NewArtist {
    NewArtist {
        spotify_id: artist.id.clone(),
        name: artist.name.clone(),
        href: artist.href.clone(),
        image: largest_image(&artist.images),
        genres: artist.genres.clone(),
        popularity: artist.popularity,
        uri: artist.uri.clone(),
    }
}

fn new_playlist(playlist: &SpotifyPlaylist) -> NewPlaylist {
    NewPlaylist {
        spotify_id: playlist.id.clone(),
        name: playlist.name.clone(),
        description: playlist.description.clone(),
        collaborative: playlist.collaborative,
        owner_id: playlist.owner.as_ref().map(|o| o.id.clone()),
        image: largest_image(&playlist.images),
        public: playlist.public,
        uri: playlist.uri.clone(),
    }
}

fn new_track(track: SpotifyTrack) -> NewTrack {
    NewTrack {
        spotify_id: track.id,
        name: track.name,
        duration_ms: track.duration_ms,
        explicit: track.explicit,
        is_playable: track.is_playable,
        is_local: track.is_local,
        popularity: track.popularity,
        preview_url: track.preview_url,
        album_spotify_id: track.album.id,
        track_number: track.track_number,
        uri: track.uri,
        artist_spotify_ids: track.artists.into_iter().map(|a| a.id).collect(),
    }
}
