//! SQLite-backed mirror store.
//!
//! One write connection serializes mirror transactions, a round-robin pool of
//! read-only connections serves lookups. WAL mode keeps readers unblocked.

use super::models::*;
use super::schema::MIRROR_VERSIONED_SCHEMAS;
use super::trait_def::{MirrorCounts, MirrorStore};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, types::Type, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

const DEFAULT_READ_POOL_SIZE: usize = 4;

#[derive(Clone)]
pub struct SqliteMirrorStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = MIRROR_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &MIRROR_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating mirror db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        bail!("Mirror database has no schema version, refusing to open");
    }

    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in MIRROR_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating mirror db from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
                current_version = schema.version;
            }
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema.validate(conn)?;
    Ok(())
}

impl SqliteMirrorStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::with_read_pool_size(db_path, DEFAULT_READ_POOL_SIZE)
    }

    pub fn with_read_pool_size<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open mirror database")?;

        migrate_if_needed(&mut write_conn)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;

        let track_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get(0))
            .unwrap_or(0);
        let album_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM albums", [], |r| r.get(0))
            .unwrap_or(0);
        let artist_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))
            .unwrap_or(0);

        info!(
            "Opened mirror db: {} tracks, {} albums, {} artists",
            track_count, album_count, artist_count
        );

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteMirrorStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    // =========================================================================
    // Row parsing
    // =========================================================================

    fn parse_genres(index: usize, raw: String) -> rusqlite::Result<Vec<String>> {
        serde_json::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
    }

    fn parse_image(
        url: Option<String>,
        width: Option<i64>,
        height: Option<i64>,
    ) -> Option<Image> {
        url.map(|url| Image { url, width, height })
    }

    const TRACK_COLUMNS: &'static str = "id, spotify_id, name, duration_ms, explicit, \
         is_playable, is_local, popularity, preview_url, album_id, track_number, uri";

    fn parse_track_row(row: &rusqlite::Row) -> rusqlite::Result<Track> {
        Ok(Track {
            id: row.get(0)?,
            spotify_id: row.get(1)?,
            name: row.get(2)?,
            duration_ms: row.get(3)?,
            explicit: row.get::<_, i64>(4)? != 0,
            is_playable: row.get::<_, i64>(5)? != 0,
            is_local: row.get::<_, i64>(6)? != 0,
            popularity: row.get(7)?,
            preview_url: row.get(8)?,
            album_id: row.get(9)?,
            track_number: row.get(10)?,
            uri: row.get(11)?,
        })
    }

    const ALBUM_COLUMNS: &'static str = "id, spotify_id, name, album_type, image_url, \
         image_width, image_height, label, popularity, release_date, release_date_precision, \
         total_tracks, genres, uri";

    fn parse_album_row(row: &rusqlite::Row) -> rusqlite::Result<Album> {
        let album_type: String = row.get(3)?;
        let precision: String = row.get(10)?;
        Ok(Album {
            id: row.get(0)?,
            spotify_id: row.get(1)?,
            name: row.get(2)?,
            album_type: AlbumType::from_db_str(&album_type),
            image: Self::parse_image(row.get(4)?, row.get(5)?, row.get(6)?),
            label: row.get(7)?,
            popularity: row.get(8)?,
            release_date: row.get(9)?,
            release_date_precision: ReleaseDatePrecision::from_db_str(&precision),
            total_tracks: row.get(11)?,
            genres: Self::parse_genres(12, row.get(12)?)?,
            uri: row.get(13)?,
        })
    }

    const ARTIST_COLUMNS: &'static str = "id, spotify_id, name, href, image_url, image_width, \
         image_height, genres, popularity, uri";

    fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get(0)?,
            spotify_id: row.get(1)?,
            name: row.get(2)?,
            href: row.get(3)?,
            image: Self::parse_image(row.get(4)?, row.get(5)?, row.get(6)?),
            genres: Self::parse_genres(7, row.get(7)?)?,
            popularity: row.get(8)?,
            uri: row.get(9)?,
        })
    }

    const PLAYLIST_COLUMNS: &'static str = "id, spotify_id, name, description, collaborative, \
         owner_id, image_url, image_width, image_height, public, uri";

    fn parse_playlist_row(row: &rusqlite::Row) -> rusqlite::Result<Playlist> {
        Ok(Playlist {
            id: row.get(0)?,
            spotify_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            collaborative: row.get::<_, i64>(4)? != 0,
            owner_id: row.get(5)?,
            image: Self::parse_image(row.get(6)?, row.get(7)?, row.get(8)?),
            public: row.get::<_, i64>(9)? != 0,
            uri: row.get(10)?,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn query_internal_id(
        conn: &Connection,
        table: &str,
        spotify_id: &str,
    ) -> Result<Option<String>> {
        match conn.query_row(
            &format!("SELECT id FROM {} WHERE spotify_id = ?1", table),
            params![spotify_id],
            |r| r.get(0),
        ) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn query_album(conn: &Connection, spotify_id: &str) -> Result<Option<Album>> {
        let sql = format!(
            "SELECT {} FROM albums WHERE spotify_id = ?1",
            Self::ALBUM_COLUMNS
        );
        match conn.query_row(&sql, params![spotify_id], Self::parse_album_row) {
            Ok(album) => Ok(Some(album)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn query_album_by_id(conn: &Connection, id: &str) -> Result<Option<Album>> {
        let sql = format!("SELECT {} FROM albums WHERE id = ?1", Self::ALBUM_COLUMNS);
        match conn.query_row(&sql, params![id], Self::parse_album_row) {
            Ok(album) => Ok(Some(album)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn query_artist(conn: &Connection, spotify_id: &str) -> Result<Option<Artist>> {
        let sql = format!(
            "SELECT {} FROM artists WHERE spotify_id = ?1",
            Self::ARTIST_COLUMNS
        );
        match conn.query_row(&sql, params![spotify_id], Self::parse_artist_row) {
            Ok(artist) => Ok(Some(artist)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn query_playlist(conn: &Connection, spotify_id: &str) -> Result<Option<Playlist>> {
        let sql = format!(
            "SELECT {} FROM playlists WHERE spotify_id = ?1",
            Self::PLAYLIST_COLUMNS
        );
        match conn.query_row(&sql, params![spotify_id], Self::parse_playlist_row) {
            Ok(playlist) => Ok(Some(playlist)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn query_track_artists(conn: &Connection, track_id: &str) -> Result<Vec<Artist>> {
        let sql = format!(
            "SELECT {} FROM artists a
             JOIN track_artists ta ON ta.artist_id = a.id
             WHERE ta.track_id = ?1
             ORDER BY a.name",
            Self::ARTIST_COLUMNS
                .split(", ")
                .map(|c| format!("a.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let artists = stmt
            .query_map(params![track_id], Self::parse_artist_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn query_track(conn: &Connection, spotify_id: &str) -> Result<Option<TrackWithRelations>> {
        let sql = format!(
            "SELECT {} FROM tracks WHERE spotify_id = ?1",
            Self::TRACK_COLUMNS
        );
        let track = match conn.query_row(&sql, params![spotify_id], Self::parse_track_row) {
            Ok(track) => track,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let album = Self::query_album_by_id(conn, &track.album_id)?
            .with_context(|| format!("Track {} references missing album", track.spotify_id))?;
        let artists = Self::query_track_artists(conn, &track.id)?;

        Ok(Some(TrackWithRelations {
            track,
            album,
            artists,
        }))
    }

    // =========================================================================
    // Inserts (all called within the write connection)
    // =========================================================================

    fn insert_album_row(conn: &Connection, album: &NewAlbum) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let genres = serde_json::to_string(&album.genres)?;
        conn.execute(
            "INSERT INTO albums (id, spotify_id, name, album_type, image_url, image_width,
                                 image_height, label, popularity, release_date,
                                 release_date_precision, total_tracks, genres, uri)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                id,
                album.spotify_id,
                album.name,
                album.album_type.to_db_str(),
                album.image.as_ref().map(|i| i.url.clone()),
                album.image.as_ref().and_then(|i| i.width),
                album.image.as_ref().and_then(|i| i.height),
                album.label,
                album.popularity,
                album.release_date,
                album.release_date_precision.to_db_str(),
                album.total_tracks,
                genres,
                album.uri,
            ],
        )
        .with_context(|| format!("Failed to insert album {}", album.spotify_id))?;
        Ok(id)
    }

    fn insert_artist_row(conn: &Connection, artist: &NewArtist) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let genres = serde_json::to_string(&artist.genres)?;
        conn.execute(
            "INSERT INTO artists (id, spotify_id, name, href, image_url, image_width,
                                  image_height, genres, popularity, uri)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                artist.spotify_id,
                artist.name,
                artist.href,
                artist.image.as_ref().map(|i| i.url.clone()),
                artist.image.as_ref().and_then(|i| i.width),
                artist.image.as_ref().and_then(|i| i.height),
                genres,
                artist.popularity,
                artist.uri,
            ],
        )
        .with_context(|| format!("Failed to insert artist {}", artist.spotify_id))?;
        Ok(id)
    }

    fn insert_track_row(conn: &Connection, track: &NewTrack, album_id: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO tracks (id, spotify_id, name, duration_ms, explicit, is_playable,
                                 is_local, popularity, preview_url, album_id, track_number, uri)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id,
                track.spotify_id,
                track.name,
                track.duration_ms,
                track.explicit as i64,
                track.is_playable as i64,
                track.is_local as i64,
                track.popularity,
                track.preview_url,
                album_id,
                track.track_number,
                track.uri,
            ],
        )
        .with_context(|| format!("Failed to insert track {}", track.spotify_id))?;
        Ok(id)
    }

    fn insert_playlist_row(conn: &Connection, playlist: &NewPlaylist) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO playlists (id, spotify_id, name, description, collaborative, owner_id,
                                    image_url, image_width, image_height, public, uri)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                id,
                playlist.spotify_id,
                playlist.name,
                playlist.description,
                playlist.collaborative as i64,
                playlist.owner_id,
                playlist.image.as_ref().map(|i| i.url.clone()),
                playlist.image.as_ref().and_then(|i| i.width),
                playlist.image.as_ref().and_then(|i| i.height),
                playlist.public as i64,
                playlist.uri,
            ],
        )
        .with_context(|| format!("Failed to insert playlist {}", playlist.spotify_id))?;
        Ok(id)
    }
}

impl MirrorStore for SqliteMirrorStore {
    fn get_track(&self, spotify_id: &str) -> Result<Option<TrackWithRelations>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        Self::query_track(&conn, spotify_id)
    }

    fn get_tracks(&self, spotify_ids: &[String]) -> Result<Vec<TrackWithRelations>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut seen = std::collections::HashSet::new();
        let mut tracks = Vec::new();
        for spotify_id in spotify_ids {
            if !seen.insert(spotify_id.as_str()) {
                continue;
            }
            if let Some(track) = Self::query_track(&conn, spotify_id)? {
                tracks.push(track);
            }
        }
        Ok(tracks)
    }

    fn get_album(&self, spotify_id: &str) -> Result<Option<Album>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        Self::query_album(&conn, spotify_id)
    }

    fn get_artist(&self, spotify_id: &str) -> Result<Option<Artist>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        Self::query_artist(&conn, spotify_id)
    }

    fn get_playlist(&self, spotify_id: &str) -> Result<Option<Playlist>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        Self::query_playlist(&conn, spotify_id)
    }

    fn get_artist_tracks(&self, spotify_id: &str) -> Result<Option<ArtistTracks>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let artist = match Self::query_artist(&conn, spotify_id)? {
            Some(artist) => artist,
            None => return Ok(None),
        };

        let sql = format!(
            "SELECT {} FROM tracks t
             JOIN track_artists ta ON ta.track_id = t.id
             WHERE ta.artist_id = ?1
             ORDER BY t.name",
            Self::TRACK_COLUMNS
                .split(", ")
                .map(|c| format!("t.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let tracks = stmt
            .query_map(params![artist.id], Self::parse_track_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ArtistTracks { artist, tracks }))
    }

    fn insert_track_graph(&self, graph: &TrackGraph) -> Result<()> {
        if graph.is_empty() {
            return Ok(());
        }

        let mut conn = self.write_conn.lock().unwrap();
        let tx = conn.transaction()?;

        // Albums first, tracks reference their internal ids
        let mut album_ids: HashMap<&str, String> = HashMap::new();
        for album in &graph.albums {
            let id = match Self::query_internal_id(&tx, "albums", &album.spotify_id)? {
                Some(id) => id,
                None => Self::insert_album_row(&tx, album)?,
            };
            album_ids.insert(album.spotify_id.as_str(), id);
        }

        let mut artist_ids: HashMap<&str, String> = HashMap::new();
        for artist in &graph.artists {
            let id = match Self::query_internal_id(&tx, "artists", &artist.spotify_id)? {
                Some(id) => id,
                None => Self::insert_artist_row(&tx, artist)?,
            };
            artist_ids.insert(artist.spotify_id.as_str(), id);
        }

        for track in &graph.tracks {
            if Self::query_internal_id(&tx, "tracks", &track.spotify_id)?.is_some() {
                continue;
            }

            let album_id = album_ids
                .get(track.album_spotify_id.as_str())
                .with_context(|| {
                    format!(
                        "Track {} references album {} not present in the batch",
                        track.spotify_id, track.album_spotify_id
                    )
                })?;
            let track_id = Self::insert_track_row(&tx, track, album_id)?;

            for artist_spotify_id in &track.artist_spotify_ids {
                let artist_id = artist_ids.get(artist_spotify_id.as_str()).with_context(|| {
                    format!(
                        "Track {} references artist {} not present in the batch",
                        track.spotify_id, artist_spotify_id
                    )
                })?;
                tx.execute(
                    "INSERT OR IGNORE INTO track_artists (track_id, artist_id) VALUES (?1, ?2)",
                    params![track_id, artist_id],
                )?;
                tx.execute(
                    "INSERT OR IGNORE INTO artist_albums (artist_id, album_id) VALUES (?1, ?2)",
                    params![artist_id, album_id],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn insert_album(&self, album: &NewAlbum) -> Result<Album> {
        let conn = self.write_conn.lock().unwrap();
        if Self::query_internal_id(&conn, "albums", &album.spotify_id)?.is_none() {
            Self::insert_album_row(&conn, album)?;
        }
        Self::query_album(&conn, &album.spotify_id)?
            .with_context(|| format!("Album {} missing after insert", album.spotify_id))
    }

    fn insert_artist(&self, artist: &NewArtist) -> Result<Artist> {
        let conn = self.write_conn.lock().unwrap();
        if Self::query_internal_id(&conn, "artists", &artist.spotify_id)?.is_none() {
            Self::insert_artist_row(&conn, artist)?;
        }
        Self::query_artist(&conn, &artist.spotify_id)?
            .with_context(|| format!("Artist {} missing after insert", artist.spotify_id))
    }

    fn insert_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist> {
        let conn = self.write_conn.lock().unwrap();
        if Self::query_internal_id(&conn, "playlists", &playlist.spotify_id)?.is_none() {
            Self::insert_playlist_row(&conn, playlist)?;
        }
        Self::query_playlist(&conn, &playlist.spotify_id)?
            .with_context(|| format!("Playlist {} missing after insert", playlist.spotify_id))
    }

    fn get_times_sent(&self, sender_email: &str) -> Result<Option<i64>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        match conn.query_row(
            "SELECT times_sent FROM email_senders WHERE sender_email = ?1",
            params![sender_email],
            |r| r.get(0),
        ) {
            Ok(count) => Ok(Some(count)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn record_email_sent(&self, sender_email: &str) -> Result<i64> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO email_senders (id, sender_email, times_sent) VALUES (?1, ?2, 1)
             ON CONFLICT(sender_email) DO UPDATE SET
                 times_sent = times_sent + 1,
                 updated_at = cast(strftime('%s','now') as int)",
            params![Uuid::new_v4().to_string(), sender_email],
        )?;
        let count = conn.query_row(
            "SELECT times_sent FROM email_senders WHERE sender_email = ?1",
            params![sender_email],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn get_counts(&self) -> Result<MirrorCounts> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?)
        };
        Ok(MirrorCounts {
            tracks: count("tracks")?,
            albums: count("albums")?,
            artists: count("artists")?,
            playlists: count("playlists")?,
        })
    }
}
