//! SQLite schema for the mirror database.
//!
//! Every entity row has a generated UUID primary key and a unique Spotify ID
//! used for lookups. Join tables reference internal ids, never Spotify ids.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("spotify_id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("duration_ms", &SqlType::Integer, non_null = true),
        sqlite_column!("explicit", &SqlType::Integer, non_null = true),
        sqlite_column!("is_playable", &SqlType::Integer, non_null = true),
        sqlite_column!("is_local", &SqlType::Integer, non_null = true),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("preview_url", &SqlType::Text),
        sqlite_column!("album_id", &SqlType::Text, non_null = true, foreign_key = Some(&ALBUM_FK)),
        sqlite_column!("track_number", &SqlType::Integer, non_null = true),
        sqlite_column!("uri", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_tracks_spotify_id", "spotify_id"),
        ("idx_tracks_album", "album_id"),
    ],
    unique_constraints: &[],
};

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("spotify_id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("album_type", &SqlType::Text, non_null = true), // 'album', 'single', 'compilation'
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!("image_width", &SqlType::Integer),
        sqlite_column!("image_height", &SqlType::Integer),
        sqlite_column!("label", &SqlType::Text),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("release_date", &SqlType::Text, non_null = true), // '2023-05-15', '2023-05', '2023'
        sqlite_column!("release_date_precision", &SqlType::Text, non_null = true), // 'day', 'month', 'year'
        sqlite_column!("total_tracks", &SqlType::Integer, non_null = true),
        sqlite_column!("genres", &SqlType::Text, non_null = true), // JSON array of strings
        sqlite_column!("uri", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_albums_spotify_id", "spotify_id")],
    unique_constraints: &[],
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("spotify_id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("href", &SqlType::Text),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!("image_width", &SqlType::Integer),
        sqlite_column!("image_height", &SqlType::Integer),
        sqlite_column!("genres", &SqlType::Text, non_null = true), // JSON array of strings
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("uri", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_artists_spotify_id", "spotify_id")],
    unique_constraints: &[],
};

const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("spotify_id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("collaborative", &SqlType::Integer, non_null = true),
        sqlite_column!("owner_id", &SqlType::Text),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!("image_width", &SqlType::Integer),
        sqlite_column!("image_height", &SqlType::Integer),
        sqlite_column!("public", &SqlType::Integer, non_null = true),
        sqlite_column!("uri", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlists_spotify_id", "spotify_id")],
    unique_constraints: &[],
};

const TRACK_ARTISTS_TABLE: Table = Table {
    name: "track_artists",
    columns: &[
        sqlite_column!("track_id", &SqlType::Text, non_null = true, foreign_key = Some(&TRACK_FK)),
        sqlite_column!("artist_id", &SqlType::Text, non_null = true, foreign_key = Some(&ARTIST_FK)),
    ],
    indices: &[
        ("idx_track_artists_track", "track_id"),
        ("idx_track_artists_artist", "artist_id"),
    ],
    unique_constraints: &[&["track_id", "artist_id"]],
};

const ARTIST_ALBUMS_TABLE: Table = Table {
    name: "artist_albums",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Text, non_null = true, foreign_key = Some(&ARTIST_FK)),
        sqlite_column!("album_id", &SqlType::Text, non_null = true, foreign_key = Some(&ALBUM_FK)),
    ],
    indices: &[
        ("idx_artist_albums_artist", "artist_id"),
        ("idx_artist_albums_album", "album_id"),
    ],
    unique_constraints: &[&["artist_id", "album_id"]],
};

const EMAIL_SENDERS_TABLE: Table = Table {
    name: "email_senders",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("sender_email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "times_sent",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_email_senders_email", "sender_email")],
    unique_constraints: &[],
};

pub const MIRROR_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ALBUMS_TABLE,
        ARTISTS_TABLE,
        TRACKS_TABLE,
        PLAYLISTS_TABLE,
        TRACK_ARTISTS_TABLE,
        ARTIST_ALBUMS_TABLE,
        EMAIL_SENDERS_TABLE,
    ],
    migration: None,
}];
