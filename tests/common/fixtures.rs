//! Remote payload builders
//!
//! These produce JSON in the shape the upstream catalog API serves, for
//! loading into the mock upstream. Names are derived from ids so assertions
//! can predict them.

use serde_json::{json, Value};

pub fn album_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Album {}", id),
        "album_type": "album",
        "images": [
            {"url": format!("https://images.test/{}-64", id), "width": 64, "height": 64},
            {"url": format!("https://images.test/{}-640", id), "width": 640, "height": 640}
        ],
        "label": "Test Records",
        "popularity": 55,
        "release_date": "2020-03-01",
        "release_date_precision": "day",
        "total_tracks": 10,
        "genres": [],
        "uri": format!("spotify:album:{}", id)
    })
}

pub fn artist_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Artist {}", id),
        "href": format!("https://api.test/v1/artists/{}", id),
        "images": [
            {"url": format!("https://images.test/{}-320", id), "width": 320, "height": 320}
        ],
        "genres": ["indie rock"],
        "popularity": 70,
        "uri": format!("spotify:artist:{}", id)
    })
}

/// An artist as embedded in a track payload, without images or genres.
fn artist_ref_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Artist {}", id),
        "href": format!("https://api.test/v1/artists/{}", id),
        "uri": format!("spotify:artist:{}", id)
    })
}

/// An album as embedded in a track payload, without label, genres or
/// popularity.
fn album_ref_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Album {}", id),
        "album_type": "album",
        "images": [
            {"url": format!("https://images.test/{}-64", id), "width": 64, "height": 64},
            {"url": format!("https://images.test/{}-640", id), "width": 640, "height": 640}
        ],
        "release_date": "2020-03-01",
        "release_date_precision": "day",
        "total_tracks": 10,
        "uri": format!("spotify:album:{}", id)
    })
}

pub fn track_json(id: &str, album_id: &str, artist_ids: &[&str]) -> Value {
    json!({
        "id": id,
        "name": format!("Track {}", id),
        "duration_ms": 201_000,
        "explicit": false,
        "is_local": false,
        "popularity": 42,
        "preview_url": null,
        "track_number": 1,
        "uri": format!("spotify:track:{}", id),
        "album": album_ref_json(album_id),
        "artists": artist_ids.iter().map(|a| artist_ref_json(a)).collect::<Vec<_>>()
    })
}

pub fn repo_json(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("Repository {}", name),
        "html_url": format!("https://github.test/owner-1/{}", name),
        "language": "Rust",
        "stargazers_count": 12,
        "forks_count": 3,
        "created_at": "2023-01-15T10:00:00Z",
        "updated_at": "2024-06-01T12:00:00Z",
        "private": false
    })
}

pub fn playlist_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Playlist {}", id),
        "description": "A test playlist",
        "collaborative": false,
        "owner": {"id": "owner-1"},
        "images": [
            {"url": format!("https://images.test/{}-300", id), "width": 300, "height": 300}
        ],
        "public": true,
        "uri": format!("spotify:playlist:{}", id)
    })
}
