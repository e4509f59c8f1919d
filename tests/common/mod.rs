//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{track_json, TestClient, TestServer, ALBUM_1_ID, ARTIST_1_ID, TRACK_1_ID};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_get_track() {
//!     let server = TestServer::spawn().await;
//!     server
//!         .upstream
//!         .add_track(track_json(TRACK_1_ID, ALBUM_1_ID, &[ARTIST_1_ID]));
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.get_track(TRACK_1_ID).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

mod client;
mod constants;
mod fixtures;
mod server;
mod upstream;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use fixtures::{album_json, artist_json, playlist_json, repo_json, track_json};
pub use server::TestServer;
pub use upstream::MockUpstream;
