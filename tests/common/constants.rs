//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (fixture ids, timeouts, etc.), update only
//! this file.

// ============================================================================
// Fixture Spotify IDs
// ============================================================================

/// Track id for "Opening Track" on "First Album"
pub const TRACK_1_ID: &str = "track-1";

/// Track id for "Middle Track" on "First Album"
pub const TRACK_2_ID: &str = "track-2";

/// Track id for "Smooth Jazz" on "Jazz Collection"
pub const TRACK_3_ID: &str = "track-3";

/// Album id for "First Album"
pub const ALBUM_1_ID: &str = "album-1";

/// Album id for "Jazz Collection"
pub const ALBUM_2_ID: &str = "album-2";

/// Artist id for "The Test Band"
pub const ARTIST_1_ID: &str = "artist-1";

/// Artist id for "Jazz Ensemble"
pub const ARTIST_2_ID: &str = "artist-2";

/// Playlist id for "Road Trip Mix"
pub const PLAYLIST_1_ID: &str = "playlist-1";

// ============================================================================
// Mock upstream behavior
// ============================================================================

/// Token lifetime reported by the mock token endpoint (seconds)
pub const TOKEN_EXPIRES_IN_SEC: u64 = 3600;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for a server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
