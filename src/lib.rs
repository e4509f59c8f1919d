//! Catalog Mirror Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod contact;
pub mod github;
pub mod mirror;
pub mod mirror_store;
pub mod server;
pub mod spotify;
pub mod sqlite_persistence;
pub mod state_store;
pub mod token_cache;

// Re-export commonly used types for convenience
pub use mirror_store::{MirrorStore, SqliteMirrorStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use state_store::{SqliteStateStore, StateStore};
