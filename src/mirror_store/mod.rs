mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use store::SqliteMirrorStore;
pub use trait_def::{MirrorCounts, MirrorStore};
