//! Utility functions

pub mod cover_art;
mod sanitize;
pub mod sidecar;

pub use cover_art::{LoftyEmbedder, TagEmbedder};
pub use sanitize::root_file_name;
pub use sidecar::{MediaMetadata, write_sidecar};
