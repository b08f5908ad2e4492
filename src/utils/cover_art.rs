//! Cover art embedding for downloaded audio files
//!
//! The sidecar `<root>.jpg` is written verbatim into the front-cover slot of
//! the audio file's primary tag. No re-encoding happens here; the JPEG is
//! whatever the thumbnail host served.

use anyhow::{Context, Result};
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::path::Path;
use tracing::debug;

/// Writes a cover picture into an audio file's embedded tag
pub trait TagEmbedder: Send + Sync {
    /// Replace the front cover of `audio_path` with the JPEG at `cover_path`
    fn embed_cover(&self, audio_path: &Path, cover_path: &Path) -> Result<()>;
}

/// `TagEmbedder` backed by lofty, supports MP3 (ID3v2) and the other
/// formats lofty can write
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyEmbedder;

impl TagEmbedder for LoftyEmbedder {
    fn embed_cover(&self, audio_path: &Path, cover_path: &Path) -> Result<()> {
        let cover = std::fs::read(cover_path)
            .with_context(|| format!("Failed to read cover image {}", cover_path.display()))?;
        embed_cover_art(audio_path, cover)
    }
}

/// Embed JPEG bytes as the front cover of an audio file, saving in place
pub fn embed_cover_art(audio_path: &Path, cover_data: Vec<u8>) -> Result<()> {
    if cover_data.is_empty() {
        anyhow::bail!("Cover image is empty");
    }

    let mut tagged_file = Probe::open(audio_path)
        .context("Failed to open audio file")?
        .read()
        .context("Failed to read audio file tags")?;

    let picture = Picture::new_unchecked(
        PictureType::CoverFront,
        Some(MimeType::Jpeg),
        None,
        cover_data,
    );

    // Get the primary tag, or insert one matching the file type
    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .primary_tag_mut()
        .context("Failed to create tag")?;

    tag.remove_picture_type(PictureType::CoverFront);
    tag.push_picture(picture);

    tagged_file
        .save_to_path(audio_path, WriteOptions::default())
        .context("Failed to save audio file with embedded cover")?;

    debug!("Embedded cover art in: {}", audio_path.display());
    Ok(())
}
