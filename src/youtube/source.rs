//! Video source abstraction

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use super::models::{PlaylistEntry, VideoDetails};
use crate::sync::ProgressReporter;

/// Resolves playlists and videos and downloads their audio
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// List the entries of a playlist in source order
    async fn playlist_entries(&self, playlist: &str) -> Result<Vec<PlaylistEntry>>;

    /// Resolve full metadata for one video
    async fn video_details(&self, video_url: &str) -> Result<VideoDetails>;

    /// Download the audio track of a video as MP3 to `dest`, reporting
    /// fractional completion as it goes
    async fn download_audio(
        &self,
        video_url: &str,
        dest: &Path,
        progress: &ProgressReporter,
    ) -> Result<()>;
}
