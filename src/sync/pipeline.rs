//! Idempotent ingestion of playlist entries
//!
//! Each entry not yet in the [`DedupCache`] goes through:
//! - resolve: full metadata from the video source
//! - sidecars: `<root>.xml` metadata and, for JPEG thumbnails, `<root>.jpg`
//! - media: `<root>.mp3` via the video source, unless already on disk
//! - tag: embed `<root>.jpg` as the front cover (blocking, via spawn_blocking)
//! - commit: insert the id into the cache and flush it
//!
//! The id is committed only after every step succeeded, so any failure leaves
//! the entry to be retried on the next pass.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::cache::DedupCache;
use super::downloader::{HttpFetch, is_jpeg_url};
use super::error::IngestError;
use super::progress::{ProgressObserver, ProgressReporter};
use crate::utils::{MediaMetadata, TagEmbedder, root_file_name, write_sidecar};
use crate::youtube::{ItemId, PlaylistEntry, VideoDetails, VideoSource, best_thumbnail};

/// Result of processing one playlist entry
#[derive(Debug)]
pub enum EntryOutcome {
    /// Id was already cached; nothing was fetched
    AlreadyCached,
    /// All artifacts written and the id committed
    Ingested {
        /// False when the audio file was already on disk
        downloaded: bool,
    },
    /// Something failed; the id was not committed
    Failed(IngestError),
}

/// Summary of one pass over a playlist
#[derive(Debug, Default)]
pub struct PassReport {
    pub total: usize,
    pub ingested: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: Vec<(ItemId, String)>,
}

/// Output paths sharing one root name
#[derive(Debug, Clone)]
struct ArtifactPaths {
    metadata: PathBuf,
    cover: PathBuf,
    audio: PathBuf,
}

impl ArtifactPaths {
    fn new(dir: &Path, root: &str) -> Self {
        Self {
            metadata: dir.join(format!("{}.xml", root)),
            cover: dir.join(format!("{}.jpg", root)),
            audio: dir.join(format!("{}.mp3", root)),
        }
    }
}

/// Turns playlist entries into on-disk artifacts exactly once
pub struct IngestPipeline {
    source: Arc<dyn VideoSource>,
    http: Arc<dyn HttpFetch>,
    embedder: Arc<dyn TagEmbedder>,
    cache: DedupCache,
    progress: ProgressReporter,
    download_dir: PathBuf,
}

impl IngestPipeline {
    pub fn new(
        source: Arc<dyn VideoSource>,
        http: Arc<dyn HttpFetch>,
        embedder: Arc<dyn TagEmbedder>,
        cache: DedupCache,
        observer: Arc<dyn ProgressObserver>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            source,
            http,
            embedder,
            cache,
            progress: ProgressReporter::new(observer),
            download_dir,
        }
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DedupCache {
        &mut self.cache
    }

    /// Process every entry of a playlist in order
    ///
    /// Only a failure to list the playlist is returned as an error; entry
    /// failures are logged and recorded in the report.
    pub async fn run_pass(&mut self, playlist: &str) -> Result<PassReport> {
        let entries = self
            .source
            .playlist_entries(playlist)
            .await
            .context("Failed to list playlist")?;

        let mut report = PassReport {
            total: entries.len(),
            ..Default::default()
        };

        for entry in &entries {
            match self.process_entry(entry).await {
                EntryOutcome::AlreadyCached => report.skipped += 1,
                EntryOutcome::Ingested { downloaded } => {
                    report.ingested += 1;
                    if downloaded {
                        report.downloaded += 1;
                    }
                }
                EntryOutcome::Failed(e) => {
                    error!("Failed to ingest {} ({}): {}", entry.title, entry.id, e);
                    report.failed.push((entry.id.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Process a single entry, skipping it if its id is cached
    pub async fn process_entry(&mut self, entry: &PlaylistEntry) -> EntryOutcome {
        if self.cache.contains(&entry.id) {
            debug!("Video {} already in cache. Skipping...", entry.title);
            return EntryOutcome::AlreadyCached;
        }

        match self.ingest(entry).await {
            Ok(downloaded) => EntryOutcome::Ingested { downloaded },
            Err(e) => EntryOutcome::Failed(e),
        }
    }

    async fn ingest(&mut self, entry: &PlaylistEntry) -> Result<bool, IngestError> {
        let details = self
            .source
            .video_details(&entry.url)
            .await
            .map_err(IngestError::Resolution)?;
        debug!("Resolved {} ({}) by {}", details.title, details.id, details.author);

        let root = match root_file_name(&details.title) {
            root if root.is_empty() => root_file_name(&entry.id),
            root => root,
        };
        let paths = ArtifactPaths::new(&self.download_dir, &root);

        tokio::fs::create_dir_all(&self.download_dir).await?;

        let metadata = self.metadata_for(entry, &details).await;
        write_sidecar(&paths.metadata, &metadata)
            .await
            .map_err(IngestError::Metadata)?;

        self.save_cover(entry, &paths.cover)
            .await
            .map_err(IngestError::Thumbnail)?;

        let downloaded = if tokio::fs::try_exists(&paths.audio).await? {
            info!("{} already on disk, refreshing cover art", root);
            false
        } else {
            info!("Downloading {}: start", root);
            self.progress.reset();
            self.source
                .download_audio(&entry.url, &paths.audio, &self.progress)
                .await
                .map_err(IngestError::Download)?;
            info!("Downloading {}: finish", root);
            true
        };

        self.embed_cover(&paths).await.map_err(IngestError::Embed)?;

        self.cache.insert(entry.id.clone());
        if let Err(e) = self.cache.flush() {
            warn!("Failed to persist download cache: {:#}", e);
        }

        Ok(downloaded)
    }

    /// Build the sidecar record; a failed thumbnail fetch only drops the
    /// embedded image
    async fn metadata_for(&self, entry: &PlaylistEntry, details: &VideoDetails) -> MediaMetadata {
        let candidates = if details.thumbnails.is_empty() {
            &entry.thumbnails
        } else {
            &details.thumbnails
        };

        let thumbnail = match best_thumbnail(candidates) {
            Some(thumb) => match self.http.fetch(&thumb.url).await {
                Ok(data) => Some(data.to_vec()),
                Err(e) => {
                    debug!("Failed to fetch thumbnail for metadata: {:#}", e);
                    None
                }
            },
            None => None,
        };

        MediaMetadata {
            title: details.title.clone(),
            author: details.author.clone(),
            upload_date: details.upload_date,
            description: details.description.clone(),
            duration: details.duration,
            thumbnail,
        }
    }

    /// Save the best thumbnail as the embed source, JPEG only
    async fn save_cover(&self, entry: &PlaylistEntry, cover_path: &Path) -> Result<()> {
        let Some(thumb) = best_thumbnail(&entry.thumbnails) else {
            debug!("No thumbnails listed for {}", entry.id);
            return Ok(());
        };
        if !is_jpeg_url(&thumb.url) {
            debug!("Thumbnail is not a JPEG, skipping: {}", thumb.url);
            return Ok(());
        }

        let data = self.http.fetch(&thumb.url).await?;
        tokio::fs::write(cover_path, data)
            .await
            .with_context(|| format!("Failed to write {}", cover_path.display()))?;

        debug!("Wrote cover: {}", cover_path.display());
        Ok(())
    }

    async fn embed_cover(&self, paths: &ArtifactPaths) -> Result<()> {
        let embedder = self.embedder.clone();
        let audio = paths.audio.clone();
        let cover = paths.cover.clone();

        tokio::task::spawn_blocking(move || embedder.embed_cover(&audio, &cover))
            .await
            .context("Cover art embedding task panicked")?
    }
}
