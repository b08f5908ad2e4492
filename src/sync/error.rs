use thiserror::Error;

/// Why a single playlist entry could not be ingested
///
/// Every variant leaves the entry's id out of the cache, so the entry is
/// picked up again on the next poll.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to resolve video metadata: {0:#}")]
    Resolution(anyhow::Error),

    #[error("failed to write metadata sidecar: {0:#}")]
    Metadata(anyhow::Error),

    #[error("failed to save thumbnail: {0:#}")]
    Thumbnail(anyhow::Error),

    #[error("failed to download audio: {0:#}")]
    Download(anyhow::Error),

    #[error("failed to embed cover art: {0:#}")]
    Embed(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
