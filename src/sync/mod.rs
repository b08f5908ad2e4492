//! Playlist ingestion: dedup cache, pipeline and poll loop

pub mod cache;
pub mod downloader;
pub mod error;
pub mod pipeline;
pub mod poller;
pub mod progress;

pub use cache::DedupCache;
pub use downloader::ReqwestFetcher;
pub use pipeline::IngestPipeline;
pub use poller::Poller;
pub use progress::{LogProgress, ProgressReporter};
