//! Periodic playlist polling

use anyhow::Result;
use chrono::Local;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::pipeline::{IngestPipeline, PassReport};

/// Runs the ingestion pipeline over a playlist on a fixed period
pub struct Poller {
    pipeline: IngestPipeline,
    playlist: String,
    period: Duration,
}

impl Poller {
    pub fn new(pipeline: IngestPipeline, playlist: String, period: Duration) -> Self {
        Self {
            pipeline,
            playlist,
            period,
        }
    }

    /// Poll until `shutdown` is cancelled, then flush the cache
    ///
    /// Cancellation only interrupts the wait between passes; a pass that is
    /// already running finishes first.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        info!(
            "ytdumper started at: {}, polling every {:?} ({} ids cached)",
            Local::now().to_rfc3339(),
            self.period,
            self.pipeline.cache().len()
        );

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.poll().await;
        }

        self.stop();
        Ok(())
    }

    /// Run exactly one pass, then flush the cache
    pub async fn run_once(mut self) -> Result<PassReport> {
        let report = self.pipeline.run_pass(&self.playlist).await;
        self.stop();
        report
    }

    async fn poll(&mut self) {
        match self.pipeline.run_pass(&self.playlist).await {
            Ok(report) => log_report(&report),
            Err(e) => error!("Poll failed: {:#}", e),
        }
    }

    fn stop(&mut self) {
        info!("ytdumper stopping at: {}", Local::now().to_rfc3339());

        match self.pipeline.cache_mut().flush_if_dirty() {
            Ok(true) => info!("Flushed download cache"),
            Ok(false) => {}
            Err(e) => warn!("Failed to flush download cache on shutdown: {:#}", e),
        }

        info!("ytdumper stopped at: {}", Local::now().to_rfc3339());
    }
}

fn log_report(report: &PassReport) {
    if report.ingested > 0 || !report.failed.is_empty() {
        info!(
            "Pass complete: {} entries, {} ingested ({} downloaded), {} skipped, {} failed",
            report.total,
            report.ingested,
            report.downloaded,
            report.skipped,
            report.failed.len()
        );
    } else {
        debug!("Pass complete: nothing new in {} entries", report.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::sync::cache::DedupCache;
    use crate::sync::downloader::HttpFetch;
    use crate::sync::progress::{LogProgress, ProgressReporter};
    use crate::utils::TagEmbedder;
    use crate::youtube::{PlaylistEntry, VideoDetails, VideoSource};

    /// Source with an empty playlist that counts listings
    #[derive(Default)]
    struct CountingSource {
        listings: AtomicUsize,
    }

    #[async_trait]
    impl VideoSource for CountingSource {
        async fn playlist_entries(&self, _playlist: &str) -> Result<Vec<PlaylistEntry>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn video_details(&self, _video_url: &str) -> Result<VideoDetails> {
            anyhow::bail!("not used")
        }

        async fn download_audio(
            &self,
            _video_url: &str,
            _dest: &Path,
            _progress: &ProgressReporter,
        ) -> Result<()> {
            anyhow::bail!("not used")
        }
    }

    struct NoHttp;

    #[async_trait]
    impl HttpFetch for NoHttp {
        async fn fetch(&self, _url: &str) -> Result<Bytes> {
            anyhow::bail!("not used")
        }
    }

    struct NoEmbed;

    impl TagEmbedder for NoEmbed {
        fn embed_cover(&self, _audio: &Path, _cover: &Path) -> Result<()> {
            anyhow::bail!("not used")
        }
    }

    fn poller(dir: &Path, source: Arc<CountingSource>, period: Duration) -> Poller {
        let cache = DedupCache::load(&dir.join("downloads.cache")).unwrap();
        let pipeline = IngestPipeline::new(
            source,
            Arc::new(NoHttp),
            Arc::new(NoEmbed),
            cache,
            Arc::new(LogProgress),
            dir.join("media"),
        );
        Poller::new(pipeline, "PL".to_string(), period)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_each_period_until_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::default());
        let poller = poller(dir.path(), source.clone(), Duration::from_secs(5));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poller.run(shutdown.clone()));

        // No pass before the first period elapses
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(source.listings.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(source.listings.load(Ordering::SeqCst), 3);

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cancel_before_first_tick() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::default());
        let poller = poller(dir.path(), source.clone(), Duration::from_secs(3600));

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        poller.run(shutdown).await.unwrap();

        assert_eq!(source.listings.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_dirty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::default());
        let mut poller = poller(dir.path(), source, Duration::from_secs(3600));
        poller.pipeline.cache_mut().insert("pending");

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        poller.run(shutdown).await.unwrap();

        let persisted = std::fs::read_to_string(dir.path().join("downloads.cache")).unwrap();
        assert_eq!(persisted, "pending\n");
    }

    #[tokio::test]
    async fn test_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::default());
        let poller = poller(dir.path(), source.clone(), Duration::from_secs(3600));

        let report = poller.run_once().await.unwrap();

        assert_eq!(report.total, 0);
        assert_eq!(source.listings.load(Ordering::SeqCst), 1);
    }
}
