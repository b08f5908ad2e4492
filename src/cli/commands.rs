//! CLI command handlers

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::Cli;
use crate::config::Config;
use crate::sync::{DedupCache, IngestPipeline, LogProgress, Poller, ReqwestFetcher};
use crate::utils::LoftyEmbedder;
use crate::youtube::YtDlpClient;

/// Open the download cache, creating the download directory first when the
/// cache lives in it by default
///
/// An explicitly configured cache path must already have its directory.
fn open_cache(config: &Config) -> Result<DedupCache> {
    if config.cache_path_is_default {
        std::fs::create_dir_all(&config.download_dir).with_context(|| {
            format!(
                "Failed to create download directory {}",
                config.download_dir.display()
            )
        })?;
    }

    DedupCache::load(&config.cache_path).with_context(|| {
        format!(
            "Cannot open download cache (does {} exist?)",
            config
                .cache_path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        )
    })
}

/// Wire up the production collaborators
fn build_poller(config: &Config) -> Result<Poller> {
    let playlist = config.require_playlist()?.to_string();

    let cache = open_cache(config)?;
    info!(
        "{} videos already downloaded according to {}",
        cache.len(),
        cache.path().display()
    );

    let pipeline = IngestPipeline::new(
        Arc::new(YtDlpClient::new(&config.yt_dlp_path)),
        Arc::new(ReqwestFetcher::new()?),
        Arc::new(LoftyEmbedder),
        cache,
        Arc::new(LogProgress),
        config.download_dir.clone(),
    );

    Ok(Poller::new(pipeline, playlist, config.poll_interval))
}

/// Handle the `run` command
pub async fn run(config: &Config) -> Result<()> {
    let poller = build_poller(config)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
        }
        signal_token.cancel();
    });

    poller.run(shutdown).await
}

/// Handle the `once` command
pub async fn once(config: &Config) -> Result<()> {
    let poller = build_poller(config)?;
    let report = poller.run_once().await?;

    println!();
    println!(
        "{} {} entries: {} ingested ({} downloaded), {} already cached",
        "Checked".green().bold(),
        report.total,
        report.ingested,
        report.downloaded,
        report.skipped
    );
    if !report.failed.is_empty() {
        println!("{}", format!("{} failed:", report.failed.len()).red().bold());
        for (id, reason) in &report.failed {
            println!("  {} {}", id.yellow(), reason);
        }
    }

    Ok(())
}

/// Handle the `status` command
pub fn status(config: &Config) -> Result<()> {
    println!("{}", "ytdumper status".cyan().bold());
    println!(
        "  Playlist:      {}",
        config.playlist.as_deref().unwrap_or("(not configured)")
    );
    println!("  Download dir:  {}", config.download_dir.display());
    println!("  Cache file:    {}", config.cache_path.display());
    println!("  Poll interval: {}s", config.poll_interval.as_secs());
    println!("  yt-dlp:        {}", config.yt_dlp_path.display());

    if config.cache_path.exists() {
        let cache = DedupCache::load(&config.cache_path)?;
        let count = if cache.is_empty() {
            "none".yellow()
        } else {
            cache.len().to_string().green()
        };
        println!("  Cached videos: {}", count);
    } else {
        println!("  Cached videos: {}", "none (cache not created yet)".yellow());
    }

    Ok(())
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "ytdumper", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfig, Overrides};

    #[test]
    fn test_open_cache_creates_default_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let download_dir = dir.path().join("fresh").join("media");
        let overrides = Overrides {
            download_dir: Some(download_dir.clone()),
            ..Default::default()
        };
        let config = Config::resolve(FileConfig::default(), overrides).unwrap();

        let cache = open_cache(&config).unwrap();

        assert!(cache.is_empty());
        assert!(download_dir.is_dir());
        assert!(download_dir.join("downloads.cache").exists());
    }

    #[test]
    fn test_open_cache_explicit_path_needs_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            download_dir: Some(dir.path().join("media")),
            cache_path: Some(dir.path().join("missing").join("ids.cache")),
            ..Default::default()
        };
        let config = Config::resolve(FileConfig::default(), overrides).unwrap();

        assert!(open_cache(&config).is_err());
        assert!(!dir.path().join("missing").exists());
        assert!(!dir.path().join("media").exists());
    }
}
