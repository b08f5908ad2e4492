//! yt-dlp backed video source

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

use super::models::{PlaylistEntry, VideoDetails, YtPlaylist, YtVideo};
use super::source::VideoSource;
use crate::sync::ProgressReporter;

/// Marker prefixed to our progress lines so they stand out from other output
const PROGRESS_PREFIX: &str = "ytdumper-progress";

/// Drives the external `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    program: PathBuf,
}

impl YtDlpClient {
    /// Create a client for the given yt-dlp executable (name or path)
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run yt-dlp and parse its stdout as JSON
    async fn run_json<T, I, S>(&self, args: I) -> Result<T>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "yt-dlp exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        serde_json::from_slice(&output.stdout).context("Failed to parse yt-dlp JSON output")
    }
}

/// Expand a bare playlist id into a full playlist URL
pub fn playlist_url(playlist: &str) -> String {
    if playlist.contains("://") {
        playlist.to_string()
    } else {
        format!(
            "https://www.youtube.com/playlist?list={}",
            urlencoding::encode(playlist)
        )
    }
}

/// Parse one of our progress-template lines into a completion fraction
///
/// Lines look like `ytdumper-progress <downloaded> <total> <estimate>` where
/// any field may be `NA`.
fn parse_progress_line(line: &str) -> Option<f64> {
    let mut fields = line.split_whitespace();
    if fields.next()? != PROGRESS_PREFIX {
        return None;
    }
    let downloaded: f64 = fields.next()?.parse().ok()?;
    let total = fields.next()?.parse::<f64>().ok();
    let estimate = fields.next().and_then(|f| f.parse::<f64>().ok());

    let total = total.or(estimate).filter(|t| *t > 0.0)?;
    Some((downloaded / total).clamp(0.0, 1.0))
}

/// Build the `-o` template for `dest`
///
/// yt-dlp picks the final extension itself after conversion. Any `%` already
/// in the path is doubled so titles like `50%(off)` are not expanded as
/// template fields.
fn output_template(dest: &Path) -> String {
    let stem = dest.with_extension("");
    format!("{}.%(ext)s", stem.to_string_lossy().replace('%', "%%"))
}

#[async_trait]
impl VideoSource for YtDlpClient {
    async fn playlist_entries(&self, playlist: &str) -> Result<Vec<PlaylistEntry>> {
        let url = playlist_url(playlist);
        debug!("Fetching playlist: {}", url);

        let playlist: YtPlaylist = self
            .run_json(["--flat-playlist", "-J", "--no-warnings", url.as_str()])
            .await
            .context("Failed to fetch playlist")?;

        let entries: Vec<PlaylistEntry> = playlist.entries.into_iter().map(Into::into).collect();
        debug!("Found {} playlist entries", entries.len());
        Ok(entries)
    }

    async fn video_details(&self, video_url: &str) -> Result<VideoDetails> {
        debug!("Resolving video: {}", video_url);

        let video: YtVideo = self
            .run_json(["-J", "--no-playlist", "--no-warnings", video_url])
            .await
            .with_context(|| format!("Failed to resolve video {}", video_url))?;

        Ok(video.into())
    }

    async fn download_audio(
        &self,
        video_url: &str,
        dest: &Path,
        progress: &ProgressReporter,
    ) -> Result<()> {
        let template = output_template(dest);
        let progress_template = format!(
            "download:{} %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s",
            PROGRESS_PREFIX
        );

        debug!("Downloading audio: {} -> {}", video_url, dest.display());

        let mut child = Command::new(&self.program)
            .args(["-x", "--audio-format", "mp3", "--no-playlist", "--no-warnings"])
            .args(["--newline", "--progress-template", progress_template.as_str()])
            .arg("-o")
            .arg(&template)
            .arg(video_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        let stdout = child.stdout.take().context("yt-dlp stdout not captured")?;
        let mut stderr = child.stderr.take().context("yt-dlp stderr not captured")?;

        // Drain stderr concurrently so a full pipe cannot stall the child
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read yt-dlp output")?
        {
            match parse_progress_line(&line) {
                Some(fraction) => progress.report(fraction),
                None => trace!("yt-dlp: {}", line),
            }
        }

        let status = child.wait().await.context("Failed to wait for yt-dlp")?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            anyhow::bail!("yt-dlp exited with {}: {}", status, stderr.trim());
        }
        if !tokio::fs::try_exists(dest).await.unwrap_or(false) {
            anyhow::bail!("yt-dlp finished but {} was not produced", dest.display());
        }

        progress.report(1.0);
        Ok(())
    }
}
