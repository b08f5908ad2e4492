//! Video source models
//!
//! `Yt*` types mirror the JSON yt-dlp prints with `-J`; the remaining types
//! are what the rest of the crate works with.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Opaque, stable identifier of a playlist entry
pub type ItemId = String;

/// A candidate thumbnail for a video
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Thumbnail {
    /// Pixel area, 0 when either dimension is unknown
    pub fn area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

/// Pick the largest thumbnail; the first listed wins ties
pub fn best_thumbnail(thumbnails: &[Thumbnail]) -> Option<&Thumbnail> {
    thumbnails
        .iter()
        .rev()
        .max_by_key(|t| t.area())
}

/// Lightweight handle for one entry of a playlist
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    pub id: ItemId,
    pub title: String,
    pub url: String,
    pub thumbnails: Vec<Thumbnail>,
}

/// Fully resolved metadata for a single video
#[derive(Debug, Clone, Default)]
pub struct VideoDetails {
    pub id: ItemId,
    pub title: String,
    pub author: String,
    pub upload_date: Option<DateTime<Utc>>,
    pub description: String,
    pub duration: Option<Duration>,
    pub thumbnails: Vec<Thumbnail>,
}

// yt-dlp --flat-playlist -J
#[derive(Debug, Clone, Deserialize)]
pub struct YtPlaylist {
    #[serde(default)]
    pub entries: Vec<YtFlatEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YtFlatEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

impl From<YtFlatEntry> for PlaylistEntry {
    fn from(entry: YtFlatEntry) -> Self {
        let url = entry
            .url
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", entry.id));
        Self {
            title: entry.title.unwrap_or_else(|| entry.id.clone()),
            id: entry.id,
            url,
            thumbnails: entry.thumbnails,
        }
    }
}

// yt-dlp -J <video>
#[derive(Debug, Clone, Deserialize)]
pub struct YtVideo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Epoch seconds
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// `YYYYMMDD`
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Seconds, may be fractional
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

impl YtVideo {
    fn upload_time(&self) -> Option<DateTime<Utc>> {
        if let Some(ts) = self.timestamp {
            return DateTime::from_timestamp(ts, 0);
        }
        let date = NaiveDate::parse_from_str(self.upload_date.as_deref()?, "%Y%m%d").ok()?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    }
}

impl From<YtVideo> for VideoDetails {
    fn from(video: YtVideo) -> Self {
        let upload_date = video.upload_time();
        let duration = video
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(Duration::from_secs_f64);
        Self {
            title: video.title.unwrap_or_else(|| video.id.clone()),
            author: video.channel.or(video.uploader).unwrap_or_default(),
            description: video.description.unwrap_or_default(),
            id: video.id,
            upload_date,
            duration,
            thumbnails: video.thumbnails,
        }
    }
}
