//! `<root>.xml` metadata sidecar written next to each downloaded track

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::se::Serializer;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// Metadata captured for one video at ingest time
#[derive(Debug, Clone, Default)]
pub struct MediaMetadata {
    pub title: String,
    pub author: String,
    pub upload_date: Option<DateTime<Utc>>,
    pub description: String,
    pub duration: Option<Duration>,
    /// Raw bytes of the best-resolution thumbnail
    pub thumbnail: Option<Vec<u8>>,
}

/// On-disk shape of the sidecar
#[derive(Debug, Serialize)]
#[serde(rename = "Video")]
struct SidecarRecord<'a> {
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Author")]
    author: &'a str,
    #[serde(rename = "UploadDate", skip_serializing_if = "Option::is_none")]
    upload_date: Option<String>,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Duration", skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
    #[serde(rename = "Thumbnail", skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
}

impl<'a> From<&'a MediaMetadata> for SidecarRecord<'a> {
    fn from(meta: &'a MediaMetadata) -> Self {
        Self {
            title: &meta.title,
            author: &meta.author,
            upload_date: meta
                .upload_date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            description: &meta.description,
            duration: meta.duration.map(format_duration),
            thumbnail: meta.thumbnail.as_deref().map(|bytes| STANDARD.encode(bytes)),
        }
    }
}

/// Format a duration as `HH:MM:SS`
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Render metadata as an indented XML document
pub fn to_xml(meta: &MediaMetadata) -> Result<String> {
    let mut body = String::new();
    let mut serializer = Serializer::new(&mut body);
    serializer.indent(' ', 2);
    SidecarRecord::from(meta)
        .serialize(serializer)
        .context("Failed to serialize metadata")?;

    Ok(format!("{XML_DECLARATION}{body}\n"))
}

/// Write the sidecar, replacing any existing file at `path`
pub async fn write_sidecar(path: &Path, meta: &MediaMetadata) -> Result<()> {
    let xml = to_xml(meta)?;
    tokio::fs::write(path, xml)
        .await
        .with_context(|| format!("Failed to write metadata to {}", path.display()))?;

    debug!("Wrote metadata: {}", path.display());
    Ok(())
}
