//! Application configuration
//!
//! Settings come from built-in defaults, then an optional JSON file
//! (`~/.config/ytdumper/config.json` unless `--config` is given), then
//! command-line flags and their environment variables. The result is
//! resolved once at startup and never changes afterwards.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONFIG_FILE: &str = "config.json";
const DEFAULT_CACHE_FILE: &str = "downloads.cache";
const DEFAULT_POLL_SECS: u64 = 5;

/// Values read from the JSON config file; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FileConfig {
    pub playlist: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
    pub yt_dlp_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Load from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location, or defaults if there is no file
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `<config dir>/ytdumper/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ytdumper").join(CONFIG_FILE))
    }
}

/// Overrides from the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub playlist: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
    pub yt_dlp_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

/// Effective, immutable configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Playlist URL or bare playlist id
    pub playlist: Option<String>,
    /// Where `.mp3`, `.jpg` and `.xml` files are written
    pub download_dir: PathBuf,
    /// Plain-text list of ingested ids
    pub cache_path: PathBuf,
    /// True when `cache_path` was derived from `download_dir`
    pub cache_path_is_default: bool,
    pub poll_interval: Duration,
    /// yt-dlp executable name or path
    pub yt_dlp_path: PathBuf,
    /// Optional file receiving a copy of the log
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Merge file values and overrides over the defaults
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let download_dir = overrides
            .download_dir
            .or(file.download_dir)
            .unwrap_or_else(default_download_dir);

        let explicit_cache = overrides.cache_path.or(file.cache_path);
        let cache_path_is_default = explicit_cache.is_none();
        let cache_path =
            explicit_cache.unwrap_or_else(|| download_dir.join(DEFAULT_CACHE_FILE));

        let poll_secs = overrides
            .poll_interval_secs
            .or(file.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_SECS);
        if poll_secs == 0 {
            anyhow::bail!("Poll interval must be at least one second");
        }

        Ok(Self {
            playlist: overrides.playlist.or(file.playlist),
            download_dir,
            cache_path,
            cache_path_is_default,
            poll_interval: Duration::from_secs(poll_secs),
            yt_dlp_path: overrides
                .yt_dlp_path
                .or(file.yt_dlp_path)
                .unwrap_or_else(|| PathBuf::from("yt-dlp")),
            log_file: overrides.log_file.or(file.log_file),
        })
    }

    /// Load the file layer (explicit path or default location) and resolve
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => FileConfig::load_from(path)?,
            None => FileConfig::load_default()?,
        };
        Self::resolve(file, overrides)
    }

    /// The playlist, required by the commands that poll
    pub fn require_playlist(&self) -> Result<&str> {
        self.playlist.as_deref().context(
            "No playlist configured; pass --playlist, set YTDUMPER_PLAYLIST, or add \"playlist\" to the config file",
        )
    }
}

fn default_download_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytdumper")
}
