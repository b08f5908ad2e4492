//! CLI module for ytdumper

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "ytdumper", about = "Archive new YouTube playlist videos as tagged MP3s")]
#[command(version, author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a JSON config file
    #[arg(short, long, global = true, env = "YTDUMPER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Flags that override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Playlist URL or id to watch
    #[arg(short, long, global = true, env = "YTDUMPER_PLAYLIST")]
    pub playlist: Option<String>,

    /// Directory receiving downloaded files
    #[arg(long, global = true, env = "YTDUMPER_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// File listing already downloaded video ids
    #[arg(long, global = true, env = "YTDUMPER_CACHE")]
    pub cache_file: Option<PathBuf>,

    /// Seconds between playlist checks
    #[arg(short, long, global = true, env = "YTDUMPER_INTERVAL")]
    pub interval: Option<u64>,

    /// yt-dlp executable
    #[arg(long, global = true, env = "YTDUMPER_YT_DLP")]
    pub yt_dlp: Option<PathBuf>,

    /// Also append logs to this file
    #[arg(long, global = true, env = "YTDUMPER_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl From<SettingsArgs> for Overrides {
    fn from(args: SettingsArgs) -> Self {
        Self {
            playlist: args.playlist,
            download_dir: args.download_dir,
            cache_path: args.cache_file,
            poll_interval_secs: args.interval,
            yt_dlp_path: args.yt_dlp,
            log_file: args.log_file,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the playlist until interrupted (default)
    Run,

    /// Check the playlist once and exit
    Once,

    /// Show configuration and how many videos are cached
    Status,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags_after_subcommand() {
        let cli = Cli::parse_from(["ytdumper", "once", "--playlist", "PL1", "-i", "30"]);

        assert!(matches!(cli.command, Some(Commands::Once)));
        let overrides = Overrides::from(cli.settings);
        assert_eq!(overrides.playlist.as_deref(), Some("PL1"));
        assert_eq!(overrides.poll_interval_secs, Some(30));
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::parse_from(["ytdumper", "-v"]);
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }
}
