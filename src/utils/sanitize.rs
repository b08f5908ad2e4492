//! Filename sanitization utilities

use std::sync::LazyLock;

use regex::Regex;

/// Character used in place of every run of illegal characters
const SUBSTITUTE: &str = "_";

/// Characters rejected in file names on at least one major platform,
/// including the ASCII control range.
const ILLEGAL_CLASS: &str = r#"[<>:"/\\|?*\x00-\x1F]"#;

/// Either a (possibly empty) illegal run followed by trailing dots, or a
/// plain illegal run anywhere in the name.
static ILLEGAL_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:{ILLEGAL_CLASS}*\.+$)|(?:{ILLEGAL_CLASS}+)"))
        .expect("filename pattern is a valid regex")
});

/// Turn a video title into the shared root name of its sidecar files
///
/// The title is trimmed, every run of illegal characters (and any run that
/// ends in trailing periods) collapses to a single `_`, and spaces become
/// `_` so the name survives unquoted in shells and playlists.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(root_file_name("My:Video*Title?"), "My_Video_Title_");
/// assert_eq!(root_file_name("Live at the Fillmore"), "Live_at_the_Fillmore");
/// ```
pub fn root_file_name(title: &str) -> String {
    ILLEGAL_RUN
        .replace_all(title.trim(), SUBSTITUTE)
        .replace(' ', SUBSTITUTE)
}
