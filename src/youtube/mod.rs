//! YouTube video source module

pub mod client;
pub mod models;
pub mod source;

pub use client::YtDlpClient;
pub use models::*;
pub use source::VideoSource;
