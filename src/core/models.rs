//! Core data models for the downloader session

use serde::Deserialize;

/// Video metadata as reported by the fetch tool before downloading.
///
/// Deserialized from the JSON document that `yt-dlp --dump-json` prints;
/// fields the session does not use are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub id: String,

    #[serde(default = "unknown_title")]
    pub title: String,

    /// Duration in seconds. yt-dlp reports fractional seconds for some
    /// extractors and omits the field for live streams.
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub uploader: Option<String>,

    #[serde(default)]
    pub webpage_url: Option<String>,
}

fn unknown_title() -> String {
    "Unknown".to_string()
}

impl VideoMetadata {
    /// Whole-second duration, `None` when unknown or zero.
    pub fn duration_secs(&self) -> Option<u64> {
        self.duration
            .map(|secs| secs.round() as u64)
            .filter(|secs| *secs > 0)
    }

    /// Duration formatted as `MM:SS`. Minutes are not capped at 59.
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration_secs()
            .map(|total| format!("{:02}:{:02}", total / 60, total % 60))
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{tool} is not available: {message}")]
    ToolMissing { tool: String, message: String },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
