//! yt-dlp integration: tool probes, metadata retrieval, and the
//! download-and-convert dispatch.
//!
//! All of the actual extraction, downloading, and transcoding work is done by
//! the external `yt-dlp` executable (which in turn drives `ffmpeg`); this
//! module only builds invocations and classifies their failures.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use crate::core::config::{AudioSettings, ToolSettings};
use crate::core::models::{AppError, AppResult, VideoMetadata};

/// The slice of the fetch tool the session loop depends on
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Retrieve metadata for a single video without downloading anything
    async fn fetch_metadata(&self, url: &str) -> AppResult<VideoMetadata>;

    /// Download the best audio stream and convert it to MP3 inside `output_dir`
    async fn download(&self, url: &str, output_dir: &Path) -> AppResult<()>;
}

/// Fetcher backed by the external yt-dlp executable
pub struct YtDlpFetcher {
    audio: AudioSettings,
    ytdlp: PathBuf,
    ffmpeg: Option<PathBuf>,
}

impl YtDlpFetcher {
    pub fn new(audio: AudioSettings, tools: &ToolSettings) -> Self {
        Self {
            audio,
            ytdlp: tools
                .ytdlp_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("yt-dlp")),
            ffmpeg: tools.ffmpeg_path.clone(),
        }
    }

    /// Verify that yt-dlp answers a version probe. Returns the version line.
    pub async fn probe_ytdlp(&self) -> AppResult<String> {
        probe_tool(&self.ytdlp, &["--version"], "yt-dlp").await
    }

    /// Advisory probe for the conversion binary; the session proceeds when
    /// this fails, since yt-dlp may still locate ffmpeg on its own later.
    pub async fn probe_ffmpeg(&self) -> AppResult<String> {
        let ffmpeg = self
            .ffmpeg
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        probe_tool(&ffmpeg, &["-version"], "ffmpeg").await
    }

    fn download_args(&self, url: &str, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--format".into(),
            "bestaudio/best".into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            "mp3".into(),
            "--audio-quality".into(),
            format!("{}K", self.audio.bitrate_kbps).into(),
            "--postprocessor-args".into(),
            format!("ffmpeg:-ar {}", self.audio.sample_rate_hz).into(),
            "--prefer-ffmpeg".into(),
            "--no-keep-video".into(),
            "--no-playlist".into(),
            "--output".into(),
            output_dir.join("%(title)s.%(ext)s").into_os_string(),
        ];

        if let Some(ref ffmpeg) = self.ffmpeg {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.clone().into_os_string());
        }

        args.push(url.into());
        args
    }

    fn spawn_error(&self, err: std::io::Error) -> AppError {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::ToolMissing {
                tool: "yt-dlp".to_string(),
                message: format!("{} not found on PATH", self.ytdlp.display()),
            },
            _ => AppError::Io(err),
        }
    }
}

#[async_trait]
impl AudioFetcher for YtDlpFetcher {
    async fn fetch_metadata(&self, url: &str) -> AppResult<VideoMetadata> {
        debug!(%url, "fetching video metadata");

        let output = Command::new(&self.ytdlp)
            .args(["--dump-json", "--no-download", "--no-playlist", "--no-warnings"])
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::Metadata(format!("Failed to parse yt-dlp output: {}", e)))
    }

    async fn download(&self, url: &str, output_dir: &Path) -> AppResult<()> {
        debug!(%url, output_dir = %output_dir.display(), "dispatching download");

        let mut child = Command::new(&self.ytdlp)
            .args(self.download_args(url, output_dir))
            .stdin(Stdio::null())
            // Progress lines stream straight to the console; stderr is
            // collected so failures can be classified.
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stderr_text = String::new();
        if let Some(mut stderr) = child.stderr.take() {
            stderr
                .read_to_string(&mut stderr_text)
                .await
                .map_err(AppError::Io)?;
        }

        let status = child.wait().await.map_err(AppError::Io)?;
        if status.success() {
            Ok(())
        } else {
            Err(classify_failure(&stderr_text))
        }
    }
}

async fn probe_tool(program: &Path, args: &[&str], tool: &str) -> AppResult<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::ToolMissing {
                tool: tool.to_string(),
                message: format!("{} not found on PATH", program.display()),
            },
            _ => AppError::Io(e),
        })?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    } else {
        Err(AppError::ToolMissing {
            tool: tool.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Map a failed yt-dlp run to an error kind using its stderr
fn classify_failure(stderr: &str) -> AppError {
    let message = failure_message(stderr);
    let lowered = stderr.to_lowercase();

    if lowered.contains("unsupported url") {
        AppError::UnsupportedUrl(message)
    } else if lowered.contains("postprocess") || lowered.contains("ffmpeg") {
        AppError::Conversion(message)
    } else if lowered.contains("unable to extract")
        || lowered.contains("video unavailable")
        || lowered.contains("extractor")
    {
        AppError::Extraction(message)
    } else {
        AppError::Download(message)
    }
}

/// Last ERROR line yt-dlp printed, falling back to the last non-empty line
fn failure_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| "yt-dlp exited with a failure status".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;

    fn test_fetcher() -> YtDlpFetcher {
        let config = AppConfig::default();
        YtDlpFetcher::new(config.audio, &config.tools)
    }

    #[test]
    fn test_download_args_carry_transcode_settings() {
        let fetcher = test_fetcher();
        let args = fetcher.download_args("https://youtu.be/abc", Path::new("/tmp/music"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.contains(&"bestaudio/best".to_string()));
        assert!(args.contains(&"--extract-audio".to_string()));
        assert!(args.contains(&"mp3".to_string()));
        assert!(args.contains(&"192K".to_string()));
        assert!(args.contains(&"ffmpeg:-ar 44100".to_string()));
        assert!(args.contains(&"--no-keep-video".to_string()));
        assert!(args.iter().any(|a| a.ends_with("%(title)s.%(ext)s") && a.starts_with("/tmp/music")));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }

    #[test]
    fn test_download_args_pin_ffmpeg_location_when_configured() {
        let config = AppConfig::default();
        let mut tools = config.tools.clone();
        tools.ffmpeg_path = Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        let fetcher = YtDlpFetcher::new(config.audio, &tools);

        let args = fetcher.download_args("https://youtu.be/abc", Path::new("/tmp"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.contains(&"--ffmpeg-location".to_string()));
        assert!(args.contains(&"/opt/ffmpeg/bin/ffmpeg".to_string()));
    }

    #[test]
    fn test_classify_unsupported_url() {
        let err = classify_failure("ERROR: Unsupported URL: https://example.com/clip");
        assert!(matches!(err, AppError::UnsupportedUrl(_)));
    }

    #[test]
    fn test_classify_conversion_failure() {
        let err = classify_failure("ERROR: Postprocessing: audio conversion failed");
        assert!(matches!(err, AppError::Conversion(_)));

        let err = classify_failure("ERROR: ffmpeg not found. Please install or provide the path");
        assert!(matches!(err, AppError::Conversion(_)));
    }

    #[test]
    fn test_classify_extraction_failure() {
        let err = classify_failure("ERROR: [youtube] abc: Video unavailable");
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_classify_defaults_to_download_failure() {
        let err = classify_failure("ERROR: Connection reset by peer");
        assert!(matches!(err, AppError::Download(_)));
    }

    #[test]
    fn test_failure_message_prefers_error_lines() {
        let stderr = "WARNING: something minor\nERROR: the real problem\n";
        assert_eq!(failure_message(stderr), "ERROR: the real problem");
    }

    #[test]
    fn test_failure_message_falls_back_to_last_line() {
        assert_eq!(failure_message("some noise\nlast line\n"), "last line");
        assert_eq!(
            failure_message(""),
            "yt-dlp exited with a failure status"
        );
    }

    #[tokio::test]
    async fn test_probe_reports_missing_tool() {
        let config = AppConfig::default();
        let tools = ToolSettings {
            ytdlp_path: Some(PathBuf::from("/nonexistent/bin/yt-dlp")),
            ffmpeg_path: None,
        };
        let fetcher = YtDlpFetcher::new(config.audio, &tools);

        let err = fetcher.probe_ytdlp().await.unwrap_err();
        assert!(matches!(err, AppError::ToolMissing { ref tool, .. } if tool == "yt-dlp"));
    }

    #[tokio::test]
    async fn test_fetch_metadata_reports_missing_tool() {
        let config = AppConfig::default();
        let tools = ToolSettings {
            ytdlp_path: Some(PathBuf::from("/nonexistent/bin/yt-dlp")),
            ffmpeg_path: None,
        };
        let fetcher = YtDlpFetcher::new(config.audio, &tools);

        let err = fetcher
            .fetch_metadata("https://youtu.be/abc")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ToolMissing { .. }));
    }
}
