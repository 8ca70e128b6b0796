//! Interactive session: path acquisition and the per-URL read loop.
//!
//! The session owns the console protocol. It is generic over its input and
//! output streams so the whole interaction can be driven from in-memory
//! buffers in tests.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::fetcher::AudioFetcher;
use crate::core::models::{AppError, AppResult};
use crate::utils::file_utils::{absolutize, dir_is_writable, ensure_dir_exists};
use crate::utils::validation::is_youtube_url;

const SEPARATOR_WIDTH: usize = 50;

/// State carried across loop iterations.
///
/// The output directory is validated once, before any download, and never
/// changes for the rest of the session. The attempt counter increments once
/// per dispatched URL whether or not the dispatch succeeded.
#[derive(Debug)]
pub struct SessionState {
    output_dir: PathBuf,
    attempted: u64,
}

impl SessionState {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            attempted: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn attempted(&self) -> u64 {
        self.attempted
    }

    fn record_attempt(&mut self) {
        self.attempted += 1;
    }
}

/// Interactive console session over arbitrary reader/writer pairs
pub struct Session<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` without a newline and read one line of input.
    /// Returns `None` when the input stream is exhausted.
    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Repeatedly prompt until a usable download directory is obtained.
    ///
    /// The returned path is absolute, exists, is a directory, and is writable
    /// by the current process. Missing directories are created (all parents)
    /// after a y/n confirmation. Every rejection prints a specific diagnostic
    /// and re-prompts; there is no retry limit.
    pub fn acquire_download_dir(&mut self) -> AppResult<PathBuf> {
        loop {
            let raw = self
                .prompt("Enter the absolute path where you want to save MP3 files: ")?
                .ok_or_else(input_closed)?;

            if raw.is_empty() {
                writeln!(self.output, "Please enter a valid path.")?;
                continue;
            }

            let path = absolutize(Path::new(&raw))?;

            if !path.exists() {
                let answer = self
                    .prompt(&format!(
                        "Path '{}' doesn't exist. Create it? (y/n): ",
                        path.display()
                    ))?
                    .ok_or_else(input_closed)?;

                if matches!(answer.to_lowercase().as_str(), "y" | "yes") {
                    match ensure_dir_exists(&path) {
                        Ok(()) => {
                            writeln!(self.output, "Created directory: {}", path.display())?;
                        }
                        Err(err) => {
                            writeln!(self.output, "Error creating directory: {}", err)?;
                            continue;
                        }
                    }
                } else {
                    continue;
                }
            }

            if !path.is_dir() {
                writeln!(self.output, "The path must be a directory, not a file.")?;
                continue;
            }

            if !dir_is_writable(&path) {
                writeln!(
                    self.output,
                    "You don't have write permission to this directory."
                )?;
                continue;
            }

            return Ok(path);
        }
    }

    /// Run the URL loop until the user submits an empty line.
    ///
    /// Rejected URLs re-prompt without touching the counter; accepted URLs
    /// increment it exactly once whether the dispatch succeeds or fails.
    pub async fn run(
        &mut self,
        fetcher: &dyn AudioFetcher,
        state: &mut SessionState,
    ) -> AppResult<()> {
        loop {
            let url = self
                .prompt("Enter YouTube URL (or press Enter to exit): ")?
                .unwrap_or_default();

            if url.is_empty() {
                break;
            }

            if !is_youtube_url(&url) {
                writeln!(self.output, "Please enter a valid YouTube URL.")?;
                continue;
            }

            writeln!(self.output, "\nProcessing: {}", url)?;
            self.dispatch(fetcher, &url, state.output_dir().to_path_buf())
                .await?;
            state.record_attempt();
            writeln!(self.output, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        }

        writeln!(
            self.output,
            "\nDownload session completed. Total files downloaded: {}",
            state.attempted()
        )?;
        writeln!(self.output, "Thank you for using YouTube to MP3 Downloader!")?;
        Ok(())
    }

    /// Per-item boundary: failures are reported and swallowed so the loop
    /// always continues. Only console IO errors propagate.
    async fn dispatch(
        &mut self,
        fetcher: &dyn AudioFetcher,
        url: &str,
        output_dir: PathBuf,
    ) -> AppResult<()> {
        match self.try_dispatch(fetcher, url, &output_dir).await {
            Ok(title) => {
                info!(%url, %title, "download completed");
                Ok(())
            }
            Err(err) => {
                warn!(%url, error = %err, "download failed");
                // Only a broken console can end the session here; fetch
                // failures of every kind stay inside the item boundary.
                writeln!(self.output, "✗ Error downloading {}: {}", url, err)?;
                Ok(())
            }
        }
    }

    async fn try_dispatch(
        &mut self,
        fetcher: &dyn AudioFetcher,
        url: &str,
        output_dir: &Path,
    ) -> AppResult<String> {
        let meta = fetcher.fetch_metadata(url).await?;

        writeln!(self.output, "Title: {}", meta.title)?;
        if let Some(duration) = meta.formatted_duration() {
            writeln!(self.output, "Duration: {}", duration)?;
        }

        writeln!(self.output, "Downloading and converting to MP3...")?;
        self.output.flush()?;
        fetcher.download(url, output_dir).await?;

        writeln!(self.output, "✓ Successfully downloaded: {}", meta.title)?;
        Ok(meta.title)
    }
}

fn input_closed() -> AppError {
    AppError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "input stream closed before a download path was chosen",
    ))
}
