use std::io;

use tracing::{debug, error, info, warn};

use tube2mp3::core::config::AppConfig;
use tube2mp3::core::fetcher::YtDlpFetcher;
use tube2mp3::core::session::{Session, SessionState};
use tube2mp3::utils::logging::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    println!("=== YouTube to MP3 Downloader ===");
    println!("This tool downloads audio from YouTube videos and converts them to MP3.");
    println!("Press Enter without a URL to exit.\n");

    let config = load_initial_config();
    let fetcher = YtDlpFetcher::new(config.audio.clone(), &config.tools);

    // The fetch tool is required; bail out before any prompting.
    match fetcher.probe_ytdlp().await {
        Ok(version) => debug!(%version, "yt-dlp available"),
        Err(err) => {
            error!(error = %err, "yt-dlp probe failed");
            eprintln!("Error: yt-dlp is not installed or not on PATH.");
            eprintln!("Please install it from https://github.com/yt-dlp/yt-dlp");
            eprintln!("or using: pip install yt-dlp");
            std::process::exit(1);
        }
    }

    let mut session = Session::new(io::stdin().lock(), io::stdout());

    let output_dir = match session.acquire_download_dir() {
        Ok(dir) => dir,
        Err(err) => {
            error!(error = %err, "path acquisition failed");
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };
    println!("Download path set to: {}\n", output_dir.display());

    // Advisory only: yt-dlp may still find ffmpeg on its own later, or the
    // per-item dispatch will fail and be reported like any other error.
    match fetcher.probe_ffmpeg().await {
        Ok(version) => info!(%version, "ffmpeg available"),
        Err(err) => {
            warn!(error = %err, "ffmpeg probe failed");
            println!("Warning: FFmpeg not found. You may need to install FFmpeg for audio conversion.");
            println!("Download from: https://ffmpeg.org/download.html\n");
        }
    }

    let mut state = SessionState::new(output_dir);
    if let Err(err) = session.run(&fetcher, &mut state).await {
        error!(error = %err, "session ended abnormally");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn load_initial_config() -> AppConfig {
    match AppConfig::load() {
        Ok(config) => {
            if let Err(err) = config.validate() {
                warn!(
                    "Invalid configuration detected ({}), falling back to defaults",
                    err
                );
                AppConfig::default()
            } else {
                config
            }
        }
        Err(err) => {
            warn!(
                "Failed to load configuration from disk: {}. Using defaults",
                err
            );
            AppConfig::default()
        }
    }
}
