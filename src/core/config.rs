//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub audio: AudioSettings,
    pub tools: ToolSettings,
}

/// Audio transcoding settings handed to the fetch tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Target MP3 bitrate in kbps
    pub bitrate_kbps: u32,
    /// Output sample rate in Hz, forced during conversion
    pub sample_rate_hz: u32,
}

/// External tool locations. `None` means lookup on PATH.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSettings {
    pub ytdlp_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio: AudioSettings::default(),
            tools: ToolSettings::default(),
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            bitrate_kbps: 192,
            sample_rate_hz: 44_100,
        }
    }
}

impl AppConfig {
    /// Load configuration from file, creating default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved configuration to: {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("io", "tube2mp3", "tube2mp3")
            .with_context(|| "Failed to get project directories")?;

        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(32..=320).contains(&self.audio.bitrate_kbps) {
            anyhow::bail!("MP3 bitrate should be between 32 and 320 kbps");
        }

        const VALID_SAMPLE_RATES: [u32; 4] = [22_050, 32_000, 44_100, 48_000];
        if !VALID_SAMPLE_RATES.contains(&self.audio.sample_rate_hz) {
            anyhow::bail!(
                "Invalid sample rate: {} Hz (expected one of {:?})",
                self.audio.sample_rate_hz,
                VALID_SAMPLE_RATES
            );
        }

        if let Some(ref path) = self.tools.ytdlp_path {
            if !path.is_file() {
                anyhow::bail!("Configured yt-dlp path does not exist: {}", path.display());
            }
        }
        if let Some(ref path) = self.tools.ffmpeg_path {
            if !path.is_file() {
                anyhow::bail!("Configured ffmpeg path does not exist: {}", path.display());
            }
        }

        Ok(())
    }
}
