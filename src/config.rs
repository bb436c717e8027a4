use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClipError, Result};
use crate::subtitle::DEFAULT_WORDS_PER_SUB;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
    pub subtitle: SubtitleConfig,
    pub downloader: DownloaderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Intermediate files (trimmed, subtitled videos and SRT files)
    pub temp_dir: PathBuf,
    /// Final videos and chunk folders
    pub output_dir: PathBuf,
    /// Downloaded and imported source videos
    pub upload_dir: PathBuf,
    /// Library of videos that can be stacked under the main video
    pub bottom_videos_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_binary_path: String,
    /// Font size used when burning subtitles
    pub subtitle_font_size: u32,
    /// Frame rate of the vertical zoom output
    pub output_frame_rate: u32,
    pub video_codec: String,
    pub audio_codec: String,
    /// Default chunk length in seconds when splitting
    pub chunk_length_secs: u32,
    /// Additional encoding options appended to re-encoding commands
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub encode_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Path to the whisper command-line tool
    pub binary_path: String,
    /// Whisper model name (tiny, base, small, medium, large)
    pub model: String,
    /// Source language hint; auto-detected when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Maximum number of words per caption
    pub words_per_sub: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Path to yt-dlp binary
    pub binary_path: String,
    /// yt-dlp format selector
    pub format: String,
    /// Container used when merging separate video and audio streams
    pub merge_output_format: String,
    pub force_ipv4: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("temp"),
            output_dir: PathBuf::from("output"),
            upload_dir: PathBuf::from("temp").join("uploads"),
            bottom_videos_dir: PathBuf::from("videos"),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_binary_path: "ffprobe".to_string(),
            subtitle_font_size: 18,
            output_frame_rate: 30,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            chunk_length_secs: 60,
            encode_options: vec![],
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper".to_string(),
            model: "tiny".to_string(),
            language: None,
        }
    }
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            words_per_sub: DEFAULT_WORDS_PER_SUB,
        }
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            binary_path: "yt-dlp".to_string(),
            format: "bestvideo+bestaudio/best".to_string(),
            merge_output_format: "mp4".to_string(),
            force_ipv4: true,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClipError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClipError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ClipError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.subtitle.words_per_sub == 0 {
            return Err(ClipError::Config(
                "subtitle.words_per_sub must be a positive integer".to_string(),
            ));
        }
        if self.media.chunk_length_secs == 0 {
            return Err(ClipError::Config(
                "media.chunk_length_secs must be a positive integer".to_string(),
            ));
        }

        let binaries = [
            ("media.binary_path", &self.media.binary_path),
            ("media.probe_binary_path", &self.media.probe_binary_path),
            ("transcriber.binary_path", &self.transcriber.binary_path),
            ("downloader.binary_path", &self.downloader.binary_path),
        ];
        for (name, value) in binaries {
            if value.trim().is_empty() {
                return Err(ClipError::Config(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }
}

impl PathsConfig {
    /// Create the working directories; directories that already exist are left alone
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.temp_dir, &self.output_dir, &self.upload_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                ClipError::Config(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
