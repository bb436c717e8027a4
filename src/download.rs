use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DownloaderConfig;
use crate::error::{ClipError, Result};
use crate::media::MediaCommand;

/// Fetches remote videos into a local directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Download `url` into `download_dir`, returning the final video path
    async fn download(&self, url: &str, download_dir: &Path) -> Result<PathBuf>;

    /// Check if the downloader is available
    async fn check_availability(&self) -> Result<()>;
}

/// Downloader backed by yt-dlp
pub struct YtDlpDownloader {
    config: DownloaderConfig,
}

impl YtDlpDownloader {
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    pub fn build_command(&self, url: &str, download_dir: &Path, file_prefix: &str) -> MediaCommand {
        let template = download_dir.join(format!("{}__%(title)s.%(ext)s", file_prefix));

        let mut cmd = MediaCommand::new(&self.config.binary_path, "YouTube download")
            .arg("--no-playlist")
            .arg("-f")
            .arg(&self.config.format)
            .arg("--merge-output-format")
            .arg(&self.config.merge_output_format);

        if self.config.force_ipv4 {
            cmd = cmd.arg("--force-ipv4");
        }

        cmd.arg("-o")
            .arg(template.to_string_lossy().to_string())
            .args(["--print", "after_move:filepath", "--no-simulate"])
            .arg(url)
    }

    /// Final file path from yt-dlp's printed output
    pub fn reported_path(stdout: &str) -> Option<PathBuf> {
        stdout
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
    }

    /// Make sure the downloaded file carries the merge container's extension
    pub async fn normalize_extension(&self, downloaded: &Path) -> Result<PathBuf> {
        let final_path = downloaded.with_extension(&self.config.merge_output_format);

        if final_path != downloaded && !final_path.exists() && downloaded.exists() {
            info!(
                "Renaming {} -> {}",
                downloaded.display(),
                final_path.display()
            );
            tokio::fs::rename(downloaded, &final_path).await?;
        }

        Ok(final_path)
    }
}

pub fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(url)
    } else {
        Err(ClipError::Download(format!("Unsupported video URL: '{}'", url)))
    }
}

/// Short random id used to keep file names from colliding
pub fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[async_trait]
impl VideoDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, download_dir: &Path) -> Result<PathBuf> {
        let url = validate_url(url)?;
        tokio::fs::create_dir_all(download_dir).await?;

        info!("Downloading {} into {}", url, download_dir.display());

        let stdout = self
            .build_command(url, download_dir, &short_id())
            .execute_capture()
            .await
            .map_err(|e| ClipError::Download(e.to_string()))?;

        let downloaded = Self::reported_path(&stdout).ok_or_else(|| {
            ClipError::Download("yt-dlp did not report a downloaded file".to_string())
        })?;

        let final_path = self.normalize_extension(&downloaded).await?;
        if !final_path.exists() {
            warn!("yt-dlp reported {} but it does not exist", final_path.display());
            return Err(ClipError::FileNotFound(final_path.display().to_string()));
        }

        info!("Downloaded {}", final_path.display());
        Ok(final_path)
    }

    async fn check_availability(&self) -> Result<()> {
        MediaCommand::new(&self.config.binary_path, "yt-dlp version check")
            .arg("--version")
            .execute()
            .await
            .map_err(|e| ClipError::Download(format!("yt-dlp not available: {}", e)))?;
        Ok(())
    }
}
