use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::media::MediaCommand;

/// Availability of one external tool
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: String,
    pub binary_path: String,
    pub available: bool,
    /// First line of the tool's version output, or the failure reason
    pub detail: String,
}

pub struct SetupManager;

impl SetupManager {
    /// Validate the configuration and create the working directories.
    ///
    /// Safe to call repeatedly; existing directories are kept as they are.
    pub fn initialize(config: &Config) -> Result<()> {
        info!("Initializing clipstack workspace...");
        config.validate()?;
        config.paths.ensure_directories()?;

        info!(
            "Workspace ready - temp: {}, output: {}, uploads: {}",
            config.paths.temp_dir.display(),
            config.paths.output_dir.display(),
            config.paths.upload_dir.display()
        );
        Ok(())
    }

    /// Version-check commands for every external tool the pipeline invokes
    pub fn tool_checks(config: &Config) -> Vec<(&'static str, MediaCommand)> {
        vec![
            (
                "ffmpeg",
                MediaCommand::new(&config.media.binary_path, "ffmpeg version").arg("-version"),
            ),
            (
                "ffprobe",
                MediaCommand::new(&config.media.probe_binary_path, "ffprobe version")
                    .arg("-version"),
            ),
            (
                "whisper",
                MediaCommand::new(&config.transcriber.binary_path, "whisper help").arg("--help"),
            ),
            (
                "yt-dlp",
                MediaCommand::new(&config.downloader.binary_path, "yt-dlp version")
                    .arg("--version"),
            ),
        ]
    }

    /// Run every tool check and report the result of each
    pub async fn check_tools(config: &Config) -> Vec<ToolStatus> {
        let mut statuses = Vec::new();

        for (name, command) in Self::tool_checks(config) {
            let binary_path = command.binary_path.clone();
            let status = match command.execute_capture().await {
                Ok(stdout) => ToolStatus {
                    name: name.to_string(),
                    binary_path,
                    available: true,
                    detail: stdout.lines().next().unwrap_or("").trim().to_string(),
                },
                Err(e) => {
                    warn!("{} check failed: {}", name, e);
                    ToolStatus {
                        name: name.to_string(),
                        binary_path,
                        available: false,
                        detail: e.to_string(),
                    }
                }
            };
            statuses.push(status);
        }

        statuses
    }
}
