use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{ClipError, Result};
use super::layout::{parse_probe_output, plan_vertical_zoom, VideoResolution, ZoomLayout};
use super::{MediaCommandBuilder, MediaProcessorTrait};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(config.clone());

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn trim(
        &self,
        input_path: &Path,
        start: f64,
        end: f64,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Trimming {} [{}s - {}s] -> {}",
            input_path.display(),
            start,
            end,
            output_path.display()
        );

        self.command_builder
            .trim(input_path, start, end, output_path)
            .execute()
            .await
    }

    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Burning subtitles from {} into {} -> {}",
            subtitle_path.display(),
            video_path.display(),
            output_path.display()
        );

        self.command_builder
            .burn_subtitles(video_path, subtitle_path, output_path)
            .execute()
            .await?;

        info!("Subtitle burning completed");
        Ok(())
    }

    async fn stack_vertical(
        &self,
        top_path: &Path,
        bottom_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Stacking {} above {} -> {}",
            top_path.display(),
            bottom_path.display(),
            output_path.display()
        );

        if !bottom_path.exists() {
            return Err(ClipError::FileNotFound(bottom_path.display().to_string()));
        }

        self.command_builder
            .stack_vertical(top_path, bottom_path, output_path)
            .execute()
            .await
    }

    async fn create_vertical_zoom(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<ZoomLayout> {
        let resolution = self.probe_resolution(input_path).await?;
        let layout = plan_vertical_zoom(resolution, &input_path.display().to_string())?;

        info!(
            "Vertical zoom for {} ({}): {} layout, output {}",
            input_path.display(),
            resolution,
            layout,
            layout.output_resolution(resolution)
        );

        self.command_builder
            .vertical_zoom(input_path, layout, output_path)
            .execute()
            .await?;

        Ok(layout)
    }

    async fn split_into_chunks(
        &self,
        input_path: &Path,
        chunk_length_secs: u32,
        chunk_dir: &Path,
    ) -> Result<()> {
        if chunk_length_secs == 0 {
            return Err(ClipError::Config(
                "Chunk length must be a positive number of seconds".to_string(),
            ));
        }

        info!(
            "Splitting {} into {}s chunks under {}",
            input_path.display(),
            chunk_length_secs,
            chunk_dir.display()
        );

        tokio::fs::create_dir_all(chunk_dir).await?;

        self.command_builder
            .split_into_chunks(input_path, chunk_length_secs, chunk_dir)
            .execute()
            .await
    }

    async fn probe_resolution(&self, input_path: &Path) -> Result<VideoResolution> {
        let json = self
            .command_builder
            .probe_resolution(input_path)
            .execute_capture()
            .await?;

        let resolution = parse_probe_output(&json)?;
        debug!("Probed {}: {}", input_path.display(), resolution);
        Ok(resolution)
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| {
                ClipError::Media(format!(
                    "Media processor '{}' not available: {}",
                    self.config.binary_path, e
                ))
            })?;

        self.command_builder
            .probe_version_check()
            .execute()
            .await
            .map_err(|e| {
                ClipError::Media(format!(
                    "Media probe '{}' not available: {}",
                    self.config.probe_binary_path, e
                ))
            })?;

        info!("Media processor is available");
        Ok(())
    }
}
