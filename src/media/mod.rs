// Media processing over external tools
//
// - commands: argument-list command builder for ffmpeg and ffprobe
// - layout: vertical zoom geometry
// - processor: the ffmpeg-backed implementation of MediaProcessorTrait

pub mod commands;
pub mod layout;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use layout::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Cut `[start, end]` seconds out of a video
    async fn trim(&self, input_path: &Path, start: f64, end: f64, output_path: &Path) -> Result<()>;

    /// Burn an SRT file into the video frames
    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Stack two videos on top of each other
    async fn stack_vertical(
        &self,
        top_path: &Path,
        bottom_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Probe the source, plan the layout and render the vertical zoom
    async fn create_vertical_zoom(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<ZoomLayout>;

    /// Split into `chunk_length_secs` pieces inside `chunk_dir`
    async fn split_into_chunks(
        &self,
        input_path: &Path,
        chunk_length_secs: u32,
        chunk_dir: &Path,
    ) -> Result<()>;

    /// Resolution of the first video stream
    async fn probe_resolution(&self, input_path: &Path) -> Result<VideoResolution>;

    /// Check if the media tools are available
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
