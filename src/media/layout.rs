//! Vertical zoom geometry.
//!
//! The zoom layout works on a 1920x1080 canvas. Sources that are too small to
//! fill it are letterboxed; larger sources get a centred 1920x1080 crop stacked
//! above the full frame scaled to 1920 wide.

use serde::Deserialize;
use std::fmt;

use crate::error::{ClipError, Result};

pub const TARGET_WIDTH: u32 = 1920;
pub const TARGET_HEIGHT: u32 = 1080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoResolution {
    pub width: u32,
    pub height: u32,
}

impl VideoResolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height after `scale=<target_width>:-2`: aspect ratio kept, rounded to
    /// the nearest even number so yuv420p encoders accept it
    pub fn scaled_height(&self, target_width: u32) -> u32 {
        if self.width == 0 {
            return 0;
        }
        let numerator = self.height as u64 * target_width as u64;
        let denominator = self.width as u64 * 2;
        (((numerator + denominator / 2) / denominator) * 2) as u32
    }
}

impl fmt::Display for VideoResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomLayout {
    /// Fit inside the canvas and pad the remainder
    Pad,
    /// Centre crop stacked above the full scaled frame
    CropStack,
}

impl ZoomLayout {
    pub fn filter_graph(&self) -> String {
        match self {
            ZoomLayout::Pad => format!(
                "scale={w}:{h}:force_original_aspect_ratio=decrease:force_divisible_by=2,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
                w = TARGET_WIDTH,
                h = TARGET_HEIGHT
            ),
            ZoomLayout::CropStack => format!(
                "[0:v]scale={w}:-2[v1];\
                 [v1]split[vcrop][vfull];\
                 [vcrop]crop={w}:{h}:0:(ih-{h})/2[vzoom];\
                 [vzoom][vfull]vstack=inputs=2[outv]",
                w = TARGET_WIDTH,
                h = TARGET_HEIGHT
            ),
        }
    }

    /// Filter output that has to be mapped explicitly, if any
    pub fn output_label(&self) -> Option<&'static str> {
        match self {
            ZoomLayout::Pad => None,
            ZoomLayout::CropStack => Some("outv"),
        }
    }

    /// Output frame size for a given source
    pub fn output_resolution(&self, source: VideoResolution) -> VideoResolution {
        match self {
            ZoomLayout::Pad => VideoResolution::new(TARGET_WIDTH, TARGET_HEIGHT),
            ZoomLayout::CropStack => VideoResolution::new(
                TARGET_WIDTH,
                TARGET_HEIGHT + source.scaled_height(TARGET_WIDTH),
            ),
        }
    }
}

impl fmt::Display for ZoomLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoomLayout::Pad => write!(f, "pad"),
            ZoomLayout::CropStack => write!(f, "crop-stack"),
        }
    }
}

/// Choose the zoom layout for a source resolution
pub fn plan_vertical_zoom(resolution: VideoResolution, source: &str) -> Result<ZoomLayout> {
    if resolution.width == 0 || resolution.height == 0 {
        return Err(ClipError::NoVideoStream(source.to_string()));
    }

    // A wide source can be tall enough but still shorter than the canvas once scaled.
    if resolution.height < TARGET_HEIGHT || resolution.scaled_height(TARGET_WIDTH) < TARGET_HEIGHT {
        Ok(ZoomLayout::Pad)
    } else {
        Ok(ZoomLayout::CropStack)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Read the first video stream's size from ffprobe JSON; zero when absent
pub fn parse_probe_output(json: &str) -> Result<VideoResolution> {
    let probe: ProbeOutput = serde_json::from_str(json)?;
    Ok(probe
        .streams
        .first()
        .map(|s| VideoResolution::new(s.width.unwrap_or(0), s.height.unwrap_or(0)))
        .unwrap_or(VideoResolution::new(0, 0)))
}
