// Speech-to-text over the whisper command-line tool
//
// The transcriber produces coarse Segments; the subtitle module re-cuts them
// into caption-sized chunks.

pub mod whisper;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::TranscriberConfig;
use crate::error::Result;
use crate::subtitle::Segment;

/// Transcript of one media file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    pub segments: Vec<Segment>,
    pub language: String,
}

impl Transcription {
    /// End of the last segment, if any
    pub fn duration(&self) -> Option<f64> {
        self.segments.last().map(|seg| seg.end)
    }
}

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe the audio track of a media file
    async fn transcribe(&self, media_path: &Path) -> Result<Transcription>;

    /// Check if the transcriber is available
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    pub fn create_default(config: TranscriberConfig) -> Box<dyn TranscriberTrait> {
        Box::new(whisper::WhisperTranscriber::new(config))
    }
}
