use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{ClipError, Result};
use crate::media::MediaCommand;
use crate::subtitle::Segment;
use super::{TranscriberTrait, Transcription};

/// JSON written by `whisper --output_format json`
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperOutput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<WhisperSegment>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl From<WhisperOutput> for Transcription {
    fn from(output: WhisperOutput) -> Self {
        let segments = output
            .segments
            .into_iter()
            .map(|seg| Segment::new(seg.start, seg.end, seg.text.trim()))
            .collect();

        Transcription {
            text: output.text.trim().to_string(),
            segments,
            language: output.language.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Transcriber backed by the OpenAI whisper command-line tool
pub struct WhisperTranscriber {
    config: TranscriberConfig,
}

impl WhisperTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    pub fn build_command(&self, media_path: &Path, output_dir: &Path) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.config.binary_path, "Whisper transcription")
            .output(media_path)
            .arg("--model")
            .arg(&self.config.model)
            .arg("--output_dir")
            .arg(output_dir.to_string_lossy().to_string())
            .args(["--output_format", "json", "--verbose", "False"]);

        if let Some(language) = &self.config.language {
            cmd = cmd.arg("--language").arg(language);
        }

        cmd
    }

    /// Where whisper writes the JSON for `media_path`
    pub fn json_output_path(media_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let stem = media_path
            .file_stem()
            .ok_or_else(|| ClipError::Transcriber("Invalid media filename".to_string()))?;
        Ok(output_dir.join(format!("{}.json", stem.to_string_lossy())))
    }

    pub fn parse_output(json: &str) -> Result<Transcription> {
        let output: WhisperOutput = serde_json::from_str(json)
            .map_err(|e| ClipError::Transcriber(format!("Failed to parse whisper JSON: {}", e)))?;
        Ok(output.into())
    }
}

#[async_trait]
impl TranscriberTrait for WhisperTranscriber {
    async fn transcribe(&self, media_path: &Path) -> Result<Transcription> {
        info!(
            "Transcribing {} with whisper model '{}'",
            media_path.display(),
            self.config.model
        );

        let temp_dir = tempfile::tempdir().map_err(|e| {
            ClipError::Transcriber(format!("Failed to create temp directory: {}", e))
        })?;
        let output_dir = temp_dir.path();

        self.build_command(media_path, output_dir)
            .execute()
            .await
            .map_err(|e| ClipError::Transcriber(e.to_string()))?;

        let json_file = Self::json_output_path(media_path, output_dir)?;
        if !json_file.exists() {
            return Err(ClipError::Transcriber(
                "Whisper JSON output file not found".to_string(),
            ));
        }

        let json_content = tokio::fs::read_to_string(&json_file)
            .await
            .map_err(|e| ClipError::Transcriber(format!("Failed to read JSON output: {}", e)))?;

        let transcription = Self::parse_output(&json_content)?;
        debug!(
            "Whisper returned {} segments (language: {})",
            transcription.segments.len(),
            transcription.language
        );

        Ok(transcription)
    }

    async fn check_availability(&self) -> Result<()> {
        MediaCommand::new(&self.config.binary_path, "Whisper help")
            .arg("--help")
            .execute()
            .await
            .map_err(|e| ClipError::Transcriber(format!("whisper not available: {}", e)))?;

        info!("Whisper command-line tool is available");
        Ok(())
    }
}
