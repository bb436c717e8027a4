use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid segment: {0}")]
    InvalidSegment(String),

    #[error("Segment text is empty (segment {start:.3}s - {end:.3}s)")]
    EmptySegmentText { start: f64, end: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("No valid video stream found in {0}")]
    NoVideoStream(String),

    #[error("Transcription error: {0}")]
    Transcriber(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, ClipError>;
