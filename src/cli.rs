use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::workflow::{JobRequest, LayoutChoice, TrimRange, VideoSource};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole pipeline: acquire, trim, caption, lay out, split
    Process(ProcessArgs),

    /// Download a YouTube video into the upload directory
    Download {
        /// Video URL
        url: String,

        /// Download directory (defaults to the configured upload directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Cut a time range out of a video without re-encoding
    Trim {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Start time in seconds
        #[arg(long)]
        start: f64,

        /// End time in seconds
        #[arg(long)]
        end: f64,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run many trims in parallel from a JSON manifest
    TrimBatch {
        /// JSON array of {"input", "start", "end", "output"} objects
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Transcribe a video into a re-segmented SRT file
    Transcribe {
        /// Input video or audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum words per caption (overrides config)
        #[arg(short, long)]
        words_per_sub: Option<usize>,
    },

    /// Burn an SRT file into a video
    Burn {
        /// Input video file
        #[arg(long)]
        video: PathBuf,

        /// Subtitle file
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Stack two videos vertically
    Stack {
        /// Top video file
        #[arg(short, long)]
        top: PathBuf,

        /// Bottom video file
        #[arg(short, long)]
        bottom: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Apply the vertical zoom layout
    Zoom {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a video into fixed-length chunks
    Split {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Chunk length in seconds (overrides config)
        #[arg(short = 'l', long)]
        chunk_length: Option<u32>,

        /// Directory for the chunks
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// List videos available for stacking
    Bottoms,

    /// Check that the external tools can be found
    Doctor,

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(default_value = "clipstack.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ClapArgs, Debug)]
pub struct ProcessArgs {
    /// YouTube URL of the main video
    #[arg(short = 'u', long, conflicts_with = "input", required_unless_present = "input")]
    pub youtube_url: Option<String>,

    /// Local main video file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Trim start in seconds
    #[arg(long, default_value_t = 0.0)]
    pub start: f64,

    /// Trim end in seconds; trimming happens only when end > start
    #[arg(long, default_value_t = 0.0)]
    pub end: f64,

    /// Bottom video (file name inside the bottom videos directory)
    #[arg(short, long)]
    pub bottom: Option<String>,

    /// Apply the vertical zoom layout (ignored when a bottom video is chosen)
    #[arg(short, long)]
    pub zoom: bool,

    /// Split the final video into chunks
    #[arg(long)]
    pub chunk: bool,

    /// Chunk length in seconds (overrides config)
    #[arg(short = 'l', long)]
    pub chunk_length: Option<u32>,
}

impl ProcessArgs {
    pub fn to_job_request(&self, default_chunk_length: u32) -> JobRequest {
        let source = match (&self.youtube_url, &self.input) {
            (Some(url), _) => VideoSource::YouTube(url.trim().to_string()),
            (None, Some(path)) => VideoSource::Local(path.clone()),
            (None, None) => VideoSource::YouTube(String::new()),
        };

        let layout = match (&self.bottom, self.zoom) {
            (Some(bottom), _) if !bottom.is_empty() => LayoutChoice::StackWith(bottom.clone()),
            (_, true) => LayoutChoice::VerticalZoom,
            _ => LayoutChoice::Plain,
        };

        let trim = TrimRange {
            start: self.start,
            end: self.end,
        };

        JobRequest {
            source,
            trim: trim.is_active().then_some(trim),
            layout,
            chunk_length: self
                .chunk
                .then(|| self.chunk_length.unwrap_or(default_chunk_length)),
        }
    }
}
