use std::fmt;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::{ClipError, Result};
use super::layout::ZoomLayout;

/// Target width of stacked and zoomed output
pub const STACK_WIDTH: u32 = 1920;

/// Abstract external tool command: binary plus an argument list, never a shell string
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy all streams without re-encoding
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Add a complex filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Select a stream or filter output for the output file
    pub fn map<S: Into<String>>(self, spec: S) -> Self {
        self.arg("-map").arg(spec)
    }

    /// Set output frame rate
    pub fn frame_rate(self, fps: u32) -> Self {
        self.arg("-r").arg(fps.to_string())
    }

    /// Start position in seconds
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(seconds.to_string())
    }

    /// End position in seconds
    pub fn until(self, seconds: f64) -> Self {
        self.arg("-to").arg(seconds.to_string())
    }

    async fn run(&self) -> Result<std::process::Output> {
        debug!("Executing {}: {}", self.description, self);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| {
                ClipError::Media(format!("Failed to execute {}: {}", self.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClipError::Media(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(output)
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }

    /// Execute the command and return its standard output
    pub async fn execute_capture(&self) -> Result<String> {
        let output = self.run().await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary_path)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

fn backslash_escape(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a path used as a filter option value inside a filtergraph.
///
/// ffmpeg unescapes twice: the graph parser first, then the filter's option
/// parser, which also splits on `:`. Escape for the option level, then escape
/// that result again for the graph level.
pub fn escape_filter_path(path: &Path) -> String {
    let option_level = backslash_escape(&path.to_string_lossy(), &['\\', ':', '\'']);
    backslash_escape(&option_level, &['\\', '\'', ',', ';', '[', ']'])
}

/// Builder for the pipeline's ffmpeg and ffprobe invocations
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    config: MediaConfig,
}

impl MediaCommandBuilder {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    fn ffmpeg<S: Into<String>>(&self, description: S) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, description)
    }

    fn encode_with_defaults(&self, cmd: MediaCommand) -> MediaCommand {
        cmd.video_codec(&self.config.video_codec)
            .audio_codec(&self.config.audio_codec)
            .args(self.config.encode_options.iter().cloned())
    }

    /// Cut `[start, end]` out of the input without re-encoding
    pub fn trim<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        start: f64,
        end: f64,
        output_path: Q,
    ) -> MediaCommand {
        self.ffmpeg(format!("Trim video ({}s to {}s)", start, end))
            .overwrite()
            .input(input_path)
            .seek(start)
            .until(end)
            .copy_streams()
            .output(output_path)
    }

    /// Render subtitles onto the video frames
    pub fn burn_subtitles<P: AsRef<Path>, S: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: S,
        output_path: Q,
    ) -> MediaCommand {
        let filter = format!(
            "subtitles={}:force_style='FontSize={}'",
            escape_filter_path(subtitle_path.as_ref()),
            self.config.subtitle_font_size
        );

        let cmd = self
            .ffmpeg("Subtitle burning")
            .overwrite()
            .input(video_path)
            .video_filter(filter);

        self.encode_with_defaults(cmd).output(output_path)
    }

    /// Stack two videos vertically, both scaled to the same width
    pub fn stack_vertical<P: AsRef<Path>, B: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        top_path: P,
        bottom_path: B,
        output_path: Q,
    ) -> MediaCommand {
        let graph = format!(
            "[0:v]scale={w}:-2[v0];[1:v]scale={w}:-2[v1];[v0][v1]vstack=inputs=2",
            w = STACK_WIDTH
        );

        let cmd = self
            .ffmpeg("Vertical stacking")
            .overwrite()
            .input(top_path)
            .input(bottom_path)
            .filter_complex(graph);

        self.encode_with_defaults(cmd).output(output_path)
    }

    /// Apply a planned vertical zoom layout
    pub fn vertical_zoom<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        layout: ZoomLayout,
        output_path: Q,
    ) -> MediaCommand {
        let mut cmd = self
            .ffmpeg(format!("Vertical zoom ({})", layout))
            .overwrite()
            .input(input_path)
            .filter_complex(layout.filter_graph());

        if let Some(label) = layout.output_label() {
            cmd = cmd.map(format!("[{}]", label)).map("0:a?");
        }

        let cmd = cmd
            .video_codec(&self.config.video_codec)
            .frame_rate(self.config.output_frame_rate)
            .audio_codec(&self.config.audio_codec)
            .args(self.config.encode_options.iter().cloned());

        cmd.output(output_path)
    }

    /// Split into fixed-length pieces named chunk_000.mp4, chunk_001.mp4, ...
    pub fn split_into_chunks<P: AsRef<Path>, D: AsRef<Path>>(
        &self,
        input_path: P,
        chunk_length_secs: u32,
        chunk_dir: D,
    ) -> MediaCommand {
        self.ffmpeg(format!("Split into {}s chunks", chunk_length_secs))
            .overwrite()
            .input(input_path)
            .copy_streams()
            .map("0")
            .arg("-f")
            .arg("segment")
            .arg("-segment_time")
            .arg(chunk_length_secs.to_string())
            .arg("-reset_timestamps")
            .arg("1")
            .output(chunk_dir.as_ref().join("chunk_%03d.mp4"))
    }

    /// Query the first video stream as JSON
    pub fn probe_resolution<P: AsRef<Path>>(&self, input_path: P) -> MediaCommand {
        MediaCommand::new(&self.config.probe_binary_path, "Resolution probe")
            .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .args(["-select_streams", "v:0"])
            .output(input_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        self.ffmpeg("Version check").arg("-version")
    }

    pub fn probe_version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.config.probe_binary_path, "Probe version check").arg("-version")
    }
}
