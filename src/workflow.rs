use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::download::{short_id, VideoDownloader, YtDlpDownloader};
use crate::error::{ClipError, Result};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::subtitle::{split_segment, write_srt, Segment, SubtitleChunk};
use crate::transcribe::{TranscriberFactory, TranscriberTrait};

/// Where the main video comes from
#[derive(Debug, Clone, PartialEq)]
pub enum VideoSource {
    YouTube(String),
    Local(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    /// Trimming only happens when the range is non-empty
    pub fn is_active(&self) -> bool {
        self.end > self.start
    }

    /// A range that will be cut must start at or after zero and end after it starts
    pub fn validate(&self) -> Result<()> {
        if !(self.start >= 0.0 && self.end > self.start && self.end.is_finite()) {
            return Err(ClipError::Config(format!(
                "Invalid trim range {}s - {}s",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// What to do with the subtitled video
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutChoice {
    Plain,
    /// File name of a video in the bottom videos directory
    StackWith(String),
    VerticalZoom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub source: VideoSource,
    pub trim: Option<TrimRange>,
    pub layout: LayoutChoice,
    /// Split the final video into pieces of this many seconds
    pub chunk_length: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobOutput {
    pub final_video: Option<PathBuf>,
    pub chunk_files: Vec<PathBuf>,
}

/// One independent trim in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimJob {
    pub input: PathBuf,
    pub start: f64,
    pub end: f64,
    pub output: PathBuf,
}

impl TrimJob {
    pub fn range(&self) -> TrimRange {
        TrimRange {
            start: self.start,
            end: self.end,
        }
    }
}

pub struct Workflow {
    config: Config,
    media: Arc<dyn MediaProcessorTrait>,
    transcriber: Box<dyn TranscriberTrait>,
    downloader: Box<dyn VideoDownloader>,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let media: Arc<dyn MediaProcessorTrait> =
            Arc::from(MediaProcessorFactory::create_processor(config.media.clone()));
        let transcriber = TranscriberFactory::create_default(config.transcriber.clone());
        let downloader = Box::new(YtDlpDownloader::new(config.downloader.clone()));

        Self::with_components(config, media, transcriber, downloader)
    }

    pub fn with_components(
        config: Config,
        media: Arc<dyn MediaProcessorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
        downloader: Box<dyn VideoDownloader>,
    ) -> Self {
        Self {
            config,
            media,
            transcriber,
            downloader,
        }
    }

    pub fn media(&self) -> &dyn MediaProcessorTrait {
        self.media.as_ref()
    }

    /// Check the tools a full job needs
    pub async fn check_dependencies(&self) -> Result<()> {
        self.media.check_availability().await?;
        self.transcriber.check_availability().await
    }

    /// Run a complete job: acquire, trim, subtitle, lay out, split
    pub async fn run(&self, job: &JobRequest) -> Result<JobOutput> {
        let trim = job.trim.filter(TrimRange::is_active);
        if let Some(range) = trim {
            range.validate()?;
        }

        let temp_dir = &self.config.paths.temp_dir;
        let output_dir = &self.config.paths.output_dir;
        fs::create_dir_all(temp_dir).await?;
        fs::create_dir_all(output_dir).await?;

        // Step 1: Acquire the main video
        let mut main_video = self.acquire(&job.source).await?;
        info!("Main video: {}", main_video.display());

        // Step 2: Optional trim
        if let Some(range) = trim {
            let trimmed = temp_dir.join(format!("{}_trimmed.mp4", short_id()));
            self.media.trim(&main_video, range.start, range.end, &trimmed).await?;
            main_video = trimmed;
        }

        // Step 3: Transcribe and write captions
        let srt_path = temp_dir.join(format!("{}.srt", short_id()));
        let chunk_count = self.generate_subtitles(&main_video, &srt_path).await?;

        // Step 4: Burn captions
        let subtitled = temp_dir.join(format!("{}_subtitled.mp4", short_id()));
        if chunk_count > 0 {
            self.media.burn_subtitles(&main_video, &srt_path, &subtitled).await?;
        } else {
            warn!("No speech found, keeping the video without subtitles");
            fs::copy(&main_video, &subtitled).await?;
        }

        // Step 5: Stack, zoom, or keep as is
        let final_path = output_dir.join(format!("{}_final.mp4", short_id()));
        self.apply_layout(&subtitled, &job.layout, &final_path).await?;

        // Step 6: Optional chunking
        if let Some(chunk_length) = job.chunk_length {
            let chunk_dir = output_dir.join(format!("chunks_{}", short_id()));
            let chunk_files = self.split(&final_path, chunk_length, &chunk_dir).await?;
            return Ok(JobOutput {
                final_video: None,
                chunk_files,
            });
        }

        info!("Job finished: {}", final_path.display());
        Ok(JobOutput {
            final_video: Some(final_path),
            chunk_files: Vec::new(),
        })
    }

    /// Bring the source video into the upload directory
    pub async fn acquire(&self, source: &VideoSource) -> Result<PathBuf> {
        let upload_dir = &self.config.paths.upload_dir;
        fs::create_dir_all(upload_dir).await?;

        let path = match source {
            VideoSource::YouTube(url) => self.downloader.download(url, upload_dir).await?,
            VideoSource::Local(path) => self.import_local(path).await?,
        };

        if !path.exists() {
            return Err(ClipError::FileNotFound(path.display().to_string()));
        }
        Ok(path)
    }

    async fn import_local(&self, source: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(ClipError::FileNotFound(source.display().to_string()));
        }

        let original_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut file_name = sanitize_filename(&original_name);
        if file_name.is_empty() {
            file_name = format!("{}.mp4", short_id());
        }

        let destination = self.config.paths.upload_dir.join(file_name);
        if is_same_file(source, &destination).await? {
            return Ok(destination);
        }

        info!("Importing {} -> {}", source.display(), destination.display());
        fs::copy(source, &destination).await?;
        Ok(destination)
    }

    /// Transcribe a video and write re-segmented captions, returning the chunk count
    pub async fn generate_subtitles(&self, video_path: &Path, srt_path: &Path) -> Result<usize> {
        let transcription = self.transcriber.transcribe(video_path).await?;
        info!(
            "Transcribed {} segments covering {:.1}s (language: {})",
            transcription.segments.len(),
            transcription.duration().unwrap_or(0.0),
            transcription.language
        );

        let chunks = caption_chunks(
            &transcription.segments,
            self.config.subtitle.words_per_sub,
        )?;
        write_srt(&chunks, srt_path).await?;
        Ok(chunks.len())
    }

    async fn apply_layout(&self, input: &Path, layout: &LayoutChoice, output: &Path) -> Result<()> {
        match layout {
            LayoutChoice::StackWith(bottom_name) => {
                let bottom = self.bottom_video_path(bottom_name)?;
                self.media.stack_vertical(input, &bottom, output).await
            }
            LayoutChoice::VerticalZoom => {
                let layout = self.media.create_vertical_zoom(input, output).await?;
                info!("Applied {} vertical zoom", layout);
                Ok(())
            }
            LayoutChoice::Plain => {
                // temp and output dirs may sit on different filesystems
                fs::copy(input, output).await?;
                fs::remove_file(input).await?;
                Ok(())
            }
        }
    }

    /// Resolve a bottom video name inside the bottom videos directory
    pub fn bottom_video_path(&self, name: &str) -> Result<PathBuf> {
        let is_plain_name = Path::new(name).file_name().map(|n| n == name).unwrap_or(false);
        if !is_plain_name {
            return Err(ClipError::Config(format!(
                "Bottom video must be a file name, got '{}'",
                name
            )));
        }

        let path = self.config.paths.bottom_videos_dir.join(name);
        if !path.is_file() {
            return Err(ClipError::FileNotFound(path.display().to_string()));
        }
        Ok(path)
    }

    /// Split a video into chunks and list the produced files
    pub async fn split(
        &self,
        input: &Path,
        chunk_length_secs: u32,
        chunk_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(chunk_dir).await?;
        self.media
            .split_into_chunks(input, chunk_length_secs, chunk_dir)
            .await?;

        let chunk_files = list_chunk_files(chunk_dir)?;
        info!(
            "Split {} into {} chunks in {}",
            input.display(),
            chunk_files.len(),
            chunk_dir.display()
        );
        Ok(chunk_files)
    }

    /// Trim independent jobs in parallel; the first failure aborts the rest
    pub async fn trim_many(&self, jobs: Vec<TrimJob>) -> Result<Vec<PathBuf>> {
        validate_trim_jobs(&jobs)?;

        let progress = ProgressBar::new(jobs.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map_err(|e| ClipError::Config(format!("Invalid progress template: {}", e)))?
                .progress_chars("#>-"),
        );

        let mut tasks = JoinSet::new();
        for job in jobs {
            let media = Arc::clone(&self.media);
            tasks.spawn(async move {
                media
                    .trim(&job.input, job.start, job.end, &job.output)
                    .await
                    .map(|_| job.output)
            });
        }

        let mut outputs = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let output = joined
                .map_err(|e| ClipError::Media(format!("Trim task failed: {}", e)))??;
            progress.set_message(output.display().to_string());
            progress.inc(1);
            outputs.push(output);
        }

        progress.finish_with_message("done");
        Ok(outputs)
    }

    /// Videos that can be stacked under the main video
    pub fn list_bottom_videos(&self) -> Vec<String> {
        let dir = &self.config.paths.bottom_videos_dir;
        if !dir.is_dir() {
            return Vec::new();
        }

        let mut names: Vec<String> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".mp4") && !name.contains("main"))
            .collect();

        names.sort();
        names
    }
}

/// Re-segment transcript segments into captions.
///
/// Segments without words are silence and get dropped; any other malformed
/// segment fails the whole job.
pub fn caption_chunks(segments: &[Segment], words_per_sub: usize) -> Result<Vec<SubtitleChunk>> {
    let mut chunks = Vec::new();
    for segment in segments {
        match split_segment(segment, words_per_sub) {
            Ok(pieces) => chunks.extend(pieces),
            Err(ClipError::EmptySegmentText { start, end }) => {
                warn!("Skipping segment without words ({:.3}s - {:.3}s)", start, end);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(chunks)
}

/// Whether two paths name the same existing file, however they are spelled
async fn is_same_file(a: &Path, b: &Path) -> Result<bool> {
    if !fs::try_exists(b).await? {
        return Ok(false);
    }
    Ok(fs::canonicalize(a).await? == fs::canonicalize(b).await?)
}

/// Sorted .mp4 files directly inside `dir`
pub fn list_chunk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ClipError::Io(e.into()))?;
        let path = entry.path();
        let is_mp4 = path.extension().map(|ext| ext == "mp4").unwrap_or(false);
        if entry.file_type().is_file() && is_mp4 {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Reduce an uploaded file name to a safe ASCII name
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            sanitized.push(c);
        } else if c.is_whitespace() {
            sanitized.push('_');
        }
    }

    sanitized.trim_matches(|c| c == '.' || c == '_').to_string()
}

fn validate_trim_jobs(jobs: &[TrimJob]) -> Result<()> {
    let mut outputs = HashSet::new();
    for job in jobs {
        job.range().validate()?;
        if !outputs.insert(job.output.as_path()) {
            return Err(ClipError::Config(format!(
                "Output {} is used by more than one trim job",
                job.output.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::MockVideoDownloader;
    use crate::media::{MockMediaProcessorTrait, ZoomLayout};
    use crate::transcribe::{MockTranscriberTrait, Transcription};
    use assert_fs::TempDir;

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.temp_dir = root.join("temp");
        config.paths.output_dir = root.join("output");
        config.paths.upload_dir = root.join("temp").join("uploads");
        config.paths.bottom_videos_dir = root.join("videos");
        config.subtitle.words_per_sub = 3;
        config.paths.ensure_directories().unwrap();
        config
    }

    fn transcription() -> Transcription {
        Transcription {
            text: "one two three four five six seven".to_string(),
            segments: vec![
                Segment::new(0.0, 2.0, "one two three four"),
                Segment::new(2.0, 2.5, "   "),
                Segment::new(2.5, 4.0, "five six seven"),
            ],
            language: "en".to_string(),
        }
    }

    fn transcriber_returning(result: Transcription) -> MockTranscriberTrait {
        let mut transcriber = MockTranscriberTrait::new();
        transcriber
            .expect_transcribe()
            .times(1)
            .returning(move |_| Ok(result.clone()));
        transcriber
    }

    fn write_source(root: &Path, name: &str) -> PathBuf {
        let path = root.join(name);
        std::fs::write(&path, b"source video").unwrap();
        path
    }

    fn local_job(source: PathBuf, layout: LayoutChoice) -> JobRequest {
        JobRequest {
            source: VideoSource::Local(source),
            trim: None,
            layout,
            chunk_length: None,
        }
    }

    #[tokio::test]
    async fn test_plain_job_burns_resegmented_subtitles() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let source = write_source(root.path(), "My Clip (1).mp4");

        let mut media = MockMediaProcessorTrait::new();
        media.expect_trim().never();
        media
            .expect_burn_subtitles()
            .times(1)
            .returning(|video, srt, output| {
                assert!(video.ends_with("temp/uploads/My_Clip_1.mp4"));
                let content = std::fs::read_to_string(srt)?;
                assert!(content.starts_with("1\n00:00:00,000 --> 00:00:01,000\none two three\n\n"));
                assert!(content.contains("2\n00:00:01,000 --> 00:00:02,000\nfour\n\n"));
                assert!(content.contains("3\n00:00:02,500 --> 00:00:04,000\nfive six seven\n\n"));
                assert!(!content.contains("\n4\n"));
                std::fs::write(output, b"subtitled")?;
                Ok(())
            });

        let workflow = Workflow::with_components(
            config.clone(),
            Arc::new(media),
            Box::new(transcriber_returning(transcription())),
            Box::new(MockVideoDownloader::new()),
        );

        let output = workflow
            .run(&local_job(source, LayoutChoice::Plain))
            .await
            .unwrap();

        let final_video = output.final_video.unwrap();
        assert!(final_video.starts_with(&config.paths.output_dir));
        assert_eq!(std::fs::read(&final_video).unwrap(), b"subtitled");
        assert!(output.chunk_files.is_empty());
    }

    #[tokio::test]
    async fn test_trim_runs_only_for_non_empty_range() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let source = write_source(root.path(), "clip.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_trim()
            .withf(|_, start, end, output| {
                *start == 5.0 && *end == 12.5 && output.to_string_lossy().ends_with("_trimmed.mp4")
            })
            .times(1)
            .returning(|_, _, _, output| {
                std::fs::write(output, b"trimmed")?;
                Ok(())
            });
        media
            .expect_burn_subtitles()
            .times(1)
            .returning(|video, _, output| {
                assert!(video.to_string_lossy().ends_with("_trimmed.mp4"));
                std::fs::write(output, b"subtitled")?;
                Ok(())
            });

        let workflow = Workflow::with_components(
            config,
            Arc::new(media),
            Box::new(transcriber_returning(transcription())),
            Box::new(MockVideoDownloader::new()),
        );

        let mut job = local_job(source, LayoutChoice::Plain);
        job.trim = Some(TrimRange { start: 5.0, end: 12.5 });
        workflow.run(&job).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_trim_range_is_ignored() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let source = write_source(root.path(), "clip.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media.expect_trim().never();
        media.expect_burn_subtitles().returning(|_, _, output| {
            std::fs::write(output, b"subtitled")?;
            Ok(())
        });

        let workflow = Workflow::with_components(
            config,
            Arc::new(media),
            Box::new(transcriber_returning(transcription())),
            Box::new(MockVideoDownloader::new()),
        );

        let mut job = local_job(source, LayoutChoice::Plain);
        job.trim = Some(TrimRange { start: 0.0, end: 0.0 });
        assert!(workflow.run(&job).await.is_ok());
    }

    #[tokio::test]
    async fn test_youtube_job_stacks_with_bottom_video_and_splits() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        std::fs::create_dir_all(&config.paths.bottom_videos_dir).unwrap();
        write_source(&config.paths.bottom_videos_dir, "parkour.mp4");

        let mut downloader = MockVideoDownloader::new();
        downloader
            .expect_download()
            .withf(|url, _| url == "https://www.youtube.com/watch?v=abc")
            .times(1)
            .returning(|_, dir| {
                let path = dir.join("1234abcd__Title.mp4");
                std::fs::write(&path, b"downloaded")?;
                Ok(path)
            });

        let mut media = MockMediaProcessorTrait::new();
        media.expect_burn_subtitles().returning(|_, _, output| {
            std::fs::write(output, b"subtitled")?;
            Ok(())
        });
        media
            .expect_stack_vertical()
            .times(1)
            .returning(|_, bottom, output| {
                assert!(bottom.ends_with("videos/parkour.mp4"));
                std::fs::write(output, b"stacked")?;
                Ok(())
            });
        media.expect_create_vertical_zoom().never();
        media
            .expect_split_into_chunks()
            .withf(|_, length, _| *length == 60)
            .times(1)
            .returning(|_, _, dir| {
                std::fs::write(dir.join("chunk_001.mp4"), b"b")?;
                std::fs::write(dir.join("chunk_000.mp4"), b"a")?;
                std::fs::write(dir.join("notes.txt"), b"x")?;
                Ok(())
            });

        let workflow = Workflow::with_components(
            config,
            Arc::new(media),
            Box::new(transcriber_returning(transcription())),
            Box::new(downloader),
        );

        let job = JobRequest {
            source: VideoSource::YouTube("https://www.youtube.com/watch?v=abc".to_string()),
            trim: None,
            layout: LayoutChoice::StackWith("parkour.mp4".to_string()),
            chunk_length: Some(60),
        };
        let output = workflow.run(&job).await.unwrap();

        assert!(output.final_video.is_none());
        let names: Vec<_> = output
            .chunk_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["chunk_000.mp4", "chunk_001.mp4"]);
    }

    #[tokio::test]
    async fn test_vertical_zoom_layout() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let source = write_source(root.path(), "clip.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media.expect_burn_subtitles().returning(|_, _, output| {
            std::fs::write(output, b"subtitled")?;
            Ok(())
        });
        media
            .expect_create_vertical_zoom()
            .times(1)
            .returning(|_, output| {
                std::fs::write(output, b"zoomed")?;
                Ok(ZoomLayout::CropStack)
            });

        let workflow = Workflow::with_components(
            config,
            Arc::new(media),
            Box::new(transcriber_returning(transcription())),
            Box::new(MockVideoDownloader::new()),
        );

        let output = workflow
            .run(&local_job(source, LayoutChoice::VerticalZoom))
            .await
            .unwrap();
        assert_eq!(std::fs::read(output.final_video.unwrap()).unwrap(), b"zoomed");
    }

    #[tokio::test]
    async fn test_silent_video_is_not_burned() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let source = write_source(root.path(), "silent.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media.expect_burn_subtitles().never();

        let workflow = Workflow::with_components(
            config,
            Arc::new(media),
            Box::new(transcriber_returning(Transcription::default())),
            Box::new(MockVideoDownloader::new()),
        );

        let output = workflow
            .run(&local_job(source, LayoutChoice::Plain))
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(output.final_video.unwrap()).unwrap(),
            b"source video"
        );
    }

    #[tokio::test]
    async fn test_malformed_segment_aborts_job() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let source = write_source(root.path(), "clip.mp4");

        let mut media = MockMediaProcessorTrait::new();
        media.expect_burn_subtitles().never();

        let bad = Transcription {
            segments: vec![Segment::new(3.0, 1.0, "backwards")],
            ..Transcription::default()
        };
        let workflow = Workflow::with_components(
            config,
            Arc::new(media),
            Box::new(transcriber_returning(bad)),
            Box::new(MockVideoDownloader::new()),
        );

        let result = workflow.run(&local_job(source, LayoutChoice::Plain)).await;
        assert!(matches!(result, Err(ClipError::InvalidSegment(_))));
    }

    #[tokio::test]
    async fn test_failed_download_aborts_job() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());

        let mut downloader = MockVideoDownloader::new();
        downloader
            .expect_download()
            .returning(|_, _| Err(ClipError::Download("network down".to_string())));
        let mut transcriber = MockTranscriberTrait::new();
        transcriber.expect_transcribe().never();

        let workflow = Workflow::with_components(
            config,
            Arc::new(MockMediaProcessorTrait::new()),
            Box::new(transcriber),
            Box::new(downloader),
        );

        let job = JobRequest {
            source: VideoSource::YouTube("https://youtu.be/x".to_string()),
            trim: None,
            layout: LayoutChoice::Plain,
            chunk_length: None,
        };
        assert!(matches!(
            workflow.run(&job).await,
            Err(ClipError::Download(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let root = TempDir::new().unwrap();
        let workflow = Workflow::with_components(
            test_config(root.path()),
            Arc::new(MockMediaProcessorTrait::new()),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockVideoDownloader::new()),
        );

        let result = workflow
            .acquire(&VideoSource::Local(root.path().join("nope.mp4")))
            .await;
        assert!(matches!(result, Err(ClipError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_local_file_already_in_upload_dir_is_kept_intact() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let upload_dir = config.paths.upload_dir.clone();
        std::fs::write(upload_dir.join("clip.mp4"), b"original bytes").unwrap();

        let workflow = Workflow::with_components(
            config,
            Arc::new(MockMediaProcessorTrait::new()),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockVideoDownloader::new()),
        );

        let roundabout = upload_dir.join("..").join("uploads").join("clip.mp4");
        let path = workflow
            .acquire(&VideoSource::Local(roundabout))
            .await
            .unwrap();

        assert_eq!(path, upload_dir.join("clip.mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"original bytes");
    }

    #[tokio::test]
    async fn test_trim_many_runs_every_job() {
        let root = TempDir::new().unwrap();
        let mut media = MockMediaProcessorTrait::new();
        media.expect_trim().times(3).returning(|_, _, _, output| {
            std::fs::write(output, b"part")?;
            Ok(())
        });

        let workflow = Workflow::with_components(
            test_config(root.path()),
            Arc::new(media),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockVideoDownloader::new()),
        );

        let jobs: Vec<TrimJob> = (0..3)
            .map(|i| TrimJob {
                input: root.path().join("in.mp4"),
                start: i as f64 * 10.0,
                end: i as f64 * 10.0 + 5.0,
                output: root.path().join(format!("part_{}.mp4", i)),
            })
            .collect();

        let mut outputs = workflow.trim_many(jobs).await.unwrap();
        outputs.sort();
        assert_eq!(outputs.len(), 3);
        assert!(outputs.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn test_trim_many_fails_on_first_error() {
        let root = TempDir::new().unwrap();
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_trim()
            .returning(|_, _, _, _| Err(ClipError::Media("Trim video failed".to_string())));

        let workflow = Workflow::with_components(
            test_config(root.path()),
            Arc::new(media),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockVideoDownloader::new()),
        );

        let jobs = vec![TrimJob {
            input: root.path().join("in.mp4"),
            start: 0.0,
            end: 1.0,
            output: root.path().join("a.mp4"),
        }];
        assert!(matches!(
            workflow.trim_many(jobs).await,
            Err(ClipError::Media(_))
        ));
    }

    #[test]
    fn test_validate_trim_jobs() {
        let job = |start: f64, end: f64, output: &str| TrimJob {
            input: PathBuf::from("in.mp4"),
            start,
            end,
            output: PathBuf::from(output),
        };

        assert!(validate_trim_jobs(&[job(0.0, 1.0, "a.mp4"), job(1.0, 2.0, "b.mp4")]).is_ok());
        assert!(validate_trim_jobs(&[job(2.0, 1.0, "a.mp4")]).is_err());
        assert!(validate_trim_jobs(&[job(0.0, 1.0, "a.mp4"), job(1.0, 2.0, "a.mp4")]).is_err());
        assert!(validate_trim_jobs(&[job(-1.0, 5.0, "a.mp4")]).is_err());
    }

    #[tokio::test]
    async fn test_job_with_negative_trim_start_is_rejected() {
        let root = TempDir::new().unwrap();
        let source = write_source(root.path(), "clip.mp4");

        // No expectations: nothing may run before the range is rejected
        let workflow = Workflow::with_components(
            test_config(root.path()),
            Arc::new(MockMediaProcessorTrait::new()),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockVideoDownloader::new()),
        );

        let mut job = local_job(source, LayoutChoice::Plain);
        job.trim = Some(TrimRange { start: -1.0, end: 5.0 });

        assert!(matches!(workflow.run(&job).await, Err(ClipError::Config(_))));
        assert!(!root.path().join("temp/uploads/clip.mp4").exists());
    }

    #[test]
    fn test_list_bottom_videos_filters_main_and_non_mp4() {
        let root = TempDir::new().unwrap();
        let config = test_config(root.path());
        let videos = &config.paths.bottom_videos_dir;
        std::fs::create_dir_all(videos).unwrap();
        for name in ["subway.mp4", "main_clip.mp4", "minecraft.mp4", "notes.txt"] {
            write_source(videos, name);
        }

        let workflow = Workflow::with_components(
            config,
            Arc::new(MockMediaProcessorTrait::new()),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockVideoDownloader::new()),
        );
        assert_eq!(workflow.list_bottom_videos(), vec!["minecraft.mp4", "subway.mp4"]);
    }

    #[test]
    fn test_list_bottom_videos_without_directory() {
        let root = TempDir::new().unwrap();
        let workflow = Workflow::with_components(
            test_config(root.path()),
            Arc::new(MockMediaProcessorTrait::new()),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockVideoDownloader::new()),
        );
        assert!(workflow.list_bottom_videos().is_empty());
    }

    #[test]
    fn test_bottom_video_name_cannot_escape_directory() {
        let root = TempDir::new().unwrap();
        let workflow = Workflow::with_components(
            test_config(root.path()),
            Arc::new(MockMediaProcessorTrait::new()),
            Box::new(MockTranscriberTrait::new()),
            Box::new(MockVideoDownloader::new()),
        );
        assert!(matches!(
            workflow.bottom_video_path("../secret.mp4"),
            Err(ClipError::Config(_))
        ));
        assert!(matches!(
            workflow.bottom_video_path("absent.mp4"),
            Err(ClipError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_caption_chunks_skips_silence() {
        let chunks = caption_chunks(&transcription().segments, 3).unwrap();
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one two three", "four", "five six seven"]);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Clip (1).mp4"), "My_Clip_1.mp4");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("ビデオ.mp4"), "mp4");
        assert_eq!(sanitize_filename("..."), "");
    }
}
