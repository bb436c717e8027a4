use std::iter::FusedIterator;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::{ClipError, Result};

/// Default number of words per caption chunk
pub const DEFAULT_WORDS_PER_SUB: usize = 6;

/// Coarse transcript unit as produced by speech recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Caption unit written to the subtitle file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleChunk {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Check the time bounds and that the text carries at least one word
    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(ClipError::InvalidSegment(format!(
                "non-finite bounds {} -> {}",
                self.start, self.end
            )));
        }
        if self.start < 0.0 {
            return Err(ClipError::InvalidSegment(format!(
                "negative start {}",
                self.start
            )));
        }
        if self.end <= self.start {
            return Err(ClipError::InvalidSegment(format!(
                "end {} is not after start {}",
                self.end, self.start
            )));
        }
        if self.text.split_whitespace().next().is_none() {
            return Err(ClipError::EmptySegmentText {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Lazy sequence of chunks cut from one segment.
///
/// Every chunk gets the same share of the segment duration; the last one ends
/// exactly at the segment end.
#[derive(Debug, Clone)]
pub struct SegmentChunks<'a> {
    words: Vec<&'a str>,
    words_per_sub: usize,
    start: f64,
    end: f64,
    chunk_duration: f64,
    num_chunks: usize,
    next: usize,
}

impl Iterator for SegmentChunks<'_> {
    type Item = SubtitleChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.num_chunks {
            return None;
        }

        let i = self.next;
        self.next += 1;

        let first_word = i * self.words_per_sub;
        let last_word = (first_word + self.words_per_sub).min(self.words.len());

        let start = self.start + i as f64 * self.chunk_duration;
        let end = if i + 1 == self.num_chunks {
            self.end
        } else {
            self.start + (i + 1) as f64 * self.chunk_duration
        };

        Some(SubtitleChunk {
            start,
            end,
            text: self.words[first_word..last_word].join(" "),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.num_chunks - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SegmentChunks<'_> {}
impl FusedIterator for SegmentChunks<'_> {}

/// Split a segment into chunks of at most `words_per_sub` words
pub fn split_segment(segment: &Segment, words_per_sub: usize) -> Result<SegmentChunks<'_>> {
    if words_per_sub == 0 {
        return Err(ClipError::Config(
            "words_per_sub must be a positive integer".to_string(),
        ));
    }
    segment.validate()?;

    let words: Vec<&str> = segment.text.split_whitespace().collect();
    let num_chunks = words.len().div_ceil(words_per_sub);
    let chunk_duration = (segment.end - segment.start) / num_chunks as f64;

    Ok(SegmentChunks {
        words,
        words_per_sub,
        start: segment.start,
        end: segment.end,
        chunk_duration,
        num_chunks,
        next: 0,
    })
}

/// Re-segment a whole transcript, failing on the first malformed segment
pub fn resegment(segments: &[Segment], words_per_sub: usize) -> Result<Vec<SubtitleChunk>> {
    let mut chunks = Vec::with_capacity(segments.len());
    for segment in segments {
        chunks.extend(split_segment(segment, words_per_sub)?);
    }
    Ok(chunks)
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
pub fn format_srt_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

    // Resolve to whole microseconds first so 3725.128 keeps its 128 ms.
    let total_micros = (seconds * 1_000_000.0).round() as u64;
    let total_seconds = total_micros / 1_000_000;
    let millis = (total_micros % 1_000_000) / 1_000;

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render chunks as SRT text, numbering them from 1
pub fn render_srt(chunks: &[SubtitleChunk]) -> String {
    let mut srt_content = String::new();

    for (index, chunk) in chunks.iter().enumerate() {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(chunk.start),
            format_srt_time(chunk.end),
            chunk.text
        ));
    }

    srt_content
}

/// Write chunks to an SRT subtitle file
pub async fn write_srt<P: AsRef<Path>>(chunks: &[SubtitleChunk], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(
        "Writing {} subtitle chunks to {}",
        chunks.len(),
        output_path.display()
    );

    fs::write(output_path, render_srt(chunks)).await?;
    Ok(())
}
