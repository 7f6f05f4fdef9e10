//! Source media and the value types that describe an extraction request.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A fetched source video, immutable for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMedia {
    /// Absolute path to the downloaded file.
    pub path: PathBuf,
    /// Logical title, used to namespace derived artifacts.
    pub title: String,
    /// Total duration in seconds, unknown until probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl SourceMedia {
    /// Create source media with an unknown duration.
    pub fn new(path: PathBuf, title: impl Into<String>) -> Self {
        Self {
            path,
            title: title.into(),
            duration_secs: None,
        }
    }

    /// Set the probed duration.
    pub fn with_duration(mut self, duration_secs: Option<f64>) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// Title reduced to a filesystem-safe form.
    pub fn safe_title(&self) -> String {
        sanitize_title(&self.title)
    }
}

/// A half-open time interval `[start, end)` in seconds.
///
/// Invariant `start < end` is enforced by the planner, not the constructor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Start offset in seconds (non-negative).
    pub start: f64,
    /// End offset in seconds (exclusive).
    pub end: f64,
}

impl Interval {
    /// Create an interval. Validation happens in the planner.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Interval length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Short tag for filenames and logical names, e.g. `10-20` or `1p5-9`.
    ///
    /// Decimal points are replaced so the tag stays path- and zip-safe.
    pub fn tag(&self) -> String {
        format!(
            "{}-{}",
            format_seconds(self.start),
            format_seconds(self.end)
        )
    }
}

fn format_seconds(secs: f64) -> String {
    format!("{}", secs).replace('.', "p")
}

/// Frame sampling rate in frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingRate(f64);

impl SamplingRate {
    /// Create a sampling rate. Positivity is enforced by the planner.
    pub fn new(fps: f64) -> Self {
        Self(fps)
    }

    /// Frames per second.
    pub fn fps(&self) -> f64 {
        self.0
    }

    /// Tag for directory and logical names, e.g. `25` or `0p5`.
    pub fn tag(&self) -> String {
        format_seconds(self.0)
    }
}

impl std::fmt::Display for SamplingRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target audio codec for audio extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    Wav,
}

impl AudioCodec {
    /// File extension for this codec.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Wav => "wav",
        }
    }

    /// ffmpeg encoder name.
    pub fn encoder(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "libmp3lame",
            AudioCodec::Wav => "pcm_s16le",
        }
    }
}

impl std::fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Output scale for sampled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameScale {
    pub width: u32,
    pub height: u32,
}

impl FrameScale {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for FrameScale {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Reduce a title to characters that are safe in filenames and zip entries.
///
/// Keeps alphanumerics, spaces become underscores, everything else is
/// dropped. Truncated to 50 characters. Falls back to `video` when nothing
/// survives.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect::<String>()
        .trim()
        .replace(' ', "_")
        .chars()
        .take(50)
        .collect();

    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_tag_is_path_safe() {
        assert_eq!(Interval::new(10.0, 20.0).tag(), "10-20");
        assert_eq!(Interval::new(1.5, 9.0).tag(), "1p5-9");
    }

    #[test]
    fn sampling_rate_tag() {
        assert_eq!(SamplingRate::new(25.0).tag(), "25");
        assert_eq!(SamplingRate::new(0.5).tag(), "0p5");
    }

    #[test]
    fn sanitize_drops_unsafe_characters() {
        assert_eq!(sanitize_title("My Video: Part 1/2"), "My_Video_Part_12");
        assert_eq!(sanitize_title("../../etc"), "etc");
        assert_eq!(sanitize_title("???"), "video");
    }

    #[test]
    fn sanitize_truncates_long_titles() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_title(&long).len(), 50);
    }

    #[test]
    fn source_media_serializes() {
        let media = SourceMedia::new(PathBuf::from("/tmp/v.mp4"), "Demo").with_duration(Some(12.5));
        let json = serde_json::to_string(&media).unwrap();
        assert!(json.contains("\"title\":\"Demo\""));
        assert!(json.contains("12.5"));
    }
}
