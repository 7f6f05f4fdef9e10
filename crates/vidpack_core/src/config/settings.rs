//! Settings struct with TOML-based sections.
//!
//! Sections map to TOML tables and every field has a serde default, so a
//! partial settings file is always valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::FrameScale;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// External tool locations and limits.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Extraction defaults.
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for output and temp directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder where finished archives land.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root for per-session workspaces. Empty means the system temp dir.
    #[serde(default)]
    pub temp_root: String,
}

fn default_output_folder() -> String {
    "vidpack_output".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: String::new(),
        }
    }
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg binary (name or absolute path).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// ffprobe binary, used for duration probing.
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    /// yt-dlp binary, used by the production fetcher.
    #[serde(default = "default_ytdlp")]
    pub ytdlp: String,

    /// Per-invocation timeout in seconds. Absent means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_ytdlp() -> String {
    "yt-dlp".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            ytdlp: default_ytdlp(),
            timeout_secs: None,
        }
    }
}

impl ToolSettings {
    /// Timeout as a `Duration`, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Extraction defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Frame output width.
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    /// Frame output height.
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,

    /// ffmpeg `-qscale:v` for JPEG frames (1 = best).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u32,

    /// Abort the whole request on the first job failure instead of
    /// collecting partial results.
    #[serde(default)]
    pub all_or_nothing: bool,

    /// Re-encode sub-clips for frame-exact boundaries instead of the
    /// faster keyframe-snapped stream copy.
    #[serde(default)]
    pub exact_cut: bool,
}

fn default_frame_width() -> u32 {
    1920
}

fn default_frame_height() -> u32 {
    1080
}

fn default_jpeg_quality() -> u32 {
    1
}

impl ExtractionSettings {
    /// Configured frame output scale.
    pub fn frame_scale(&self) -> FrameScale {
        FrameScale::new(self.frame_width, self.frame_height)
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            jpeg_quality: default_jpeg_quality(),
            all_or_nothing: false,
            exact_cut: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default tracing filter when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let settings = Settings::default();
        assert_eq!(settings.extraction.frame_width, 1920);
        assert_eq!(settings.extraction.frame_height, 1080);
        assert_eq!(settings.extraction.jpeg_quality, 1);
        assert!(!settings.extraction.all_or_nothing);
        assert!(!settings.extraction.exact_cut);
        assert!(settings.tools.timeout().is_none());
    }

    #[test]
    fn timeout_converts_to_duration() {
        let tools = ToolSettings {
            timeout_secs: Some(90),
            ..Default::default()
        };
        assert_eq!(tools.timeout(), Some(Duration::from_secs(90)));
    }
}
