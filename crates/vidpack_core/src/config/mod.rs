//! Configuration loading and saving.

mod settings;

use std::path::Path;

use thiserror::Error;

pub use settings::{
    ExtractionSettings, LoggingSettings, PathSettings, Settings, ToolSettings,
};

/// Errors from reading or writing the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load settings from a TOML file, or defaults when the file is absent.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        tracing::debug!("No settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(toml::from_str(&content)?)
}

/// Save settings as TOML, atomically (write to a temp file, then rename).
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let toml = toml::to_string_pretty(settings)?;

    let write = |source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &toml).map_err(write)?;
    std::fs::rename(&temp_path, path).map_err(write)?;

    tracing::debug!("Saved settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = load_settings(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.tools.ffmpeg, "ffmpeg");
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.extraction.frame_width = 1280;
        settings.extraction.frame_height = 720;
        settings.tools.timeout_secs = Some(120);

        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();

        assert_eq!(loaded.extraction.frame_width, 1280);
        assert_eq!(loaded.extraction.frame_height, 720);
        assert_eq!(loaded.tools.timeout_secs, Some(120));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[tools]\nffmpeg = \"/opt/ffmpeg\"\n").unwrap();

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded.tools.ffmpeg, "/opt/ffmpeg");
        assert_eq!(loaded.extraction.frame_width, 1920);
    }
}
