// TOML config adapter - Configuration management using TOML files

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::model::EncodingProfile;
use crate::error::{StickClipError, StickClipResult};

/// Application configuration, loaded from a TOML file.
///
/// Everything has a default; a missing file means built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Explicit path to the ffmpeg binary; falls back to `FFMPEG_PATH`
    /// and then a PATH lookup
    pub ffmpeg_path: Option<String>,
    /// Explicit path to the ffprobe binary; falls back to
    /// `FFPROBE_PATH` and then a PATH lookup
    pub ffprobe_path: Option<String>,
    /// Default encoding profile values
    pub defaults: ProfileDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            defaults: ProfileDefaults::default(),
        }
    }
}

/// Default encoding profile section of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDefaults {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub audio: bool,
    pub video_codec: String,
    pub quality: u8,
    pub speed_preset: String,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        let profile = EncodingProfile::default();
        Self {
            width: profile.target_width,
            height: profile.target_height,
            frame_rate: profile.frame_rate,
            audio: profile.audio_enabled,
            video_codec: profile.video_codec,
            quality: profile.quality,
            speed_preset: profile.speed_preset,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when `path` is None
    /// or the file does not exist.
    pub fn load(path: Option<&Path>) -> StickClipResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!("config file {} not found; using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| StickClipError::Configuration {
            message: format!("failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Build the default encoding profile from this configuration
    pub fn profile(&self) -> EncodingProfile {
        EncodingProfile {
            target_width: self.defaults.width,
            target_height: self.defaults.height,
            frame_rate: self.defaults.frame_rate,
            audio_enabled: self.defaults.audio,
            video_codec: self.defaults.video_codec.clone(),
            quality: self.defaults.quality,
            speed_preset: self.defaults.speed_preset.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load(Some(Path::new("/no/such/config.toml"))).unwrap();
        assert!(config.ffmpeg_path.is_none());
        assert_eq!(config.profile(), EncodingProfile::default());
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stickclip.toml");
        std::fs::write(
            &path,
            "ffmpeg_path = \"/opt/ffmpeg/bin/ffmpeg\"\n\n[defaults]\nwidth = 256\nheight = 256\naudio = true\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.ffmpeg_path.as_deref(), Some("/opt/ffmpeg/bin/ffmpeg"));
        let profile = config.profile();
        assert_eq!(profile.target_width, 256);
        assert_eq!(profile.target_height, 256);
        assert!(profile.audio_enabled);
        // Untouched keys keep their defaults
        assert_eq!(profile.frame_rate, 30);
        assert_eq!(profile.video_codec, "libvpx-vp9");
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "defaults = [not toml").unwrap();
        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(StickClipError::Configuration { .. })
        ));
    }
}
