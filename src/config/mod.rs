//! Configuration
//!
//! Read from `config.toml` in the platform config directory, or from the
//! file named by `MEDIA_RECORD_CONFIG`. A missing file means defaults.

use crate::capture::MediaKind;
use crate::encoder::{EncodingProfile, PlatformFamily};
use crate::recorder::SessionOptions;
use crate::utils::{AppError, AppResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "MEDIA_RECORD_CONFIG";

const MIN_CHUNK_INTERVAL_MS: u64 = 100;
const MAX_CHUNK_INTERVAL_MS: u64 = 60_000;

/// Which container rules to apply
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformSelection {
    /// Detect from the host
    #[default]
    Auto,
    Apple,
    Other,
}

impl PlatformSelection {
    pub fn resolve(&self) -> PlatformFamily {
        match self {
            PlatformSelection::Auto => PlatformFamily::detect(),
            PlatformSelection::Apple => PlatformFamily::Apple,
            PlatformSelection::Other => PlatformFamily::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where downloads are saved
    pub output_dir: PathBuf,

    /// Where preview files are written; system temp dir when unset
    pub preview_dir: Option<PathBuf>,

    pub chunk_interval_ms: u64,
    pub initial_kind: MediaKind,
    pub ffmpeg_path: PathBuf,
    pub platform: PlatformSelection,
}

impl Default for Config {
    fn default() -> Self {
        let videos_dir = directories::UserDirs::new()
            .and_then(|d| d.video_dir().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| {
                directories::BaseDirs::new()
                    .map(|b| b.home_dir().to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."))
            });

        Self {
            output_dir: videos_dir.join("media-record"),
            preview_dir: None,
            chunk_interval_ms: 1000,
            initial_kind: MediaKind::Video,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            platform: PlatformSelection::Auto,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "media-record", "media-record")
            .map(|p| p.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::config_dir().map(|p| p.join("config.toml")),
        }
    }

    pub fn load() -> AppResult<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(MIN_CHUNK_INTERVAL_MS..=MAX_CHUNK_INTERVAL_MS).contains(&self.chunk_interval_ms) {
            return Err(AppError::Config(format!(
                "chunk_interval_ms must be between {} and {}, got {}",
                MIN_CHUNK_INTERVAL_MS, MAX_CHUNK_INTERVAL_MS, self.chunk_interval_ms
            )));
        }
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(AppError::Config("ffmpeg_path must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_interval_ms)
    }

    /// The encoding profile, resolved once for the whole process
    pub fn encoding_profile(&self) -> EncodingProfile {
        EncodingProfile::for_platform(self.platform.resolve())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            profile: self.encoding_profile(),
            chunk_interval: self.chunk_interval(),
            initial_kind: self.initial_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.chunk_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::from_toml(
            r#"
            output_dir = "/tmp/recordings"
            chunk_interval_ms = 500
            initial_kind = "audio"
            platform = "apple"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/recordings"));
        assert_eq!(config.initial_kind, MediaKind::Audio);

        let options = config.session_options();
        assert_eq!(options.chunk_interval, Duration::from_millis(500));
        assert_eq!(options.profile.file_name(MediaKind::Audio), "audio.mp4");
    }

    #[test]
    fn test_rejects_tiny_interval() {
        let result = Config::from_toml("chunk_interval_ms = 10");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let result = Config::from_toml("bitrate = 5");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "platform = \"other\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.platform, PlatformSelection::Other);
        assert_eq!(config.encoding_profile().mime_for(MediaKind::Video), "video/webm");
    }
}
