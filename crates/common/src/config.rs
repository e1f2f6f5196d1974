//! Service configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClipError, ClipResult};

/// Global render service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory published artifacts are copied into.
    pub files_dir: PathBuf,

    /// Base URL clients use to reach `files_dir` (served under `/files`).
    pub public_base_url: String,

    /// ffmpeg binary name or path.
    pub ffmpeg_path: String,

    /// Font used for text overlays. A missing file disables overlays.
    pub font_path: PathBuf,

    /// Attach a silent audio stream to fast previews.
    pub preview_audio: bool,

    /// How clips are joined.
    pub concat_policy: ConcatPolicy,

    /// Pipeline feature flags.
    pub features: FeatureFlags,

    /// Concurrency and timeout limits.
    pub limits: Limits,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Strategy used by the concatenator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatPolicy {
    /// Stream-copy when all clips share an encoding signature, re-encode otherwise.
    #[default]
    Auto,
    /// Always re-encode.
    Reencode,
}

/// Deployment-wide switches for optional pipeline behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Serve `preview` requests from the single-clip fast path.
    pub quick_preview_enabled: bool,

    /// Mix a background bed when the timeline has a music track.
    pub music_enabled: bool,

    /// Produce `captions.srt` for final renders.
    pub captions_enabled: bool,
}

/// Concurrency and timeout limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum clips synthesized at once per request.
    pub max_parallel_clips: usize,

    /// Timeout for a single remote image download.
    pub image_fetch_timeout_secs: u64,

    /// Largest remote image body accepted, in bytes.
    pub max_image_bytes: u64,

    /// Deadline for a whole render request.
    pub request_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipline=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            files_dir: std::env::temp_dir().join("render-files"),
            public_base_url: "http://localhost:10000".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            font_path: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
            preview_audio: false,
            concat_policy: ConcatPolicy::default(),
            features: FeatureFlags::default(),
            limits: Limits::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            quick_preview_enabled: true,
            music_enabled: true,
            captions_enabled: true,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_parallel_clips: 4,
            image_fetch_timeout_secs: 15,
            max_image_bytes: 25 * 1024 * 1024,
            request_timeout_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl ServiceConfig {
    /// Load config from the standard location, falling back to defaults.
    /// Environment overrides are applied either way.
    pub fn load() -> Self {
        let config_path = config_file_path();
        let mut config = Self::default();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(loaded) => config = loaded,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        config.apply_env();
        config
    }

    /// Load config from an explicit path. Errors are returned, not swallowed.
    pub fn load_from(path: &Path) -> ClipResult<Self> {
        if !path.exists() {
            return Err(ClipError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ClipError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given location, or the standard one.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, std::io::Error> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&config_path, json)?;
        Ok(config_path)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> ClipResult<()> {
        if self.limits.max_parallel_clips == 0 {
            return Err(ClipError::config("limits.max_parallel_clips must be at least 1"));
        }
        if self.limits.image_fetch_timeout_secs == 0 || self.limits.request_timeout_secs == 0 {
            return Err(ClipError::config("timeouts must be at least one second"));
        }
        if self.limits.max_image_bytes == 0 {
            return Err(ClipError::config("limits.max_image_bytes must be at least 1"));
        }
        if self.public_base_url.trim().is_empty() {
            return Err(ClipError::config("public_base_url must not be empty"));
        }
        Ok(())
    }

    /// Apply `PUBLIC_BASE_URL`, `CLIPLINE_FILES_DIR` and `CLIPLINE_FFMPEG`.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
            if !url.trim().is_empty() {
                self.public_base_url = url;
            }
        }
        if let Ok(dir) = std::env::var("CLIPLINE_FILES_DIR") {
            self.files_dir = PathBuf::from(dir);
        }
        if let Ok(ffmpeg) = std::env::var("CLIPLINE_FFMPEG") {
            self.ffmpeg_path = ffmpeg;
        }
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipline").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = ServiceConfig::default();
        assert_eq!(config.limits.image_fetch_timeout_secs, 15);
        assert_eq!(config.limits.max_image_bytes, 25 * 1024 * 1024);
        assert_eq!(config.concat_policy, ConcatPolicy::Auto);
        assert!(config.features.quick_preview_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{ "features": { "music_enabled": false } }"#).unwrap();
        assert!(!config.features.music_enabled);
        assert!(config.features.captions_enabled);
        assert_eq!(config.limits.max_parallel_clips, 4);
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = ServiceConfig::default();
        config.concat_policy = ConcatPolicy::Reencode;
        config.save(Some(&path)).unwrap();

        let loaded = ServiceConfig::load_from(&path).unwrap();
        assert_eq!(loaded.concat_policy, ConcatPolicy::Reencode);
    }

    #[test]
    fn test_load_from_rejects_zero_parallelism() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "limits": { "max_parallel_clips": 0 } }"#).unwrap();
        assert!(matches!(
            ServiceConfig::load_from(&path),
            Err(ClipError::Config { .. })
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = ServiceConfig::load_from(Path::new("/nonexistent/clipline.json")).unwrap_err();
        assert!(matches!(err, ClipError::FileNotFound { .. }));
    }
}
