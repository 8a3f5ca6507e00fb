use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROTATION_WINDOW_MS: i64 = 60_000;

/// ~60 seconds of frames at 5 fps
pub const DEFAULT_HANDOFF_CAPACITY: usize = 300;

/// Storage and ingestion settings shared by every stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Root of the per-stream segment directories
    pub jpeg_root: PathBuf,

    /// Root of the per-stream HLS output directories
    pub hls_root: PathBuf,

    pub rotation_window_ms: i64,

    /// Frames the archive hand-off can hold before admission drops begin
    pub handoff_capacity: usize,

    /// Input frame rate announced to the transcoder
    pub frame_rate: u32,

    pub ffmpeg_path: String,

    pub verbose_transcoder: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            jpeg_root: PathBuf::from("/mnt/nfs/streams/jpeg"),
            hls_root: PathBuf::from("/mnt/nfs/streams/hls"),
            rotation_window_ms: DEFAULT_ROTATION_WINDOW_MS,
            handoff_capacity: DEFAULT_HANDOFF_CAPACITY,
            frame_rate: 5,
            ffmpeg_path: "ffmpeg".to_string(),
            verbose_transcoder: false,
        }
    }
}

impl ArchiveConfig {
    /// Config rooted under a single directory (`<root>/jpeg`, `<root>/hls`)
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            jpeg_root: root.join("jpeg"),
            hls_root: root.join("hls"),
            ..Self::default()
        }
    }

    pub fn from_json(config: Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation_window_ms <= 0 {
            return Err(ConfigError::Invalid(format!(
                "rotation_window_ms must be positive, got {}",
                self.rotation_window_ms
            )));
        }
        if self.handoff_capacity == 0 {
            return Err(ConfigError::Invalid("handoff_capacity must be at least 1".to_string()));
        }
        if self.frame_rate == 0 {
            return Err(ConfigError::Invalid("frame_rate must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn stream_jpeg_dir(&self, stream_name: &str) -> PathBuf {
        self.jpeg_root.join(stream_name)
    }

    pub fn stream_hls_dir(&self, stream_name: &str) -> PathBuf {
        self.hls_root.join(stream_name)
    }
}
