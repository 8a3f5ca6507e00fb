use crate::config::ArchiveConfig;
use crate::error::ArchiveError;
use std::path::{Path, PathBuf};

/// Reject names that are empty or would escape the storage roots.
pub fn validate_stream_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// On-disk directories owned by one stream
#[derive(Debug, Clone)]
pub struct StreamLayout {
    stream_name: String,
    jpeg_dir: PathBuf,
    hls_dir: PathBuf,
}

impl StreamLayout {
    pub fn new(config: &ArchiveConfig, stream_name: &str) -> Result<Self, ArchiveError> {
        if !validate_stream_name(stream_name) {
            return Err(ArchiveError::InvalidStreamName(stream_name.to_string()));
        }
        Ok(Self {
            stream_name: stream_name.to_string(),
            jpeg_dir: config.stream_jpeg_dir(stream_name),
            hls_dir: config.stream_hls_dir(stream_name),
        })
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn jpeg_dir(&self) -> &Path {
        &self.jpeg_dir
    }

    pub fn hls_dir(&self) -> &Path {
        &self.hls_dir
    }

    /// Discard any previous contents and recreate both directories
    pub async fn reset(&self) -> Result<(), ArchiveError> {
        for dir in [&self.jpeg_dir, &self.hls_dir] {
            reset_dir(dir).await?;
        }
        tracing::debug!(stream = %self.stream_name, jpeg_dir = ?self.jpeg_dir, "Stream directories reset");
        Ok(())
    }
}

async fn reset_dir(dir: &Path) -> Result<(), ArchiveError> {
    let layout_err = |source| ArchiveError::Layout {
        path: dir.to_path_buf(),
        source,
    };

    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(layout_err(e)),
    }
    tokio::fs::create_dir_all(dir).await.map_err(layout_err)
}
