use crate::archive::{validate_stream_name, SegmentId};
use crate::config::ArchiveConfig;
use crate::core::frame::parse_entry_name;
use crate::error::RetrievalError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// A segment discovered on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFile {
    pub id: SegmentId,
    pub path: PathBuf,
}

/// Point-in-time frame lookup over finalized (or in-progress) segments.
///
/// Segment discovery is a directory listing; the file names are the only index.
#[derive(Debug, Clone)]
pub struct RetrievalEngine {
    jpeg_root: PathBuf,
}

impl RetrievalEngine {
    pub fn new(jpeg_root: impl Into<PathBuf>) -> Self {
        Self {
            jpeg_root: jpeg_root.into(),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.jpeg_root.clone())
    }

    fn stream_dir(&self, stream_name: &str) -> Result<PathBuf, RetrievalError> {
        if !validate_stream_name(stream_name) {
            return Err(RetrievalError::InvalidStreamName(stream_name.to_string()));
        }
        Ok(self.jpeg_root.join(stream_name))
    }

    /// Every parsable segment of the stream, unordered. Files named for another
    /// stream are ignored; a missing stream directory yields no segments.
    fn discover(&self, stream_name: &str) -> Result<Vec<SegmentFile>, RetrievalError> {
        let dir = self.stream_dir(stream_name)?;
        let io_err = |source| RetrievalError::Io {
            path: dir.clone(),
            source,
        };

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut segments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_err)?;
            if entry.file_type().map_err(io_err)?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(SegmentId::parse) else {
                continue;
            };
            if id.stream_name != stream_name {
                continue;
            }
            segments.push(SegmentFile {
                id,
                path: entry.path(),
            });
        }
        Ok(segments)
    }

    /// Segments of a stream ordered by start time
    pub fn list_segments(&self, stream_name: &str) -> Result<Vec<SegmentFile>, RetrievalError> {
        let mut segments = self.discover(stream_name)?;
        segments.sort_by_key(|s| s.id.start_ms);
        Ok(segments)
    }

    /// The segment with the greatest start at or before `target_ms`
    pub fn select_segment(
        &self,
        stream_name: &str,
        target_ms: i64,
    ) -> Result<Option<SegmentFile>, RetrievalError> {
        Ok(self
            .discover(stream_name)?
            .into_iter()
            .filter(|s| s.id.start_ms <= target_ms)
            .max_by_key(|s| s.id.start_ms))
    }

    /// Most recent frame with timestamp <= `target_ms`
    pub fn lookup(&self, stream_name: &str, target_ms: i64) -> Result<Vec<u8>, RetrievalError> {
        let segment = self
            .select_segment(stream_name, target_ms)?
            .ok_or(RetrievalError::NotFound)?;

        tracing::debug!(
            stream = %stream_name,
            target_ms,
            segment = ?segment.path,
            "Scanning segment"
        );

        scan_segment(&segment.path, target_ms)?.ok_or(RetrievalError::NotFound)
    }

    /// `lookup` on the blocking pool
    pub async fn lookup_async(
        &self,
        stream_name: &str,
        target_ms: i64,
    ) -> Result<Vec<u8>, RetrievalError> {
        let engine = self.clone();
        let stream = stream_name.to_string();

        tokio::task::spawn_blocking(move || engine.lookup(&stream, target_ms)).await?
    }
}

/// Scan one segment in storage order.
///
/// Entries are assumed to be in non-decreasing timestamp order: the scan stops
/// at the first entry newer than `target_ms`. A segment that is still being
/// written may end in a partially flushed entry; once a complete frame has been
/// found, such a tail ends the scan instead of failing it.
pub fn scan_segment(path: &Path, target_ms: i64) -> Result<Option<Vec<u8>>, RetrievalError> {
    let io_err = |source| RetrievalError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let file_len = file.metadata().map_err(io_err)?.len();
    let mut archive = tar::Archive::new(BufReader::new(file));
    let mut best: Option<Vec<u8>> = None;
    let mut consumed_end = 0u64;

    for entry in archive.entries().map_err(io_err)? {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(_) if best.is_some() && is_partial_tail(consumed_end, file_len) => break,
            Err(e) => return Err(io_err(e)),
        };
        let declared = entry.size();
        consumed_end = entry.raw_file_position().saturating_add(declared);

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry.path().map_err(io_err)?.to_string_lossy().into_owned();
        let Some(timestamp_ms) = parse_entry_name(&name) else {
            tracing::warn!(segment = ?path, entry = %name, "Could not parse timestamp from entry name");
            continue;
        };

        if timestamp_ms > target_ms {
            break;
        }

        // Never size the buffer from the header: it may be corrupt
        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(io_err)?;

        if (data.len() as u64) < declared {
            if best.is_some() {
                tracing::debug!(segment = ?path, entry = %name, "Stopping at partially written entry");
                break;
            }
            return Err(io_err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("entry {} truncated: {} of {} bytes", name, data.len(), declared),
            )));
        }
        best = Some(data);
    }

    Ok(best)
}

/// Whether a read error falls in the last, incomplete block run of the file:
/// the padding after the last entry or the header that follows it.
fn is_partial_tail(consumed_end: u64, file_len: u64) -> bool {
    const BLOCK: u64 = 512;
    let padded = consumed_end.div_ceil(BLOCK) * BLOCK;
    file_len < padded.saturating_add(BLOCK)
}
