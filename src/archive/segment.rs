use crate::core::frame::parse_entry_name;
use crate::core::Frame;
use crate::error::ArchiveError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SEGMENT_EXTENSION: &str = ".tar";

/// Identity of one segment: `<stream>_<segment_start_ms>.tar`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId {
    pub stream_name: String,
    pub start_ms: i64,
}

impl SegmentId {
    pub fn new(stream_name: impl Into<String>, start_ms: i64) -> Self {
        Self {
            stream_name: stream_name.into(),
            start_ms,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}{}", self.stream_name, self.start_ms, SEGMENT_EXTENSION)
    }

    /// Parse a segment file name. The start is taken after the last `_`,
    /// so stream names may themselves contain underscores.
    pub fn parse(file_name: &str) -> Option<Self> {
        let base = file_name.strip_suffix(SEGMENT_EXTENSION)?;
        let (stream_name, start) = base.rsplit_once('_')?;
        let start_ms = start.parse().ok()?;
        Some(Self::new(stream_name, start_ms))
    }

    /// Whether `timestamp_ms` falls inside `[start, start + window)`
    pub fn covers(&self, timestamp_ms: i64, window_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms.saturating_sub(self.start_ms) < window_ms
    }
}

/// Append-only tar container for one segment.
pub struct SegmentWriter {
    id: SegmentId,
    path: PathBuf,
    builder: tar::Builder<BufWriter<File>>,
    entries: u64,
}

impl SegmentWriter {
    pub fn create(dir: &Path, id: SegmentId) -> Result<Self, ArchiveError> {
        let path = dir.join(id.file_name());
        let file = File::create(&path).map_err(|source| ArchiveError::CreateSegment {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            id,
            path,
            builder: tar::Builder::new(BufWriter::new(file)),
            entries: 0,
        })
    }

    pub fn id(&self) -> &SegmentId {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Append one frame as `<timestamp>.jpg`
    pub fn append(&mut self, frame: &Frame) -> Result<(), ArchiveError> {
        let entry = frame.entry_name();

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(frame.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(unix_now());

        self.builder
            .append_data(&mut header, &entry, frame.data())
            .map_err(|source| ArchiveError::WriteEntry { entry, source })?;
        self.entries += 1;
        Ok(())
    }

    /// Write the end-of-archive marker, flush and close the file
    pub fn finish(self) -> Result<SegmentId, ArchiveError> {
        let finalize_err = |source| ArchiveError::Finalize {
            path: self.path.clone(),
            source,
        };

        let writer = self.builder.into_inner().map_err(finalize_err)?;
        let file = writer
            .into_inner()
            .map_err(|e| finalize_err(e.into_error()))?;
        file.sync_all().map_err(finalize_err)?;

        Ok(self.id)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One entry read back from a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    pub name: String,
    pub timestamp_ms: Option<i64>,
    pub data: Vec<u8>,
}

/// Read every regular entry of a segment in storage order.
pub fn read_entries(path: &Path) -> std::io::Result<Vec<SegmentEntry>> {
    let mut archive = tar::Archive::new(BufReader::new(File::open(path)?));
    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().into_owned();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;

        entries.push(SegmentEntry {
            timestamp_ms: parse_entry_name(&name),
            name,
            data,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_segment_file_name() {
        let id = SegmentId::new("camera_0", 1_700_000_000_000);
        assert_eq!(id.file_name(), "camera_0_1700000000000.tar");
        assert_eq!(SegmentId::parse(&id.file_name()), Some(id));
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        assert_eq!(SegmentId::parse("playlist.m3u8"), None);
        assert_eq!(SegmentId::parse("nounderscore.tar"), None);
        assert_eq!(SegmentId::parse("cam_abc.tar"), None);
        assert_eq!(SegmentId::parse("cam_12.tar.tmp"), None);
    }

    #[test]
    fn test_covers_window() {
        let id = SegmentId::new("cam", 1000);
        assert!(id.covers(1000, 60_000));
        assert!(id.covers(60_999, 60_000));
        assert!(!id.covers(61_000, 60_000));
        assert!(!id.covers(999, 60_000));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempdir().unwrap();
        let mut writer = SegmentWriter::create(dir.path(), SegmentId::new("cam", 5)).unwrap();

        writer.append(&Frame::new(5, vec![1, 2, 3])).unwrap();
        writer.append(&Frame::new(15, vec![4])).unwrap();
        assert_eq!(writer.entries(), 2);

        let path = writer.path().to_path_buf();
        let id = writer.finish().unwrap();
        assert_eq!(id.start_ms, 5);

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "5.jpg");
        assert_eq!(entries[0].data, vec![1, 2, 3]);
        assert_eq!(entries[1].timestamp_ms, Some(15));
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        let result = SegmentWriter::create(&missing, SegmentId::new("cam", 0));
        assert!(matches!(result, Err(ArchiveError::CreateSegment { .. })));
    }
}
