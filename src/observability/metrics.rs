use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one ingestion session, shared by the dispatcher and the writer.
pub struct IngestMetrics {
    stream_name: String,
    frames_received: AtomicU64,
    frames_rejected: AtomicU64,
    frames_forwarded: AtomicU64,
    archive_drops: AtomicU64,
    frames_archived: AtomicU64,
    entry_write_errors: AtomicU64,
    segments_created: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub stream_name: String,
    pub frames_received: u64,
    pub frames_rejected: u64,
    pub frames_forwarded: u64,
    pub archive_drops: u64,
    pub frames_archived: u64,
    pub entry_write_errors: u64,
    pub segments_created: u64,
}

impl IngestMetrics {
    pub fn new(stream_name: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            frames_received: AtomicU64::new(0),
            frames_rejected: AtomicU64::new(0),
            frames_forwarded: AtomicU64::new(0),
            archive_drops: AtomicU64::new(0),
            frames_archived: AtomicU64::new(0),
            entry_write_errors: AtomicU64::new(0),
            segments_created: AtomicU64::new(0),
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.frames_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_archive_drop(&self) {
        self.archive_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_archived(&self) {
        self.frames_archived.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_error(&self) {
        self.entry_write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_segment_created(&self) {
        self.segments_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn archive_drops(&self) -> u64 {
        self.archive_drops.load(Ordering::Relaxed)
    }

    pub fn frames_archived(&self) -> u64 {
        self.frames_archived.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stream_name: self.stream_name.clone(),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            frames_forwarded: self.frames_forwarded.load(Ordering::Relaxed),
            archive_drops: self.archive_drops.load(Ordering::Relaxed),
            frames_archived: self.frames_archived.load(Ordering::Relaxed),
            entry_write_errors: self.entry_write_errors.load(Ordering::Relaxed),
            segments_created: self.segments_created.load(Ordering::Relaxed),
        }
    }
}
