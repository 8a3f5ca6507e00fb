use super::segment::{SegmentId, SegmentWriter};
use super::state::WriterState;
use crate::core::Frame;
use crate::engine::shutdown::ShutdownSignal;
use crate::error::ArchiveError;
use crate::observability::IngestMetrics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Why the writer stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriterStop {
    /// Hand-off closed by the dispatcher
    HandoffClosed,
    Cancelled,
    /// A segment file could not be created; archival halted for the stream
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterReport {
    pub stop: WriterStop,
    /// Segments closed by this writer, in creation order
    pub segments: Vec<SegmentId>,
    pub frames_written: u64,
    pub entries_skipped: u64,
}

/// Sole owner of a stream's open segment.
///
/// Frames reach it only through the hand-off channel; there is no other
/// mutation path once it has been spawned.
pub struct ArchiveWriter {
    stream_name: String,
    dir: PathBuf,
    window_ms: i64,
    metrics: Arc<IngestMetrics>,
    segment: Option<SegmentWriter>,
    state: WriterState,
    segments: Vec<SegmentId>,
    frames_written: u64,
    entries_skipped: u64,
}

impl ArchiveWriter {
    pub fn new(
        stream_name: impl Into<String>,
        dir: impl Into<PathBuf>,
        window_ms: i64,
        metrics: Arc<IngestMetrics>,
    ) -> Self {
        Self {
            stream_name: stream_name.into(),
            dir: dir.into(),
            window_ms,
            metrics,
            segment: None,
            state: WriterState::NoSegment,
            segments: Vec::new(),
            frames_written: 0,
            entries_skipped: 0,
        }
    }

    pub fn state(&self) -> &WriterState {
        &self.state
    }

    fn transition_to(&mut self, new_state: WriterState) {
        debug_assert!(
            self.state.can_transition_to(&new_state),
            "invalid writer transition: {} -> {}",
            self.state.name(),
            new_state.name()
        );
        self.state = new_state;
    }

    fn needs_rotation(&self, timestamp_ms: i64) -> bool {
        match &self.segment {
            None => true,
            Some(segment) => timestamp_ms.saturating_sub(segment.id().start_ms) >= self.window_ms,
        }
    }

    /// Archive one frame, rotating first if it falls outside the open window.
    ///
    /// Only segment creation failures are returned; they are fatal to the
    /// writer. Entry write failures are logged and the entry is skipped.
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<(), ArchiveError> {
        if self.state.is_closed() {
            return Ok(());
        }

        if self.needs_rotation(frame.timestamp_ms) {
            self.rotate(frame.timestamp_ms)?;
        }

        let Some(segment) = self.segment.as_mut() else {
            return Ok(());
        };

        match segment.append(frame) {
            Ok(()) => {
                self.frames_written += 1;
                self.metrics.record_archived();
            }
            Err(e) => {
                self.entries_skipped += 1;
                self.metrics.record_write_error();
                tracing::warn!(stream = %self.stream_name, error = %e, "Skipping archive entry");
            }
        }

        let state = WriterState::SegmentOpen {
            segment_start_ms: segment.id().start_ms,
            entries: segment.entries(),
        };
        self.transition_to(state);
        Ok(())
    }

    fn rotate(&mut self, start_ms: i64) -> Result<(), ArchiveError> {
        self.finalize_current();

        let id = SegmentId::new(self.stream_name.as_str(), start_ms);
        match SegmentWriter::create(&self.dir, id) {
            Ok(segment) => {
                tracing::info!(
                    stream = %self.stream_name,
                    path = ?segment.path(),
                    "Created archive segment"
                );
                self.metrics.record_segment_created();
                self.transition_to(WriterState::SegmentOpen {
                    segment_start_ms: start_ms,
                    entries: 0,
                });
                self.segment = Some(segment);
                Ok(())
            }
            Err(e) => {
                tracing::error!(stream = %self.stream_name, error = %e, "Halting archive writer");
                self.transition_to(WriterState::Closed);
                Err(e)
            }
        }
    }

    fn finalize_current(&mut self) {
        let Some(segment) = self.segment.take() else {
            return;
        };
        let id = segment.id().clone();
        let path = segment.path().to_path_buf();

        match segment.finish() {
            Ok(_) => tracing::debug!(stream = %self.stream_name, path = ?path, "Finalized archive segment"),
            Err(e) => tracing::error!(stream = %self.stream_name, error = %e, "Failed to finalize segment"),
        }
        self.segments.push(id);
    }

    /// Finalize the open segment, if any. Safe to call more than once.
    pub fn close(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.finalize_current();
        self.transition_to(WriterState::Closed);
    }

    /// Consume frames until the hand-off closes or the session is cancelled.
    ///
    /// On cancellation the hand-off is closed and frames already queued in it
    /// are still written before the open segment is finalized.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<Frame>,
        mut shutdown: ShutdownSignal,
    ) -> WriterReport {
        tracing::info!(stream = %self.stream_name, "Starting archive writer");

        let stop = loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(frame) => {
                        if let Err(e) = self.handle_frame(&frame) {
                            break WriterStop::Failed(e.to_string());
                        }
                    }
                    None => break WriterStop::HandoffClosed,
                },
                _ = shutdown.cancelled() => {
                    rx.close();
                    break self.drain(&mut rx);
                }
            }
        };

        self.close();
        tracing::info!(
            stream = %self.stream_name,
            frames = self.frames_written,
            segments = self.segments.len(),
            "Archive writer stopped"
        );

        WriterReport {
            stop,
            segments: self.segments,
            frames_written: self.frames_written,
            entries_skipped: self.entries_skipped,
        }
    }

    fn drain(&mut self, rx: &mut mpsc::Receiver<Frame>) -> WriterStop {
        while let Ok(frame) = rx.try_recv() {
            if let Err(e) = self.handle_frame(&frame) {
                return WriterStop::Failed(e.to_string());
            }
        }
        WriterStop::Cancelled
    }

    pub fn spawn(self, rx: mpsc::Receiver<Frame>, shutdown: ShutdownSignal) -> JoinHandle<WriterReport> {
        tokio::spawn(self.run(rx, shutdown))
    }
}
