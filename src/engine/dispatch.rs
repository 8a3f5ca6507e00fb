use crate::core::{Frame, FrameSource, IncomingFrame};
use crate::engine::shutdown::ShutdownSignal;
use crate::error::{DispatchError, TranscodeError};
use crate::observability::IngestMetrics;
use crate::transcode::TranscodeSink;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Result of admitting one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Queued for archival and forwarded to the live path
    Accepted,
    /// Forwarded to the live path only
    ArchiveDropped,
    /// Unparsable metadata, reached neither consumer
    Rejected,
}

/// Why the dispatcher's main loop ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchStop {
    EndOfInput,
    Cancelled,
    SourceFailed(String),
    TranscoderFailed(String),
}

/// Fans each frame out to the archive hand-off and the live transcoder.
///
/// The live path is blocking; archival admission never waits.
pub struct Dispatcher {
    stream_name: String,
    handoff: Option<mpsc::Sender<Frame>>,
    sink: Box<dyn TranscodeSink>,
    metrics: Arc<IngestMetrics>,
    shutdown: ShutdownSignal,
    archive_halted: bool,
}

impl Dispatcher {
    pub fn new(
        stream_name: impl Into<String>,
        handoff: mpsc::Sender<Frame>,
        sink: Box<dyn TranscodeSink>,
        metrics: Arc<IngestMetrics>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            stream_name: stream_name.into(),
            handoff: Some(handoff),
            sink,
            metrics,
            shutdown,
            archive_halted: false,
        }
    }

    /// Admit one received frame.
    ///
    /// Rejections and archive drops are not errors; only cancellation and a
    /// failed live write end the pipeline.
    pub async fn admit(&mut self, incoming: IncomingFrame) -> Result<Admission, DispatchError> {
        self.metrics.record_received();

        let frame = match incoming.into_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.metrics.record_rejected();
                tracing::warn!(stream = %self.stream_name, error = %e, "Rejecting frame");
                return Ok(Admission::Rejected);
            }
        };

        let admission = if self.offer_to_archive(&frame) {
            Admission::Accepted
        } else {
            Admission::ArchiveDropped
        };

        tokio::select! {
            result = self.sink.write_frame(frame.data()) => result?,
            _ = self.shutdown.cancelled() => return Err(DispatchError::Cancelled),
        }
        self.metrics.record_forwarded();

        Ok(admission)
    }

    fn offer_to_archive(&mut self, frame: &Frame) -> bool {
        let Some(handoff) = &self.handoff else {
            self.metrics.record_archive_drop();
            return false;
        };

        match handoff.try_send(frame.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                self.metrics.record_archive_drop();
                tracing::warn!(
                    stream = %self.stream_name,
                    timestamp_ms = frame.timestamp_ms,
                    "Archive hand-off full, dropping frame from archive to keep live stream moving"
                );
                false
            }
            Err(TrySendError::Closed(frame)) => {
                self.metrics.record_archive_drop();
                if !self.archive_halted {
                    self.archive_halted = true;
                    tracing::warn!(
                        stream = %self.stream_name,
                        timestamp_ms = frame.timestamp_ms,
                        "Archive writer has stopped, continuing live stream only"
                    );
                }
                false
            }
        }
    }

    /// Pump `source` until it ends, fails, the live path fails, or the
    /// session is cancelled. The hand-off is closed on every exit path.
    pub async fn run(&mut self, source: &mut dyn FrameSource) -> DispatchStop {
        let stop = loop {
            let next = tokio::select! {
                next = source.next_frame() => next,
                _ = self.shutdown.cancelled() => break DispatchStop::Cancelled,
            };

            match next {
                Ok(Some(incoming)) => match self.admit(incoming).await {
                    Ok(_) => {}
                    Err(DispatchError::Cancelled) => break DispatchStop::Cancelled,
                    Err(DispatchError::Transcoder(e)) => {
                        if self.shutdown.is_cancelled() {
                            break DispatchStop::Cancelled;
                        }
                        tracing::warn!(stream = %self.stream_name, error = %e, "Error writing frame to transcoder");
                        break DispatchStop::TranscoderFailed(e.to_string());
                    }
                },
                Ok(None) => break DispatchStop::EndOfInput,
                Err(e) => {
                    if self.shutdown.is_cancelled() {
                        break DispatchStop::Cancelled;
                    }
                    tracing::warn!(stream = %self.stream_name, error = %e, "Error reading frame source");
                    break DispatchStop::SourceFailed(e.to_string());
                }
            }
        };

        self.close();
        stop
    }

    /// Close the archive hand-off. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.handoff.take().is_some() {
            tracing::debug!(stream = %self.stream_name, "Archive hand-off closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.handoff.is_none()
    }

    /// Close the hand-off and signal end-of-input to the live consumer
    pub async fn finish(mut self) -> Result<(), TranscodeError> {
        self.close();
        self.sink.finish().await
    }
}
