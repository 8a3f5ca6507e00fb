use crate::archive::{ArchiveWriter, StreamLayout, WriterReport};
use crate::config::ArchiveConfig;
use crate::core::FrameSource;
use crate::engine::dispatch::{DispatchStop, Dispatcher};
use crate::engine::shutdown::Shutdown;
use crate::observability::{IngestMetrics, MetricsSnapshot};
use crate::transcode::{FfmpegTranscoder, TranscodeSink};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outcome of one ingestion session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub stream_name: String,
    pub dispatch: DispatchStop,
    pub writer: WriterReport,
    /// Set when the live consumer failed to complete cleanly
    pub transcoder_error: Option<String>,
    pub metrics: MetricsSnapshot,
}

/// One ingestion session for one stream: source -> dispatcher -> {writer, transcoder}.
///
/// Sessions for the same stream name must not overlap; `prepare` discards the
/// stream's previous segments.
pub struct IngestSession {
    config: ArchiveConfig,
    layout: StreamLayout,
    metrics: Arc<IngestMetrics>,
    shutdown: Shutdown,
}

impl IngestSession {
    /// Validate the stream name and reset its directories
    pub async fn prepare(config: &ArchiveConfig, stream_name: &str) -> Result<Self> {
        config.validate()?;
        let layout = StreamLayout::new(config, stream_name)?;
        layout
            .reset()
            .await
            .with_context(|| format!("Failed to prepare stream {}", stream_name))?;

        Ok(Self {
            config: config.clone(),
            layout,
            metrics: Arc::new(IngestMetrics::new(stream_name)),
            shutdown: Shutdown::new(),
        })
    }

    pub fn stream_name(&self) -> &str {
        self.layout.stream_name()
    }

    pub fn layout(&self) -> &StreamLayout {
        &self.layout
    }

    pub fn metrics(&self) -> Arc<IngestMetrics> {
        self.metrics.clone()
    }

    /// Handle used to cancel the session from outside
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Start ffmpeg writing HLS into this stream's output directory
    pub fn spawn_transcoder(&self) -> Result<FfmpegTranscoder> {
        let transcoder =
            FfmpegTranscoder::spawn(&self.config, self.layout.hls_dir(), self.shutdown.signal())?;
        Ok(transcoder)
    }

    /// Run until the source ends, fails, the live path fails, or the session is cancelled.
    pub async fn run<S>(self, mut source: S, sink: Box<dyn TranscodeSink>) -> Result<SessionReport>
    where
        S: FrameSource,
    {
        let stream_name = self.stream_name().to_string();
        let (handoff_tx, handoff_rx) = mpsc::channel(self.config.handoff_capacity);

        let writer = ArchiveWriter::new(
            stream_name.as_str(),
            self.layout.jpeg_dir(),
            self.config.rotation_window_ms,
            self.metrics.clone(),
        )
        .spawn(handoff_rx, self.shutdown.signal());

        let mut dispatcher = Dispatcher::new(
            stream_name.as_str(),
            handoff_tx,
            sink,
            self.metrics.clone(),
            self.shutdown.signal(),
        );

        let dispatch = dispatcher.run(&mut source).await;
        let transcoder_error = match dispatcher.finish().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(stream = %stream_name, error = %e, "Transcoder finished with error");
                Some(e.to_string())
            }
        };

        let writer = writer.await.context("Archive writer task panicked")?;

        tracing::info!(stream = %stream_name, reason = ?dispatch, "Finished processing stream");

        Ok(SessionReport {
            stream_name,
            dispatch,
            writer,
            transcoder_error,
            metrics: self.metrics.snapshot(),
        })
    }
}
