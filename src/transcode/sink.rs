use crate::error::TranscodeError;
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Live-path consumer of frame payloads.
///
/// Receives raw JPEG bytes in admission order with no extra framing.
#[async_trait]
pub trait TranscodeSink: Send {
    async fn write_frame(&mut self, data: &[u8]) -> Result<(), TranscodeError>;

    /// Signal end-of-input and wait for the consumer to complete
    async fn finish(&mut self) -> Result<(), TranscodeError>;
}

/// Sink over any byte-oriented writer (a child's stdin, a socket, ...)
pub struct PipeSink<W> {
    writer: Option<W>,
    frames_written: u64,
}

impl<W> PipeSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

#[async_trait]
impl<W> TranscodeSink for PipeSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_frame(&mut self, data: &[u8]) -> Result<(), TranscodeError> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            TranscodeError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "sink already finished",
            ))
        })?;

        writer.write_all(data).await.map_err(TranscodeError::Write)?;
        writer.flush().await.map_err(TranscodeError::Write)?;
        self.frames_written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), TranscodeError> {
        match self.writer.take() {
            // Dropping the writer closes it even if shutdown fails
            Some(mut writer) => writer.shutdown().await.map_err(TranscodeError::Write),
            None => Ok(()),
        }
    }
}

/// Discards every payload. Used for archive-only ingestion.
#[derive(Debug, Default)]
pub struct NullSink {
    frames: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[async_trait]
impl TranscodeSink for NullSink {
    async fn write_frame(&mut self, _data: &[u8]) -> Result<(), TranscodeError> {
        self.frames += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
