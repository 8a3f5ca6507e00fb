use super::frame::{parse_entry_name, IncomingFrame, ENTRY_SUFFIX};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Producer side of an ingestion session.
///
/// Yields frames in arrival order. `Ok(None)` ends the stream; an `Err`
/// terminates it with a read failure.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Result<Option<IncomingFrame>>;
}

/// Source fed through a channel, e.g. by a multipart request reader.
pub struct ChannelSource {
    rx: mpsc::Receiver<Result<IncomingFrame>>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<Result<IncomingFrame>>) -> Self {
        Self { rx }
    }

    /// Create a connected sender/source pair
    pub fn channel(capacity: usize) -> (mpsc::Sender<Result<IncomingFrame>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn next_frame(&mut self) -> Result<Option<IncomingFrame>> {
        match self.rx.recv().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Replays `<timestamp>.jpg` files from a directory in timestamp order.
///
/// Files whose stem is not a timestamp are still yielded (first), carrying the
/// stem as their marker, so they go through normal admission checks.
pub struct DirectorySource {
    files: std::vec::IntoIter<(String, PathBuf)>,
}

impl DirectorySource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files = Vec::new();

        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {:?}", dir))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(ENTRY_SUFFIX) {
                files.push((stem.to_string(), entry.path()));
            }
        }

        files.sort_by(|(a, _), (b, _)| {
            (parse_entry_name(a), a).cmp(&(parse_entry_name(b), b))
        });

        Ok(Self {
            files: files.into_iter(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
impl FrameSource for DirectorySource {
    async fn next_frame(&mut self) -> Result<Option<IncomingFrame>> {
        let Some((stem, path)) = self.files.next() else {
            return Ok(None);
        };
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read frame {:?}", path))?;
        Ok(Some(IncomingFrame::new(stem, data)))
    }
}
