#![allow(dead_code)]

use async_trait::async_trait;
use framevault::archive::{SegmentId, SegmentWriter};
use framevault::core::Frame;
use framevault::error::TranscodeError;
use framevault::transcode::TranscodeSink;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Fake JPEG payload that encodes its timestamp
pub fn jpeg(timestamp_ms: i64) -> Vec<u8> {
    let mut data = vec![0xff, 0xd8];
    data.extend_from_slice(timestamp_ms.to_string().as_bytes());
    data.extend_from_slice(&[0xff, 0xd9]);
    data
}

/// Write a finalized segment holding `timestamps` in the given order
pub fn write_segment(dir: &Path, stream: &str, start_ms: i64, timestamps: &[i64]) {
    std::fs::create_dir_all(dir).unwrap();
    let mut writer = SegmentWriter::create(dir, SegmentId::new(stream, start_ms)).unwrap();
    for &ts in timestamps {
        writer.append(&Frame::new(ts, jpeg(ts))).unwrap();
    }
    writer.finish().unwrap();
}

/// Live sink that records every payload
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub frames: Arc<Mutex<Vec<Vec<u8>>>>,
    pub finished: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().unwrap().clone()
    }

    pub fn is_finished(&self) -> bool {
        *self.finished.lock().unwrap()
    }
}

#[async_trait]
impl TranscodeSink for RecordingSink {
    async fn write_frame(&mut self, data: &[u8]) -> Result<(), TranscodeError> {
        self.frames.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), TranscodeError> {
        *self.finished.lock().unwrap() = true;
        Ok(())
    }
}

/// Live sink whose consumer goes away after `accept` frames
pub struct FailingSink {
    pub accept: usize,
    pub written: usize,
}

#[async_trait]
impl TranscodeSink for FailingSink {
    async fn write_frame(&mut self, _data: &[u8]) -> Result<(), TranscodeError> {
        if self.written >= self.accept {
            return Err(TranscodeError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "consumer closed",
            )));
        }
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
