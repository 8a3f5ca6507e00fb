use crate::error::FrameError;
use std::sync::Arc;

/// Suffix appended to every archive entry name.
pub const ENTRY_SUFFIX: &str = ".jpg";

/// One timestamped JPEG payload.
///
/// Cloning is cheap: the payload is shared, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Capture time in milliseconds, as supplied by the producer
    pub timestamp_ms: i64,

    data: Arc<[u8]>,
}

impl Frame {
    pub fn new(timestamp_ms: i64, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            timestamp_ms,
            data: data.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Name of this frame's entry inside a segment, e.g. `1700000000123.jpg`
    pub fn entry_name(&self) -> String {
        entry_name(self.timestamp_ms)
    }
}

pub fn entry_name(timestamp_ms: i64) -> String {
    format!("{}{}", timestamp_ms, ENTRY_SUFFIX)
}

/// Recover the timestamp from an entry name. The suffix is optional.
pub fn parse_entry_name(name: &str) -> Option<i64> {
    let stem = name.strip_suffix(ENTRY_SUFFIX).unwrap_or(name);
    stem.parse().ok()
}

/// Parse a producer-supplied timestamp marker (decimal milliseconds).
pub fn parse_timestamp(marker: &str) -> Result<i64, FrameError> {
    let trimmed = marker.trim();
    if trimmed.is_empty() {
        return Err(FrameError::MissingTimestamp);
    }
    trimmed
        .parse()
        .map_err(|_| FrameError::InvalidTimestamp(marker.to_string()))
}

/// A frame as delivered by a source adapter, before its metadata is checked.
#[derive(Debug, Clone, Default)]
pub struct IncomingFrame {
    /// Raw timestamp marker, `None` when the part carried none
    pub timestamp: Option<String>,

    pub data: Vec<u8>,
}

impl IncomingFrame {
    pub fn new(timestamp: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            data,
        }
    }

    pub fn without_timestamp(data: Vec<u8>) -> Self {
        Self {
            timestamp: None,
            data,
        }
    }

    pub fn into_frame(self) -> Result<Frame, FrameError> {
        let marker = self.timestamp.ok_or(FrameError::MissingTimestamp)?;
        let timestamp_ms = parse_timestamp(&marker)?;
        Ok(Frame::new(timestamp_ms, self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_round_trip() {
        let frame = Frame::new(1_700_000_000_123, vec![0xff, 0xd8]);
        assert_eq!(frame.entry_name(), "1700000000123.jpg");
        assert_eq!(parse_entry_name(&frame.entry_name()), Some(1_700_000_000_123));
    }

    #[test]
    fn test_parse_entry_name_rejects_garbage() {
        assert_eq!(parse_entry_name("thumb.jpg"), None);
        assert_eq!(parse_entry_name(".jpg"), None);
        assert_eq!(parse_entry_name("42"), Some(42));
    }

    #[test]
    fn test_incoming_frame_validation() {
        let ok = IncomingFrame::new(" 15 ", vec![1]).into_frame().unwrap();
        assert_eq!(ok.timestamp_ms, 15);

        assert!(matches!(
            IncomingFrame::without_timestamp(vec![1]).into_frame(),
            Err(FrameError::MissingTimestamp)
        ));
        assert!(matches!(
            IncomingFrame::new("", vec![1]).into_frame(),
            Err(FrameError::MissingTimestamp)
        ));
        assert!(matches!(
            IncomingFrame::new("12ms", vec![1]).into_frame(),
            Err(FrameError::InvalidTimestamp(_))
        ));
    }
}
