//! On-disk archive: per-stream directories of time-windowed tar segments.

pub mod layout;
pub mod segment;
pub mod state;
pub mod writer;

pub use layout::{validate_stream_name, StreamLayout};
pub use segment::{read_entries, SegmentEntry, SegmentId, SegmentWriter, SEGMENT_EXTENSION};
pub use state::WriterState;
pub use writer::{ArchiveWriter, WriterReport, WriterStop};
