//! Point-in-time image retrieval: "what did stream X look like at time T?"

pub mod engine;

pub use engine::{scan_segment, RetrievalEngine, SegmentFile};
