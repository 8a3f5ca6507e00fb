use serde::{Deserialize, Serialize};

/// Archive writer lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriterState {
    NoSegment,
    SegmentOpen { segment_start_ms: i64, entries: u64 },
    Closed,
}

impl WriterState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &WriterState) -> bool {
        use WriterState::*;

        matches!(
            (self, target),
            (NoSegment, SegmentOpen { .. })
                | (NoSegment, Closed)
                // rotation, or another entry appended
                | (SegmentOpen { .. }, SegmentOpen { .. })
                | (SegmentOpen { .. }, Closed)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::NoSegment => "NoSegment",
            Self::SegmentOpen { .. } => "SegmentOpen",
            Self::Closed => "Closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl Default for WriterState {
    fn default() -> Self {
        Self::NoSegment
    }
}
