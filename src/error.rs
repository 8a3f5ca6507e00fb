//! Error types for framevault

use std::path::PathBuf;

/// Admission-time errors: the frame never reaches a consumer.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Part arrived without a timestamp marker
    #[error("frame is missing its timestamp marker")]
    MissingTimestamp,

    /// Timestamp marker is not a decimal millisecond value
    #[error("invalid frame timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Errors raised while persisting a stream's segments.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Fatal: the writer cannot continue without a segment file
    #[error("failed to create segment {path:?}: {source}")]
    CreateSegment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recoverable: one entry is skipped
    #[error("failed to write entry {entry}: {source}")]
    WriteEntry {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to finalize segment {path:?}: {source}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare stream directory {path:?}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid stream name: {0:?}")]
    InvalidStreamName(String),
}

/// Retrieval failures. `NotFound` is never used for I/O problems.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("no frame at or before the requested timestamp")]
    NotFound,

    #[error("failed to read archive {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid stream name: {0:?}")]
    InvalidStreamName(String),

    /// The blocking lookup task panicked or was aborted
    #[error("retrieval task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl RetrievalError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RetrievalError::NotFound)
    }
}

/// Errors from the live transcode consumer.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("failed to spawn transcoder {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transcoder input closed: {0}")]
    Write(#[source] std::io::Error),

    #[error("transcoder exited with {0}")]
    Exited(std::process::ExitStatus),

    #[error("transcoder wait failed: {0}")]
    Wait(#[source] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Conditions that end the dispatcher's main loop
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("ingestion cancelled")]
    Cancelled,

    #[error(transparent)]
    Transcoder(#[from] TranscodeError),
}
