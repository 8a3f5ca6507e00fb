//! Live transcode path. The encoder itself is an external process; this
//! module only feeds it.

pub mod ffmpeg;
pub mod sink;

pub use ffmpeg::{ffmpeg_args, FfmpegTranscoder};
pub use sink::{NullSink, PipeSink, TranscodeSink};
