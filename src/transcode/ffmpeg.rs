use super::sink::{PipeSink, TranscodeSink};
use crate::config::ArchiveConfig;
use crate::engine::shutdown::ShutdownSignal;
use crate::error::TranscodeError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, ChildStdin, Command};

/// Build the ffmpeg command line turning an MJPEG pipe into an HLS playlist
pub fn ffmpeg_args(config: &ArchiveConfig, hls_dir: &Path) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    if !config.verbose_transcoder {
        args.extend(["-loglevel".to_string(), "error".to_string()]);
    }

    let frame_rate = config.frame_rate.to_string();
    args.extend(
        [
            "-f", "mjpeg",
            "-framerate", frame_rate.as_str(),
            "-i", "-",
            "-c:v", "libx264",
            "-preset", "veryfast",
            "-tune", "zerolatency",
            "-crf", "23",
            "-g", "10",
            "-hls_time", "2",
            "-hls_list_size", "5",
            "-hls_flags", "delete_segments",
            "-flush_packets", "1",
            "-hls_segment_filename",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(hls_dir.join("segment%03d.ts").to_string_lossy().into_owned());
    args.push(hls_dir.join("playlist.m3u8").to_string_lossy().into_owned());
    args
}

/// ffmpeg subprocess fed through its stdin.
///
/// The child is killed when the session is cancelled or when this value is
/// dropped without `finish`.
pub struct FfmpegTranscoder {
    child: Child,
    stdin: PipeSink<ChildStdin>,
    shutdown: ShutdownSignal,
}

impl FfmpegTranscoder {
    pub fn spawn(
        config: &ArchiveConfig,
        hls_dir: &Path,
        shutdown: ShutdownSignal,
    ) -> Result<Self, TranscodeError> {
        let program = config.ffmpeg_path.clone();
        let spawn_err = |source| TranscodeError::Spawn {
            program: program.clone(),
            source,
        };

        let mut child = Command::new(&config.ffmpeg_path)
            .args(ffmpeg_args(config, hls_dir))
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        let stdin = child.stdin.take().ok_or_else(|| {
            spawn_err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "transcoder stdin unavailable",
            ))
        })?;

        tracing::info!(program = %config.ffmpeg_path, hls_dir = ?hls_dir, "Started transcoder");

        Ok(Self {
            child,
            stdin: PipeSink::new(stdin),
            shutdown,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

#[async_trait]
impl TranscodeSink for FfmpegTranscoder {
    async fn write_frame(&mut self, data: &[u8]) -> Result<(), TranscodeError> {
        self.stdin.write_frame(data).await
    }

    async fn finish(&mut self) -> Result<(), TranscodeError> {
        // ffmpeg exits once its stdin is closed
        if let Err(e) = self.stdin.finish().await {
            if !self.shutdown.is_cancelled() {
                tracing::warn!(error = %e, "Failed to close transcoder input");
            }
        }

        let status = tokio::select! {
            status = self.child.wait() => status.map_err(TranscodeError::Wait)?,
            _ = self.shutdown.cancelled() => {
                if let Err(e) = self.child.kill().await {
                    tracing::debug!(error = %e, "Transcoder already gone");
                }
                return Ok(());
            }
        };

        if !status.success() && !self.shutdown.is_cancelled() {
            return Err(TranscodeError::Exited(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_quiet_by_default() {
        let config = ArchiveConfig::default();
        let args = ffmpeg_args(&config, Path::new("/hls/cam"));

        assert_eq!(&args[..2], &["-loglevel", "error"]);
        assert!(args.windows(2).any(|w| w == ["-framerate", "5"]));
        assert_eq!(args.last().unwrap(), "/hls/cam/playlist.m3u8");
        assert!(args.contains(&"/hls/cam/segment%03d.ts".to_string()));
    }

    #[test]
    fn test_args_verbose() {
        let config = ArchiveConfig {
            verbose_transcoder: true,
            frame_rate: 10,
            ..ArchiveConfig::default()
        };
        let args = ffmpeg_args(&config, Path::new("/hls/cam"));

        assert_eq!(args[0], "-f");
        assert!(args.windows(2).any(|w| w == ["-framerate", "10"]));
    }
}
