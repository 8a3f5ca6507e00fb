use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use framevault::config::ArchiveConfig;
use framevault::core::DirectorySource;
use framevault::engine::IngestSession;
use framevault::retrieval::RetrievalEngine;
use framevault::transcode::{NullSink, TranscodeSink};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "framevault", version, about = "Time-windowed JPEG frame archive")]
struct Cli {
    /// JSON config file; defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a directory of `<timestamp>.jpg` frames as one session
    Ingest {
        #[arg(long)]
        stream: String,

        #[arg(long)]
        frames: PathBuf,

        /// Archive only, do not start the HLS transcoder
        #[arg(long)]
        no_transcode: bool,

        /// Let ffmpeg log at its default level
        #[arg(long)]
        verbose: bool,
    },

    /// Write the frame at or before a timestamp to a file
    Lookup {
        #[arg(long)]
        stream: String,

        /// Target timestamp in milliseconds
        #[arg(long)]
        at: i64,

        #[arg(long)]
        output: PathBuf,
    },

    /// List a stream's archive segments
    Segments {
        #[arg(long)]
        stream: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "framevault=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ArchiveConfig::load(path)?,
        None => ArchiveConfig::default(),
    };

    match cli.command {
        Command::Ingest {
            stream,
            frames,
            no_transcode,
            verbose,
        } => {
            config.verbose_transcoder |= verbose;
            ingest(&config, &stream, frames, no_transcode).await
        }
        Command::Lookup { stream, at, output } => {
            let engine = RetrievalEngine::from_config(&config);
            let data = engine.lookup_async(&stream, at).await?;
            tokio::fs::write(&output, &data)
                .await
                .with_context(|| format!("Failed to write {:?}", output))?;
            println!("Wrote {} bytes to {}", data.len(), output.display());
            Ok(())
        }
        Command::Segments { stream } => {
            let engine = RetrievalEngine::from_config(&config);
            for segment in engine.list_segments(&stream)? {
                println!("{}\t{}", segment.id.start_ms, segment.path.display());
            }
            Ok(())
        }
    }
}

async fn ingest(config: &ArchiveConfig, stream: &str, frames: PathBuf, no_transcode: bool) -> Result<()> {
    tracing::info!("Starting framevault v{}", env!("CARGO_PKG_VERSION"));

    let source = DirectorySource::open(&frames)?;
    let session = IngestSession::prepare(config, stream).await?;

    let sink: Box<dyn TranscodeSink> = if no_transcode {
        Box::new(NullSink::new())
    } else {
        Box::new(session.spawn_transcoder()?)
    };

    let shutdown = session.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling ingestion");
            shutdown.cancel();
        }
    });

    let report = session.run(source, sink).await?;
    print!("{}", report.metrics.report());
    println!("Stopped: {:?}, archive writer: {:?}", report.dispatch, report.writer.stop);
    Ok(())
}
