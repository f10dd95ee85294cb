//! media-record - record, preview and save camera and microphone captures.
//!
//! This is the library crate behind the `media-record` console. It wires the
//! recording session to the native capture devices, an FFmpeg encoder and
//! the filesystem.

pub mod capture;
pub mod commands;
pub mod config;
pub mod display;
pub mod encoder;
pub mod recorder;
pub mod utils;

use capture::NativeCaptureProvider;
use config::Config;
use display::TempFilePreview;
use encoder::FfmpegEncoderFactory;
use recorder::{Collaborators, DirectorySaver, RecordingSession};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the session from configuration
pub fn build_session(config: &Config) -> RecordingSession {
    let display = match &config.preview_dir {
        Some(dir) => TempFilePreview::in_dir(dir),
        None => TempFilePreview::new(),
    };

    RecordingSession::new(
        config.session_options(),
        Collaborators {
            provider: Arc::new(NativeCaptureProvider::new()),
            encoders: Arc::new(FfmpegEncoderFactory::new(&config.ffmpeg_path)),
            display: Box::new(display),
            saver: Box::new(DirectorySaver::new(&config.output_dir)),
        },
    )
}

/// Run the application
pub async fn run() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with console output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_record_lib=debug,media_record=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting media-record v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    tracing::debug!("Configuration: {:?}", config);

    let mut session = build_session(&config);
    tracing::info!(
        "Recording as {} / {}, saving to {:?}",
        session.profile().video_mime,
        session.profile().audio_mime,
        config.output_dir
    );

    commands::console::run_console(
        &mut session,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    tracing::info!("Shutting down");
    Ok(())
}
