//! Recording session coordinator
//!
//! Owns the capture stream, the encoder and the recorded chunks, and moves
//! the session through Idle → Recording → Previewing. Encoder output arrives
//! as `EncoderEvent`s on a single channel that the owner feeds back through
//! `handle_event`.

use super::artifact::{Artifact, ArtifactHandle};
use super::history::HistoryLog;
use super::save::FileSaver;
use super::state::{CommandError, SessionSnapshot, SessionState};
use crate::capture::{CaptureDeviceProvider, MediaKind, StreamGuard};
use crate::display::DisplaySurface;
use crate::encoder::{
    Chunk, EncoderContext, EncoderError, EncoderEvent, EncoderFactory, EncodingProfile,
    EventReceiver, EventSender, StreamEncoder,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Notifications for whoever renders the session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// State changed
    StateChanged(SessionState),
    /// A line was appended to the history
    Logged(String),
    /// The history was cleared
    HistoryCleared,
    /// A preview was bound to the display surface
    PreviewReady { location: String, size: usize },
    /// A recording was saved
    Saved { name: String, path: String },
}

/// Session settings fixed at construction
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub profile: EncodingProfile,
    pub chunk_interval: Duration,
    pub initial_kind: MediaKind,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            profile: EncodingProfile::detect(),
            chunk_interval: Duration::from_secs(1),
            initial_kind: MediaKind::Video,
        }
    }
}

/// External collaborators the session drives
pub struct Collaborators {
    pub provider: Arc<dyn CaptureDeviceProvider>,
    pub encoders: Arc<dyn EncoderFactory>,
    pub display: Box<dyn DisplaySurface>,
    pub saver: Box<dyn FileSaver>,
}

pub struct RecordingSession {
    state: SessionState,

    /// Stop was requested and the encoder has not finished flushing
    finalizing: bool,

    /// Kind selected for the next recording
    kind: MediaKind,

    /// Kind of the chunks currently held
    recorded_kind: Option<MediaKind>,

    profile: EncodingProfile,
    chunk_interval: Duration,

    /// Chunks received since start, reset to 0 on stop
    elapsed: u64,
    chunks: Vec<Chunk>,

    /// Bumped on every start; events from older encoders are dropped
    generation: u64,

    stream: Option<StreamGuard>,
    encoder: Option<Box<dyn StreamEncoder>>,
    history: HistoryLog,

    provider: Arc<dyn CaptureDeviceProvider>,
    encoders: Arc<dyn EncoderFactory>,
    display: Box<dyn DisplaySurface>,
    saver: Box<dyn FileSaver>,

    events_tx: EventSender,
    events_rx: Option<EventReceiver>,
    notify_tx: broadcast::Sender<SessionEvent>,
}

impl RecordingSession {
    pub fn new(options: SessionOptions, collaborators: Collaborators) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notify_tx, _) = broadcast::channel(256);

        tracing::info!(
            "Recording session ready: {:?} container, {:?} chunks",
            options.profile.container,
            options.chunk_interval
        );

        Self {
            state: SessionState::Idle,
            finalizing: false,
            kind: options.initial_kind,
            recorded_kind: None,
            profile: options.profile,
            chunk_interval: options.chunk_interval,
            elapsed: 0,
            chunks: Vec::new(),
            generation: 0,
            stream: None,
            encoder: None,
            history: HistoryLog::new(),
            provider: collaborators.provider,
            encoders: collaborators.encoders,
            display: collaborators.display,
            saver: collaborators.saver,
            events_tx,
            events_rx: Some(events_rx),
            notify_tx,
        }
    }

    /// Subscribe to session notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.notify_tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True from `start` until the encoder has finalized
    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_finalizing(&self) -> bool {
        self.finalizing
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn profile(&self) -> &EncodingProfile {
        &self.profile
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn has_stream(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| !s.is_released())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            finalizing: self.finalizing,
            kind: self.kind,
            mime_type: self.profile.mime_for(self.kind).to_string(),
            elapsed_seconds: self.elapsed,
            chunk_count: self.chunks.len(),
            held_bytes: self.chunks.iter().map(Chunk::len).sum(),
            preview_location: self.display.location(),
            history: self.history.entries().to_vec(),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!("Session state {:?} -> {:?}", self.state, state);
            self.state = state;
            let _ = self.notify_tx.send(SessionEvent::StateChanged(state));
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = self.history.push(message).message.clone();
        let _ = self.notify_tx.send(SessionEvent::Logged(message));
    }

    /// Select what the next recording captures
    pub fn select(&mut self, kind: MediaKind) -> Result<(), CommandError> {
        if self.is_recording() {
            return Err(CommandError::RecordingInProgress);
        }
        if self.kind != kind {
            tracing::info!("Selected {} recording", kind);
            self.kind = kind;
        }
        Ok(())
    }

    /// Start a new recording.
    ///
    /// Acquisition and encoder failures do not produce an error: they are
    /// logged to the history and the session returns to Idle.
    pub async fn start(&mut self) -> Result<(), CommandError> {
        if self.is_recording() {
            return Err(CommandError::AlreadyRecording);
        }

        self.chunks.clear();
        self.elapsed = 0;
        self.generation += 1;
        self.recorded_kind = Some(self.kind);
        self.release_preview();
        self.set_state(SessionState::Recording);
        self.log("Recording started");

        let kind = self.kind;
        let stream = match self.provider.acquire(kind).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Capture request failed: {}", e);
                self.abort_start(e.to_string());
                return Ok(());
            }
        };
        let guard = StreamGuard::new(stream);
        self.log("Got media stream");

        let mime_type = self.profile.mime_for(kind).to_string();
        let context = EncoderContext {
            generation: self.generation,
            mime_type: mime_type.clone(),
            events: self.events_tx.clone(),
        };
        let opened = match guard.stream() {
            Some(stream) => self.encoders.open(stream, context),
            None => Err(EncoderError::EmptyStream),
        };
        let mut encoder = match opened {
            Ok(encoder) => encoder,
            Err(e) => {
                tracing::error!("Failed to open encoder: {}", e);
                drop(guard);
                self.abort_start(e.to_string());
                return Ok(());
            }
        };

        if let Err(e) = encoder.begin(self.chunk_interval).await {
            tracing::error!("Failed to begin encoding: {}", e);
            drop(encoder);
            drop(guard);
            self.abort_start(e.to_string());
            return Ok(());
        }

        self.log(format!("Media recorder started with mimeType {mime_type}"));
        self.stream = Some(guard);
        self.encoder = Some(encoder);
        Ok(())
    }

    fn abort_start(&mut self, reason: String) {
        self.log(reason);
        self.recorded_kind = None;
        self.set_state(SessionState::Idle);
    }

    /// Stop the current recording. The preview appears once the encoder
    /// reports `FinalizeComplete`. Stopping again while waiting for that
    /// abandons the encoder and previews what was received so far.
    pub async fn stop(&mut self) -> Result<(), CommandError> {
        if !self.is_recording() {
            return Err(CommandError::NotRecording);
        }
        if self.finalizing {
            if let Some(mut encoder) = self.encoder.take() {
                tracing::warn!("Encoder did not finalize, aborting it");
                encoder.abort();
            }
            self.log("Encoder did not finish, showing what was recorded");
            self.finish_recording();
            return Ok(());
        }

        self.elapsed = 0;
        self.log("Stopped recording");
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }

        match self.encoder.as_mut() {
            Some(encoder) => match encoder.finalize().await {
                Ok(()) => self.finalizing = true,
                Err(e) => {
                    tracing::error!("Encoder finalize failed: {}", e);
                    self.log(e.to_string());
                    self.finish_recording();
                }
            },
            None => self.finish_recording(),
        }
        Ok(())
    }

    /// Hand the encoder event receiver to a driver loop. Events it receives
    /// must be passed back through `handle_event`.
    pub fn take_events(&mut self) -> Option<EventReceiver> {
        self.events_rx.take()
    }

    /// Wait for the next encoder event, `None` once the receiver was taken
    pub async fn next_event(&mut self) -> Option<EncoderEvent> {
        self.events_rx.as_mut()?.recv().await
    }

    /// Handle every event already queued, returning how many were handled
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.events_rx.as_mut().map(|rx| rx.try_recv()) {
                Some(Ok(event)) => event,
                _ => break,
            };
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: EncoderEvent) {
        if event.generation() != self.generation || !self.is_recording() {
            tracing::debug!(
                "Dropping event for generation {} (current {}, {:?})",
                event.generation(),
                self.generation,
                self.state
            );
            return;
        }

        match event {
            EncoderEvent::ChunkReady(chunk) => {
                if chunk.is_empty() {
                    return;
                }
                if self.finalizing {
                    tracing::debug!("Final chunk {} ({} bytes)", chunk.sequence, chunk.len());
                    self.chunks.push(chunk);
                } else {
                    self.elapsed += 1;
                    self.chunks.push(chunk);
                    self.log(format!("Recorded...: {}s", self.elapsed));
                }
            }
            EncoderEvent::FinalizeComplete { .. } => self.finish_recording(),
            EncoderEvent::Failed { reason, .. } => {
                tracing::error!("Encoder failed: {}", reason);
                self.log(reason);
                self.finish_recording();
            }
        }
    }

    fn finish_recording(&mut self) {
        self.encoder = None;
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
        self.elapsed = 0;
        self.finalizing = false;
        self.set_state(SessionState::Previewing);
        self.log("Showing the preview");

        if self.chunks.is_empty() {
            tracing::info!("Nothing recorded, no preview to show");
            return;
        }

        let handle = ArtifactHandle::new(self.assemble_artifact());
        let size = handle.artifact().size();
        match self.display.bind(handle) {
            Ok(()) => {
                let location = self.display.location().unwrap_or_default();
                let _ = self.notify_tx.send(SessionEvent::PreviewReady { location, size });
            }
            Err(e) => {
                tracing::error!("Failed to bind preview: {}", e);
                self.log(format!("Preview failed: {e}"));
            }
        }
    }

    fn assemble_artifact(&self) -> Artifact {
        let kind = self.recorded_kind.unwrap_or(self.kind);
        Artifact::assemble(&self.chunks, self.profile.mime_for(kind))
    }

    fn release_preview(&mut self) {
        if let Some(handle) = self.display.release() {
            tracing::debug!("Unbound preview {}", handle.url());
        }
    }

    /// Save the held chunks as a file
    pub fn download(&mut self) -> Result<(), CommandError> {
        if self.is_recording() {
            return Err(CommandError::RecordingInProgress);
        }

        let previous = self.state;
        self.set_state(SessionState::Downloading);

        let artifact = self.assemble_artifact();
        self.log("Downloading file");
        self.log(format!("File Size: {}", artifact.size()));

        let name = self
            .profile
            .file_name(self.recorded_kind.unwrap_or(self.kind));
        let handle = ArtifactHandle::new(artifact);
        let result = self.saver.save(&handle, &name);
        drop(handle);

        match result {
            Ok(path) => {
                self.log(format!("Downloaded: {name}"));
                let _ = self.notify_tx.send(SessionEvent::Saved {
                    name,
                    path: path.to_string_lossy().to_string(),
                });
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", name, e);
                self.log(format!("Download failed: {e}"));
            }
        }

        self.set_state(previous);
        Ok(())
    }

    /// Reset the history to its initial entry
    pub fn clear(&mut self) {
        self.history.reset();
        let _ = self.notify_tx.send(SessionEvent::HistoryCleared);
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.encoder = None;
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
        self.release_preview();
    }
}
