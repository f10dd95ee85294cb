//! In-memory collaborators for session tests

use super::artifact::ArtifactHandle;
use super::save::{FileSaver, SaveError};
use crate::capture::{
    AcquisitionError, CaptureDeviceProvider, CaptureStream, MediaKind, MediaTrack, TrackKind,
};
use crate::display::{DisplayError, DisplaySurface};
use crate::encoder::{
    Chunk, EncoderContext, EncoderError, EncoderEvent, EncoderFactory, EventSender, StreamEncoder,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct ProviderInner {
    requests: Vec<MediaKind>,
    deny: Option<AcquisitionError>,
}

#[derive(Clone, Default)]
pub struct FakeProvider {
    inner: Arc<Mutex<ProviderInner>>,
    stops: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn denying(self, error: AcquisitionError) -> Self {
        self.inner.lock().deny = Some(error);
        self
    }

    pub fn requests(&self) -> Vec<MediaKind> {
        self.inner.lock().requests.clone()
    }

    /// How many times any granted stream had its tracks stopped
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDeviceProvider for FakeProvider {
    async fn acquire(&self, kind: MediaKind) -> Result<Box<dyn CaptureStream>, AcquisitionError> {
        let mut inner = self.inner.lock();
        inner.requests.push(kind);
        if let Some(error) = inner.deny.clone() {
            return Err(error);
        }

        let constraints = kind.constraints();
        let mut tracks = Vec::new();
        if constraints.video {
            tracks.push(MediaTrack {
                kind: TrackKind::Video,
                device_id: "cam-0".to_string(),
                label: "Fake Camera".to_string(),
            });
        }
        if constraints.audio {
            tracks.push(MediaTrack {
                kind: TrackKind::Audio,
                device_id: "mic-0".to_string(),
                label: "Fake Microphone".to_string(),
            });
        }

        Ok(Box::new(FakeStream {
            tracks,
            stops: self.stops.clone(),
        }))
    }
}

struct FakeStream {
    tracks: Vec<MediaTrack>,
    stops: Arc<AtomicUsize>,
}

impl CaptureStream for FakeStream {
    fn id(&self) -> &str {
        "fake-stream"
    }

    fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    fn stop_tracks(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct OpenedEncoder {
    pub generation: u64,
    pub mime_type: String,
    pub tracks: Vec<TrackKind>,
}

#[derive(Default)]
struct EncodersInner {
    opened: Vec<OpenedEncoder>,
    senders: Vec<EventSender>,
    fail_open: bool,
    fail_begin: bool,
    stall: bool,
    flush: Option<Vec<u8>>,
    sequence: u64,
    aborts: usize,
}

/// Encoder factory whose encoders only emit what the test tells them to
#[derive(Clone, Default)]
pub struct FakeEncoders {
    inner: Arc<Mutex<EncodersInner>>,
}

impl FakeEncoders {
    /// Encoders deliver `data` as a last chunk when finalized
    pub fn with_flush(self, data: Vec<u8>) -> Self {
        self.inner.lock().flush = Some(data);
        self
    }

    pub fn failing_open(self) -> Self {
        self.inner.lock().fail_open = true;
        self
    }

    /// Encoders open but refuse to begin
    pub fn failing_begin(self) -> Self {
        self.inner.lock().fail_begin = true;
        self
    }

    /// Encoders accept `finalize` but never report completion
    pub fn stalling(self) -> Self {
        self.inner.lock().stall = true;
        self
    }

    /// How many encoders were aborted
    pub fn aborts(&self) -> usize {
        self.inner.lock().aborts
    }

    pub fn opened(&self) -> Vec<OpenedEncoder> {
        self.inner.lock().opened.clone()
    }

    /// Event sender of the `index`th opened encoder
    pub fn sender(&self, index: usize) -> EventSender {
        self.inner.lock().senders[index].clone()
    }

    /// Emit a chunk from the most recently opened encoder
    pub fn emit(&self, data: Vec<u8>) {
        let mut inner = self.inner.lock();
        let generation = inner.opened.last().map(|o| o.generation).unwrap_or(0);
        let sequence = inner.sequence;
        inner.sequence += 1;
        if let Some(sender) = inner.senders.last() {
            let _ = sender.send(EncoderEvent::ChunkReady(Chunk::new(generation, sequence, data)));
        }
    }

    /// Make the most recently opened encoder fail
    pub fn fail(&self, reason: &str) {
        let inner = self.inner.lock();
        if let (Some(opened), Some(sender)) = (inner.opened.last(), inner.senders.last()) {
            let _ = sender.send(EncoderEvent::Failed {
                generation: opened.generation,
                reason: reason.to_string(),
            });
        }
    }
}

impl EncoderFactory for FakeEncoders {
    fn open(
        &self,
        stream: &dyn CaptureStream,
        context: EncoderContext,
    ) -> Result<Box<dyn StreamEncoder>, EncoderError> {
        let mut inner = self.inner.lock();
        if inner.fail_open {
            return Err(EncoderError::Spawn("fake encoder refused to open".to_string()));
        }

        inner.opened.push(OpenedEncoder {
            generation: context.generation,
            mime_type: context.mime_type.clone(),
            tracks: stream.tracks().iter().map(|t| t.kind).collect(),
        });
        inner.senders.push(context.events.clone());
        inner.sequence = 0;

        Ok(Box::new(FakeEncoder {
            flush: inner.flush.clone(),
            fail_begin: inner.fail_begin,
            stall: inner.stall,
            context,
            started: false,
            shared: self.inner.clone(),
        }))
    }
}

struct FakeEncoder {
    flush: Option<Vec<u8>>,
    fail_begin: bool,
    stall: bool,
    context: EncoderContext,
    started: bool,
    shared: Arc<Mutex<EncodersInner>>,
}

#[async_trait]
impl StreamEncoder for FakeEncoder {
    async fn begin(&mut self, _interval: Duration) -> Result<(), EncoderError> {
        if self.started {
            return Err(EncoderError::AlreadyStarted);
        }
        if self.fail_begin {
            return Err(EncoderError::Spawn("fake encoder could not begin".to_string()));
        }
        self.started = true;
        Ok(())
    }

    async fn finalize(&mut self) -> Result<(), EncoderError> {
        if !self.started {
            return Err(EncoderError::NotStarted);
        }
        if self.stall {
            return Ok(());
        }
        let generation = self.context.generation;
        if let Some(data) = self.flush.take() {
            let _ = self
                .context
                .events
                .send(EncoderEvent::ChunkReady(Chunk::new(generation, u64::MAX, data)));
        }
        let _ = self
            .context
            .events
            .send(EncoderEvent::FinalizeComplete { generation });
        Ok(())
    }

    fn abort(&mut self) {
        self.shared.lock().aborts += 1;
    }
}

/// Display surface whose binding is visible to the test through clones
#[derive(Clone, Default)]
pub struct FakeDisplay {
    shared: Arc<Mutex<Option<ArtifactHandle>>>,
    current: Option<ArtifactHandle>,
}

impl FakeDisplay {
    pub fn shown(&self) -> Option<ArtifactHandle> {
        self.shared.lock().clone()
    }
}

impl DisplaySurface for FakeDisplay {
    fn bind(&mut self, handle: ArtifactHandle) -> Result<(), DisplayError> {
        *self.shared.lock() = Some(handle.clone());
        self.current = Some(handle);
        Ok(())
    }

    fn release(&mut self) -> Option<ArtifactHandle> {
        *self.shared.lock() = None;
        self.current.take()
    }

    fn location(&self) -> Option<String> {
        self.current.as_ref().map(ArtifactHandle::url)
    }
}

#[derive(Clone, Default)]
pub struct FakeSaver {
    saved: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl FakeSaver {
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().clone()
    }
}

impl FileSaver for FakeSaver {
    fn save(&mut self, handle: &ArtifactHandle, suggested_name: &str) -> Result<PathBuf, SaveError> {
        self.saved
            .lock()
            .push((suggested_name.to_string(), handle.artifact().bytes.clone()));
        Ok(PathBuf::from(suggested_name))
    }
}
