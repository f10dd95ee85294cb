//! Stream encoder abstraction
//!
//! Encoders report back through typed events on a single-consumer channel
//! instead of callbacks. Every event carries the recording generation it
//! was opened for.

use crate::capture::CaptureStream;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// One periodic segment of encoded media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Recording generation the chunk belongs to
    pub generation: u64,

    /// Position within the recording, starting at 0
    pub sequence: u64,

    /// Encoded bytes
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(generation: u64, sequence: u64, data: Vec<u8>) -> Self {
        Self {
            generation,
            sequence,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Events emitted by an encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A chunk of encoded data is available
    ChunkReady(Chunk),
    /// The encoder flushed its last data after `finalize`
    FinalizeComplete { generation: u64 },
    /// The encoder stopped on its own
    Failed { generation: u64, reason: String },
}

impl EncoderEvent {
    pub fn generation(&self) -> u64 {
        match self {
            EncoderEvent::ChunkReady(chunk) => chunk.generation,
            EncoderEvent::FinalizeComplete { generation } => *generation,
            EncoderEvent::Failed { generation, .. } => *generation,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<EncoderEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EncoderEvent>;

/// Encoder errors
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Failed to start encoder: {0}")]
    Spawn(String),

    #[error("Encoder IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported MIME type: {0}")]
    UnsupportedMime(String),

    #[error("Stream has no tracks to encode")]
    EmptyStream,

    #[error("Encoder already started")]
    AlreadyStarted,

    #[error("Encoder not started")]
    NotStarted,
}

/// What an encoder needs besides the stream itself
#[derive(Debug, Clone)]
pub struct EncoderContext {
    pub generation: u64,
    pub mime_type: String,
    pub events: EventSender,
}

/// A running encoder bound to one capture stream
#[async_trait]
pub trait StreamEncoder: Send {
    /// Start producing one chunk per `interval`
    async fn begin(&mut self, interval: Duration) -> Result<(), EncoderError>;

    /// Ask the encoder to flush and stop. Completion arrives later as
    /// `EncoderEvent::FinalizeComplete`.
    async fn finalize(&mut self) -> Result<(), EncoderError>;

    /// Stop immediately, discarding anything not yet delivered. No further
    /// events are sent.
    fn abort(&mut self);
}

/// Opens encoders against capture streams
pub trait EncoderFactory: Send + Sync {
    fn open(
        &self,
        stream: &dyn CaptureStream,
        context: EncoderContext,
    ) -> Result<Box<dyn StreamEncoder>, EncoderError>;
}
