//! Stream encoding
//!
//! Encoder traits and events, the process-wide encoding profile, and the
//! FFmpeg-backed native encoder.

pub mod ffmpeg;
pub mod profile;
pub mod traits;

pub use ffmpeg::FfmpegEncoderFactory;
pub use profile::{Container, EncodingProfile, PlatformFamily};
pub use traits::{
    Chunk, EncoderContext, EncoderError, EncoderEvent, EncoderFactory, EventReceiver,
    EventSender, StreamEncoder,
};
