//! Scoped ownership of a capture stream
//!
//! A `StreamGuard` stops the tracks of the stream it owns exactly once:
//! either when `release` is called or when the guard is dropped.

use super::traits::CaptureStream;

pub struct StreamGuard {
    stream: Option<Box<dyn CaptureStream>>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn CaptureStream>) -> Self {
        tracing::debug!("Guarding capture stream {}", stream.id());
        Self {
            stream: Some(stream),
        }
    }

    /// The guarded stream, `None` once released
    pub fn stream(&self) -> Option<&dyn CaptureStream> {
        self.stream.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    /// Stop the stream's tracks. Later calls are no-ops.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            tracing::info!(
                "Releasing capture stream {} ({} tracks)",
                stream.id(),
                stream.tracks().len()
            );
            stream.stop_tracks();
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}
