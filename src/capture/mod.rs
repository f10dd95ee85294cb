//! Capture devices and streams
//!
//! This module provides the capture device provider abstraction, the scoped
//! stream guard, and the native provider built on cpal and nokhwa.

pub mod devices;
pub mod guard;
pub mod traits;

pub use devices::{get_audio_input_devices, get_cameras, NativeCaptureProvider};
pub use guard::StreamGuard;
pub use traits::{
    AcquisitionError, AudioDeviceInfo, CameraInfo, CaptureConstraints, CaptureDeviceProvider,
    CaptureStream, MediaKind, MediaTrack, TrackKind,
};
