//! Capture trait definitions
//!
//! Platform-agnostic traits for the capture device provider and the
//! streams it grants.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What the user asked to record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Camera and microphone
    #[default]
    Video,
    /// Microphone only
    Audio,
}

impl MediaKind {
    /// Track kinds requested from the provider for this media kind
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            audio: true,
            video: matches!(self, MediaKind::Video),
        }
    }

    /// Lowercase name, also the prefix of the MIME kind and file name
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            other => Err(format!("unknown media kind '{other}' (expected video or audio)")),
        }
    }
}

/// Which tracks a capture request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub audio: bool,
    pub video: bool,
}

/// Kind of a single track inside a capture stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// A live input track granted by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTrack {
    pub kind: TrackKind,

    /// Device identifier the track reads from
    pub device_id: String,

    /// Human readable device name
    pub label: String,
}

/// Errors raised while acquiring a capture stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Requested device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device is already in use: {0}")]
    DeviceBusy(String),

    #[error("Platform error: {0}")]
    Platform(String),
}

/// A live capture stream handle
///
/// The holder owns the underlying devices until `stop_tracks` is called.
pub trait CaptureStream: Send {
    /// Stream identifier
    fn id(&self) -> &str;

    /// Tracks carried by the stream
    fn tracks(&self) -> &[MediaTrack];

    /// Release every track, freeing the devices
    fn stop_tracks(&mut self);
}

/// Grants capture streams for a media kind
#[async_trait]
pub trait CaptureDeviceProvider: Send + Sync {
    async fn acquire(&self, kind: MediaKind) -> Result<Box<dyn CaptureStream>, AcquisitionError>;
}

/// Information about an audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Whether this is the default device
    pub is_default: bool,
}

/// Information about a camera/webcam
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_kind_requests_no_video() {
        let constraints = MediaKind::Audio.constraints();
        assert!(constraints.audio);
        assert!(!constraints.video);

        let constraints = MediaKind::Video.constraints();
        assert!(constraints.audio && constraints.video);
    }

    #[test]
    fn test_parse_media_kind() {
        assert_eq!("Video".parse::<MediaKind>(), Ok(MediaKind::Video));
        assert_eq!(" audio ".parse::<MediaKind>(), Ok(MediaKind::Audio));
        assert!("screen".parse::<MediaKind>().is_err());
    }
}
