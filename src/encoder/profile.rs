//! Encoding profile
//!
//! The MIME kinds and container extension are picked once at startup from
//! the host platform and then shared read-only by every recording.

use crate::capture::MediaKind;
use serde::{Deserialize, Serialize};

/// Host platform families that differ in supported capture containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    /// Only records MP4
    Apple,
    Other,
}

impl PlatformFamily {
    pub fn detect() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            PlatformFamily::Apple
        } else {
            PlatformFamily::Other
        }
    }
}

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Webm,
    Mp4,
}

impl Container {
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Webm => "webm",
            Container::Mp4 => "mp4",
        }
    }

    /// Container named by the subtype of a MIME kind such as `video/webm`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let subtype = mime.split(';').next()?.split('/').nth(1)?.trim();
        match subtype {
            "webm" => Some(Container::Webm),
            "mp4" => Some(Container::Mp4),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingProfile {
    pub platform: PlatformFamily,
    pub container: Container,
    pub video_mime: String,
    pub audio_mime: String,
}

impl EncodingProfile {
    pub fn for_platform(platform: PlatformFamily) -> Self {
        let container = match platform {
            PlatformFamily::Apple => Container::Mp4,
            PlatformFamily::Other => Container::Webm,
        };
        let extension = container.extension();

        Self {
            platform,
            container,
            video_mime: format!("video/{extension}"),
            audio_mime: format!("audio/{extension}"),
        }
    }

    pub fn detect() -> Self {
        Self::for_platform(PlatformFamily::detect())
    }

    pub fn mime_for(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Video => &self.video_mime,
            MediaKind::Audio => &self.audio_mime,
        }
    }

    pub fn extension(&self) -> &'static str {
        self.container.extension()
    }

    /// Suggested file name for a saved recording, e.g. `audio.webm`
    pub fn file_name(&self, kind: MediaKind) -> String {
        format!("{}.{}", kind.as_str(), self.extension())
    }
}
