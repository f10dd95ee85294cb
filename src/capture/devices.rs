//! Native capture devices
//!
//! Microphones are enumerated with cpal, cameras with nokhwa. The native
//! provider reserves the chosen devices for the lifetime of the stream it
//! grants; the actual sample/frame pull happens in the encoder process.

use super::traits::{
    AcquisitionError, AudioDeviceInfo, CameraInfo, CaptureDeviceProvider, CaptureStream,
    MediaKind, MediaTrack, TrackKind,
};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};
use nokhwa::utils::{ApiBackend, CameraIndex};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Get list of available audio input devices (microphones)
pub fn get_audio_input_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|device| device.name().ok());

    match host.input_devices() {
        Ok(devices) => devices
            .filter_map(|device| device.name().ok())
            .map(|name| AudioDeviceInfo {
                id: name.clone(),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate audio input devices: {:?}", e);
            Vec::new()
        }
    }
}

/// Get list of available cameras
pub fn get_cameras() -> Result<Vec<CameraInfo>, AcquisitionError> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| {
        let message = e.to_string();
        if message.to_ascii_lowercase().contains("permission") {
            AcquisitionError::PermissionDenied(message)
        } else {
            AcquisitionError::Platform(message)
        }
    })?;

    Ok(cameras
        .into_iter()
        .map(|info| {
            let id = match info.index() {
                CameraIndex::Index(i) => i.to_string(),
                CameraIndex::String(s) => s.to_string(),
            };
            CameraInfo {
                id,
                name: info.human_name(),
            }
        })
        .collect())
}

/// Pick the default microphone, falling back to the first one listed
fn pick_microphone(devices: &[AudioDeviceInfo]) -> Option<&AudioDeviceInfo> {
    devices
        .iter()
        .find(|device| device.is_default)
        .or_else(|| devices.first())
}

/// Capture provider backed by the host's real devices
#[derive(Default)]
pub struct NativeCaptureProvider {
    /// Device IDs held by a live stream
    reserved: Arc<Mutex<HashSet<String>>>,
}

impl NativeCaptureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn select_tracks(kind: MediaKind) -> Result<Vec<MediaTrack>, AcquisitionError> {
        let constraints = kind.constraints();
        let mut tracks = Vec::new();

        if constraints.video {
            let cameras = get_cameras()?;
            let camera = cameras
                .into_iter()
                .next()
                .ok_or_else(|| AcquisitionError::DeviceNotFound("No camera found".to_string()))?;
            tracks.push(MediaTrack {
                kind: TrackKind::Video,
                device_id: camera.id,
                label: camera.name,
            });
        }

        if constraints.audio {
            let microphones = get_audio_input_devices();
            let microphone = pick_microphone(&microphones).ok_or_else(|| {
                AcquisitionError::DeviceNotFound("No microphone found".to_string())
            })?;
            tracks.push(MediaTrack {
                kind: TrackKind::Audio,
                device_id: microphone.id.clone(),
                label: microphone.name.clone(),
            });
        }

        Ok(tracks)
    }
}

#[async_trait]
impl CaptureDeviceProvider for NativeCaptureProvider {
    async fn acquire(&self, kind: MediaKind) -> Result<Box<dyn CaptureStream>, AcquisitionError> {
        tracing::info!("Acquiring {} capture stream", kind);

        let tracks = tokio::task::spawn_blocking(move || Self::select_tracks(kind))
            .await
            .map_err(|e| AcquisitionError::Platform(format!("Device query failed: {e}")))??;

        {
            let mut reserved = self.reserved.lock();
            if let Some(busy) = tracks.iter().find(|t| reserved.contains(&t.device_id)) {
                return Err(AcquisitionError::DeviceBusy(busy.label.clone()));
            }
            for track in &tracks {
                reserved.insert(track.device_id.clone());
            }
        }

        let stream = NativeStream {
            id: uuid::Uuid::new_v4().to_string(),
            tracks,
            reserved: self.reserved.clone(),
            live: true,
        };
        tracing::info!(
            "Granted capture stream {} with tracks: {:?}",
            stream.id,
            stream.tracks.iter().map(|t| &t.label).collect::<Vec<_>>()
        );
        Ok(Box::new(stream))
    }
}

/// Stream handed out by `NativeCaptureProvider`
pub struct NativeStream {
    id: String,
    tracks: Vec<MediaTrack>,
    reserved: Arc<Mutex<HashSet<String>>>,
    live: bool,
}

impl CaptureStream for NativeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    fn stop_tracks(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;

        let mut reserved = self.reserved.lock();
        for track in &self.tracks {
            reserved.remove(&track.device_id);
            tracing::debug!("Stopped {:?} track on {}", track.kind, track.label);
        }
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mic(name: &str, is_default: bool) -> AudioDeviceInfo {
        AudioDeviceInfo {
            id: name.to_string(),
            name: name.to_string(),
            is_default,
        }
    }

    #[test]
    fn test_pick_default_microphone() {
        let devices = vec![mic("USB", false), mic("Built-in", true)];
        assert_eq!(pick_microphone(&devices).unwrap().name, "Built-in");
    }

    #[test]
    fn test_pick_first_microphone_without_default() {
        let devices = vec![mic("USB", false), mic("Headset", false)];
        assert_eq!(pick_microphone(&devices).unwrap().name, "USB");
        assert!(pick_microphone(&[]).is_none());
    }

    #[test]
    fn test_stopping_stream_frees_reservation() {
        let reserved = Arc::new(Mutex::new(HashSet::from(["mic-0".to_string()])));
        let mut stream = NativeStream {
            id: "s".to_string(),
            tracks: vec![MediaTrack {
                kind: TrackKind::Audio,
                device_id: "mic-0".to_string(),
                label: "Mic".to_string(),
            }],
            reserved: reserved.clone(),
            live: true,
        };

        stream.stop_tracks();
        assert!(!stream.live);
        assert!(reserved.lock().is_empty());
    }
}
