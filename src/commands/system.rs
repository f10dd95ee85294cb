//! System-related commands
//!
//! These commands provide system information and the capture devices the
//! host exposes.

use crate::capture::{get_audio_input_devices, get_cameras, AudioDeviceInfo, CameraInfo};
use crate::encoder::EncodingProfile;
use serde::{Deserialize, Serialize};

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub os: String,
    pub os_version: String,
    pub arch: String,
    pub version: String,
    pub encoding: EncodingProfile,
}

/// Microphones and cameras visible to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceList {
    pub microphones: Vec<AudioDeviceInfo>,
    pub cameras: Vec<CameraInfo>,
    /// Why cameras could not be listed, if they couldn't
    pub camera_error: Option<String>,
}

/// Get basic system information
pub fn get_system_info(profile: &EncodingProfile) -> SystemInfo {
    SystemInfo {
        os: std::env::consts::OS.to_string(),
        os_version: get_os_version(),
        arch: std::env::consts::ARCH.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        encoding: profile.clone(),
    }
}

/// List capture devices. Enumeration blocks, so it runs off the runtime.
pub async fn get_devices() -> DeviceList {
    let listed = tokio::task::spawn_blocking(|| (get_audio_input_devices(), get_cameras())).await;

    match listed {
        Ok((microphones, Ok(cameras))) => DeviceList {
            microphones,
            cameras,
            camera_error: None,
        },
        Ok((microphones, Err(e))) => {
            tracing::warn!("Failed to enumerate cameras: {}", e);
            DeviceList {
                microphones,
                cameras: Vec::new(),
                camera_error: Some(e.to_string()),
            }
        }
        Err(e) => {
            tracing::error!("Device enumeration task failed: {}", e);
            DeviceList {
                microphones: Vec::new(),
                cameras: Vec::new(),
                camera_error: Some(e.to_string()),
            }
        }
    }
}

fn get_os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "ver"])
            .output()
            .ok()
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "Unknown".to_string())
    }
}
