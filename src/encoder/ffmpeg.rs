//! FFmpeg stream encoder
//!
//! Spawns FFmpeg reading the stream's devices and muxing to stdout. Output is
//! collected and handed to the session as one chunk per interval. Sending `q`
//! on stdin makes FFmpeg flush and exit, which ends the stdout pipe.

use super::profile::Container;
use super::traits::{
    Chunk, EncoderContext, EncoderError, EncoderEvent, EncoderFactory, EventSender, StreamEncoder,
};
use crate::capture::{CaptureStream, MediaTrack, TrackKind};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Host OS, selects the FFmpeg capture input device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(target_os = "windows") {
            HostOs::Windows
        } else {
            HostOs::Linux
        }
    }
}

fn find_track(tracks: &[MediaTrack], kind: TrackKind) -> Option<&MediaTrack> {
    tracks.iter().find(|t| t.kind == kind)
}

/// Input arguments for the capture devices of `tracks`
fn input_args(tracks: &[MediaTrack], os: HostOs) -> Vec<String> {
    let video = find_track(tracks, TrackKind::Video);
    let audio = find_track(tracks, TrackKind::Audio);
    let mut args = Vec::new();

    match os {
        HostOs::Linux => {
            if let Some(video) = video {
                let device = if video.device_id.parse::<u32>().is_ok() {
                    format!("/dev/video{}", video.device_id)
                } else {
                    video.device_id.clone()
                };
                args.extend(["-f".to_string(), "v4l2".to_string(), "-i".to_string(), device]);
            }
            if let Some(audio) = audio {
                args.extend([
                    "-f".to_string(),
                    "alsa".to_string(),
                    "-i".to_string(),
                    audio.device_id.clone(),
                ]);
            }
        }
        HostOs::MacOs => {
            // AVFoundation takes "<video>:<audio>" in one input
            let video_part = video.map(|v| v.device_id.as_str()).unwrap_or("none");
            let audio_part = match audio {
                Some(a) if a.device_id.parse::<u32>().is_ok() => a.device_id.as_str(),
                Some(_) => "default",
                None => "none",
            };
            args.extend([
                "-f".to_string(),
                "avfoundation".to_string(),
                "-i".to_string(),
                format!("{video_part}:{audio_part}"),
            ]);
        }
        HostOs::Windows => {
            let mut parts = Vec::new();
            if let Some(video) = video {
                parts.push(format!("video={}", video.label));
            }
            if let Some(audio) = audio {
                parts.push(format!("audio={}", audio.label));
            }
            args.extend([
                "-f".to_string(),
                "dshow".to_string(),
                "-i".to_string(),
                parts.join(":"),
            ]);
        }
    }

    args
}

/// Full FFmpeg argument list for encoding `tracks` into `container` on stdout
pub fn build_args(tracks: &[MediaTrack], container: Container, os: HostOs) -> Vec<String> {
    let has_video = find_track(tracks, TrackKind::Video).is_some();
    let has_audio = find_track(tracks, TrackKind::Audio).is_some();

    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.extend(input_args(tracks, os));

    let codec_args = match (container, has_video) {
        (Container::Webm, true) => vec!["-c:v", "libvpx", "-deadline", "realtime", "-b:v", "1M"],
        (Container::Mp4, true) => vec![
            "-c:v",
            "libx264",
            "-preset",
            "veryfast",
            "-pix_fmt",
            "yuv420p",
        ],
        (_, false) => vec!["-vn"],
    };
    args.extend(codec_args.iter().map(|s| s.to_string()));

    if has_audio {
        let audio_codec = match container {
            Container::Webm => "libopus",
            Container::Mp4 => "aac",
        };
        args.extend(["-c:a".to_string(), audio_codec.to_string()]);
    }

    let mux_args = match container {
        Container::Webm => vec!["-f", "webm"],
        // Fragmented so the stream can be cut into chunks while recording
        Container::Mp4 => vec![
            "-movflags",
            "frag_keyframe+empty_moov+default_base_moof",
            "-f",
            "mp4",
        ],
    };
    args.extend(mux_args.iter().map(|s| s.to_string()));
    args.push("pipe:1".to_string());

    args
}

/// Creates `FfmpegEncoder`s
pub struct FfmpegEncoderFactory {
    ffmpeg_path: PathBuf,
    os: HostOs,
}

impl FfmpegEncoderFactory {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            os: HostOs::current(),
        }
    }
}

impl EncoderFactory for FfmpegEncoderFactory {
    fn open(
        &self,
        stream: &dyn CaptureStream,
        context: EncoderContext,
    ) -> Result<Box<dyn StreamEncoder>, EncoderError> {
        if stream.tracks().is_empty() {
            return Err(EncoderError::EmptyStream);
        }
        let container = Container::from_mime(&context.mime_type)
            .ok_or_else(|| EncoderError::UnsupportedMime(context.mime_type.clone()))?;

        let args = build_args(stream.tracks(), container, self.os);
        tracing::debug!("FFmpeg encoder args for stream {}: {:?}", stream.id(), args);

        Ok(Box::new(FfmpegEncoder {
            ffmpeg_path: self.ffmpeg_path.clone(),
            args,
            context,
            stdin: None,
            pump: None,
        }))
    }
}

/// Encoder backed by an FFmpeg child process
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    args: Vec<String>,
    context: EncoderContext,
    stdin: Option<ChildStdin>,
    pump: Option<JoinHandle<()>>,
}

#[async_trait]
impl StreamEncoder for FfmpegEncoder {
    async fn begin(&mut self, interval: Duration) -> Result<(), EncoderError> {
        if self.pump.is_some() {
            return Err(EncoderError::AlreadyStarted);
        }

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EncoderError::Spawn(format!(
                    "{} ({}). Is FFmpeg installed?",
                    e,
                    self.ffmpeg_path.display()
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EncoderError::Spawn("FFmpeg stdout not captured".to_string()))?;
        self.stdin = child.stdin.take();

        tracing::info!(
            "Started FFmpeg encoder ({}), chunk interval {:?}",
            self.context.mime_type,
            interval
        );

        self.pump = Some(tokio::spawn(pump_output(
            child,
            stdout,
            interval,
            self.context.generation,
            self.context.events.clone(),
        )));
        Ok(())
    }

    async fn finalize(&mut self) -> Result<(), EncoderError> {
        let mut stdin = self.stdin.take().ok_or(EncoderError::NotStarted)?;
        tracing::debug!("Asking FFmpeg to finish");
        stdin.write_all(b"q").await?;
        stdin.flush().await?;
        Ok(())
    }

    fn abort(&mut self) {
        self.stdin = None;
        if let Some(pump) = self.pump.take() {
            // The pump owns the child, which is killed when the task drops it
            pump.abort();
            tracing::info!("Aborted FFmpeg encoder");
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Only abort when finalize never ran; otherwise let the flush finish
        if self.stdin.is_some() {
            if let Some(pump) = self.pump.take() {
                pump.abort();
            }
        }
    }
}

/// Read FFmpeg output, emitting one chunk per tick, until the pipe closes
async fn pump_output(
    mut child: Child,
    mut stdout: ChildStdout,
    interval: Duration,
    generation: u64,
    events: EventSender,
) {
    let stderr_task = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut message = String::new();
            let _ = stderr.read_to_string(&mut message).await;
            message
        })
    });

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut pending = Vec::new();
    let mut sequence = 0u64;

    loop {
        tokio::select! {
            read = stdout.read(&mut buffer) => match read {
                Ok(0) => break,
                Ok(n) => pending.extend_from_slice(&buffer[..n]),
                Err(e) => {
                    tracing::error!("Failed reading FFmpeg output: {}", e);
                    let _ = events.send(EncoderEvent::Failed {
                        generation,
                        reason: format!("Encoder output error: {e}"),
                    });
                    return;
                }
            },
            _ = ticker.tick() => {
                if !pending.is_empty() {
                    let data = std::mem::take(&mut pending);
                    let _ = events.send(EncoderEvent::ChunkReady(Chunk::new(generation, sequence, data)));
                    sequence += 1;
                }
            }
        }
    }

    if !pending.is_empty() {
        let _ = events.send(EncoderEvent::ChunkReady(Chunk::new(
            generation, sequence, pending,
        )));
    }

    let status = child.wait().await;
    let stderr = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => String::new(),
    };

    let event = match status {
        Ok(status) if status.success() => {
            tracing::info!("FFmpeg encoder finished");
            EncoderEvent::FinalizeComplete { generation }
        }
        Ok(status) => {
            tracing::warn!("FFmpeg exited with status {}: {}", status, stderr.trim());
            EncoderEvent::Failed {
                generation,
                reason: format!("Encoder exited with {}: {}", status, stderr.trim()),
            }
        }
        Err(e) => EncoderEvent::Failed {
            generation,
            reason: format!("Encoder wait failed: {e}"),
        },
    };
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(kind: TrackKind, id: &str, label: &str) -> MediaTrack {
        MediaTrack {
            kind,
            device_id: id.to_string(),
            label: label.to_string(),
        }
    }

    fn av_tracks() -> Vec<MediaTrack> {
        vec![
            track(TrackKind::Video, "0", "FaceTime HD Camera"),
            track(TrackKind::Audio, "default", "Built-in Microphone"),
        ]
    }

    #[test]
    fn test_linux_webm_video_args() {
        let args = build_args(&av_tracks(), Container::Webm, HostOs::Linux);
        let joined = args.join(" ");
        assert!(joined.contains("-f v4l2 -i /dev/video0"));
        assert!(joined.contains("-f alsa -i default"));
        assert!(joined.contains("-c:v libvpx"));
        assert!(joined.contains("-c:a libopus"));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn test_audio_only_drops_video() {
        let tracks = vec![track(TrackKind::Audio, "default", "Mic")];
        let args = build_args(&tracks, Container::Webm, HostOs::Linux);
        assert!(args.iter().any(|a| a == "-vn"));
        assert!(!args.iter().any(|a| a == "v4l2"));
    }

    #[test]
    fn test_macos_mp4_args() {
        let args = build_args(&av_tracks(), Container::Mp4, HostOs::MacOs);
        let joined = args.join(" ");
        assert!(joined.contains("-f avfoundation -i 0:default"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("frag_keyframe"));
    }

    #[test]
    fn test_windows_dshow_uses_labels() {
        let args = build_args(&av_tracks(), Container::Webm, HostOs::Windows);
        assert!(args
            .iter()
            .any(|a| a == "video=FaceTime HD Camera:audio=Built-in Microphone"));
    }

    #[test]
    fn test_factory_rejects_unknown_mime() {
        struct Empty(Vec<MediaTrack>);
        impl CaptureStream for Empty {
            fn id(&self) -> &str {
                "empty"
            }
            fn tracks(&self) -> &[MediaTrack] {
                &self.0
            }
            fn stop_tracks(&mut self) {}
        }

        let (events, _rx) = tokio::sync::mpsc::unbounded_channel();
        let factory = FfmpegEncoderFactory::new("ffmpeg");
        let context = EncoderContext {
            generation: 1,
            mime_type: "video/ogg".to_string(),
            events,
        };

        let stream = Empty(av_tracks());
        assert!(matches!(
            factory.open(&stream, context.clone()),
            Err(EncoderError::UnsupportedMime(_))
        ));

        let stream = Empty(Vec::new());
        assert!(matches!(
            factory.open(&stream, context),
            Err(EncoderError::EmptyStream)
        ));
    }
}
