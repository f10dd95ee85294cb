//! Recording state management
//!
//! Defines the session state machine states, command errors and the
//! serializable snapshot of a session.

use super::history::HistoryEntry;
use crate::capture::MediaKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current state of the recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing recorded yet, or the last start was aborted
    #[default]
    Idle,
    /// Capturing; also covers the wait for the encoder to finalize
    Recording,
    /// A recording finished and its preview (if any) is bound
    Previewing,
    /// Transient, only observable while a save is in progress
    Downloading,
}

/// Commands rejected because of the current state
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Not allowed while recording")]
    RecordingInProgress,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub finalizing: bool,
    pub kind: MediaKind,
    pub mime_type: String,
    pub elapsed_seconds: u64,
    pub chunk_count: usize,
    pub held_bytes: usize,
    /// Where the current preview can be played
    pub preview_location: Option<String>,
    pub history: Vec<HistoryEntry>,
}
