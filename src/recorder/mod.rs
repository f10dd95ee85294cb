//! Recording session
//!
//! This module implements the recording lifecycle:
//! - RecordingSession drives capture, encoding, preview and download
//! - HistoryLog keeps the user-facing status lines
//! - Artifact assembly and the file-save action

pub mod artifact;
pub mod coordinator;
pub mod history;
pub mod save;
pub mod state;

#[cfg(test)]
pub(crate) mod fakes;

pub use artifact::{Artifact, ArtifactHandle};
pub use coordinator::{Collaborators, RecordingSession, SessionEvent, SessionOptions};
pub use history::{HistoryEntry, HistoryLog};
pub use save::{DirectorySaver, FileSaver, SaveError};
pub use state::{CommandError, SessionSnapshot, SessionState};
