//! Display surface
//!
//! Where a finished recording is bound for playback. A surface holds at most
//! one artifact handle; binding a new one or releasing drops the previous.

use crate::recorder::ArtifactHandle;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait DisplaySurface: Send {
    /// Bind `handle` for playback, releasing any previous binding
    fn bind(&mut self, handle: ArtifactHandle) -> Result<(), DisplayError>;

    /// Drop the current binding, if any
    fn release(&mut self) -> Option<ArtifactHandle>;

    /// Where the bound artifact can be played, if anything is bound
    fn location(&self) -> Option<String>;
}

struct PreviewFile {
    handle: ArtifactHandle,
    file: NamedTempFile,
}

/// Writes the bound artifact to a temporary file a media player can open.
/// The file is deleted when the binding is released.
pub struct TempFilePreview {
    dir: Option<PathBuf>,
    current: Option<PreviewFile>,
}

impl TempFilePreview {
    pub fn new() -> Self {
        Self {
            dir: None,
            current: None,
        }
    }

    /// Place preview files in `dir` instead of the system temp directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            current: None,
        }
    }
}

impl Default for TempFilePreview {
    fn default() -> Self {
        Self::new()
    }
}

fn extension_for(mime_type: &str) -> &str {
    mime_type
        .split(';')
        .next()
        .and_then(|m| m.split('/').nth(1))
        .unwrap_or("bin")
}

impl DisplaySurface for TempFilePreview {
    fn bind(&mut self, handle: ArtifactHandle) -> Result<(), DisplayError> {
        self.release();

        let suffix = format!(".{}", extension_for(&handle.artifact().mime_type));
        let mut builder = tempfile::Builder::new();
        builder.prefix("preview-").suffix(&suffix);
        let mut file = match &self.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        std::io::Write::write_all(&mut file, &handle.artifact().bytes)?;

        tracing::info!(
            "Preview of {} ready at {:?}",
            handle.url(),
            file.path()
        );
        self.current = Some(PreviewFile { handle, file });
        Ok(())
    }

    fn release(&mut self) -> Option<ArtifactHandle> {
        let preview = self.current.take()?;
        tracing::debug!("Released preview {}", preview.handle.url());
        Some(preview.handle)
    }

    fn location(&self) -> Option<String> {
        self.current
            .as_ref()
            .map(|p| p.file.path().display().to_string())
    }
}

impl Drop for TempFilePreview {
    fn drop(&mut self) {
        self.release();
    }
}
