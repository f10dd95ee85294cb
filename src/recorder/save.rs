//! Host file-save action
//!
//! Saves an artifact under a suggested file name. The native saver writes
//! into a directory, picking `name (1).ext` style names instead of
//! overwriting.

use super::artifact::ArtifactHandle;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

pub trait FileSaver: Send {
    fn save(&mut self, handle: &ArtifactHandle, suggested_name: &str) -> Result<PathBuf, SaveError>;
}

/// Saves into a fixed directory
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// First path in `dir` for `name` that does not exist yet
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };
    (1u32..)
        .map(|n| match extension {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

impl FileSaver for DirectorySaver {
    fn save(&mut self, handle: &ArtifactHandle, suggested_name: &str) -> Result<PathBuf, SaveError> {
        if suggested_name.is_empty() || suggested_name.contains(['/', '\\']) {
            return Err(SaveError::InvalidName(suggested_name.to_string()));
        }

        fs::create_dir_all(&self.dir)?;
        let path = unique_path(&self.dir, suggested_name);
        fs::write(&path, &handle.artifact().bytes)?;

        tracing::info!(
            "Saved {} ({} bytes) to {:?}",
            handle.url(),
            handle.artifact().size(),
            path
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::artifact::Artifact;
    use tempfile::tempdir;

    fn handle(bytes: &[u8]) -> ArtifactHandle {
        ArtifactHandle::new(Artifact {
            mime_type: "video/webm".to_string(),
            bytes: bytes.to_vec(),
        })
    }

    #[test]
    fn test_save_writes_bytes() {
        let dir = tempdir().unwrap();
        let mut saver = DirectorySaver::new(dir.path().join("out"));

        let path = saver.save(&handle(b"webm-bytes"), "video.webm").unwrap();

        assert_eq!(path, dir.path().join("out").join("video.webm"));
        assert_eq!(fs::read(&path).unwrap(), b"webm-bytes");
    }

    #[test]
    fn test_save_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let mut saver = DirectorySaver::new(dir.path());

        let first = saver.save(&handle(b"one"), "audio.webm").unwrap();
        let second = saver.save(&handle(b"two"), "audio.webm").unwrap();

        assert_ne!(first, second);
        assert_eq!(second, dir.path().join("audio (1).webm"));
        assert_eq!(fs::read(&first).unwrap(), b"one");
    }

    #[test]
    fn test_save_rejects_paths() {
        let dir = tempdir().unwrap();
        let mut saver = DirectorySaver::new(dir.path());
        assert!(matches!(
            saver.save(&handle(b"x"), "../video.webm"),
            Err(SaveError::InvalidName(_))
        ));
    }
}
