//! Exported artifacts
//!
//! An artifact is every chunk of a recording concatenated in order. Handles
//! are the transient references given to the display surface and the save
//! action; dropping the last handle releases the artifact.

use crate::encoder::Chunk;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Concatenate `chunks` in the order given
    pub fn assemble(chunks: &[Chunk], mime_type: impl Into<String>) -> Self {
        let total: usize = chunks.iter().map(Chunk::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk.data);
        }

        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Shared reference to an artifact, addressable by URL
#[derive(Debug, Clone)]
pub struct ArtifactHandle {
    id: Uuid,
    artifact: Arc<Artifact>,
}

impl ArtifactHandle {
    pub fn new(artifact: Artifact) -> Self {
        Self {
            id: Uuid::new_v4(),
            artifact: Arc::new(artifact),
        }
    }

    pub fn url(&self) -> String {
        format!("blob:media-record/{}", self.id)
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_keeps_chunk_order() {
        let chunks = vec![
            Chunk::new(1, 0, b"ab".to_vec()),
            Chunk::new(1, 1, b"cd".to_vec()),
            Chunk::new(1, 2, b"e".to_vec()),
        ];
        let artifact = Artifact::assemble(&chunks, "video/webm");
        assert_eq!(artifact.bytes, b"abcde");
        assert_eq!(artifact.size(), 5);
        assert_eq!(artifact.mime_type, "video/webm");
    }

    #[test]
    fn test_handles_have_distinct_urls() {
        let a = ArtifactHandle::new(Artifact::assemble(&[], "audio/webm"));
        let b = ArtifactHandle::new(Artifact::assemble(&[], "audio/webm"));
        assert_ne!(a.url(), b.url());
        assert!(a.url().starts_with("blob:"));
        assert_eq!(a.artifact().size(), 0);
    }
}
