//! In-memory artifact store
//!
//! A process-local [`ArtifactStore`] used by tests and local runs.

use crate::engine::traits::{ArtifactRef, ArtifactStore, BuildArtifact};
use crate::pipeline::{PublisherError, TagSet};
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::Mutex;

/// In-memory tag-to-artifact mapping
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<AHashMap<String, ArtifactRef>>,
}

impl InMemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tag directly, bypassing publish
    pub fn seed(&self, tag: impl Into<String>, reference: impl Into<String>) {
        self.entries.lock().insert(
            tag.into(),
            ArtifactRef {
                reference: reference.into(),
            },
        );
    }

    /// Number of stored tags
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true when no tags are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryStore {
    async fn publish(
        &self,
        artifact: &BuildArtifact,
        tags: &TagSet,
    ) -> Result<ArtifactRef, PublisherError> {
        let reference = ArtifactRef {
            reference: format!("mem://{}@{}", artifact.name, artifact.digest),
        };
        let mut entries = self.entries.lock();
        for tag in tags.tags() {
            entries.insert(tag.to_string(), reference.clone());
        }
        tracing::debug!(artifact = %artifact.name, tags = tags.tags().len(), "Artifact published");
        Ok(reference)
    }

    async fn pull(&self, tag: &str) -> Result<Option<ArtifactRef>, PublisherError> {
        Ok(self.entries.lock().get(tag).cloned())
    }
}
