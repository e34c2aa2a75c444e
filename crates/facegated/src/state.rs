use facegate_core::{Embedding, StoreError, TargetStore};
use tokio::sync::RwLock;

/// The one registered target, shared by every request.
///
/// Registration holds the write lock across the disk write and the in-memory
/// swap, so readers see either the old target or the new one, and memory never
/// disagrees with disk.
pub struct TargetState {
    current: RwLock<Option<Embedding>>,
    store: TargetStore,
}

impl TargetState {
    /// Load the stored target; an unreadable store starts unset.
    pub fn load(store: TargetStore) -> Self {
        let current = store.load();
        Self {
            current: RwLock::new(current),
            store,
        }
    }

    pub async fn current(&self) -> Option<Embedding> {
        self.current.read().await.clone()
    }

    pub async fn is_set(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Persist `embedding` and make it the target, replacing any previous one.
    ///
    /// On a failed write the previous target stays in place.
    pub async fn replace(&self, embedding: Embedding) -> Result<(), StoreError> {
        let mut current = self.current.write().await;

        let store = self.store.clone();
        let to_save = embedding.clone();
        tokio::task::spawn_blocking(move || store.save(&to_save))
            .await
            .map_err(|e| StoreError::Io {
                path: self.store.path().to_path_buf(),
                source: std::io::Error::other(e),
            })??;

        *current = Some(embedding);
        tracing::info!(path = %self.store.path().display(), "target replaced");
        Ok(())
    }
}
