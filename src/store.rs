use crate::config::IndexConfig;
use crate::index::{SearchHit, VectorIndex};
use crate::persistence::SnapshotStore;
use crate::vector::IdentityId;
use crate::Result;
use ndarray::Array1;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub total_embeddings: usize,
    pub distinct_identities: usize,
    pub dimension: usize,
    pub snapshot_path: Option<PathBuf>,
}

/// Thread-safe, persistent embedding index.
///
/// One mutex covers the vectors, their identities and the snapshot write, so
/// every operation observes either none or all of another operation's effect.
/// A mutation whose snapshot write fails is rolled back before the error is
/// returned, keeping memory and disk identical.
pub struct FaceIndex {
    inner: Mutex<VectorIndex>,
    snapshots: Option<SnapshotStore>,
}

impl FaceIndex {
    /// Open the index described by `config`, loading its snapshot when one exists.
    pub fn open(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let snapshots = config
            .snapshot_path
            .as_ref()
            .map(|path| SnapshotStore::new(path, config.dimension));

        let index = match &snapshots {
            Some(store) => store.load_or_empty()?,
            None => VectorIndex::new(config.dimension),
        };
        info!(
            dimension = config.dimension,
            entries = index.count(),
            persistent = snapshots.is_some(),
            "face index ready"
        );

        Ok(Self {
            inner: Mutex::new(index),
            snapshots,
        })
    }

    pub fn in_memory(dimension: usize) -> Self {
        Self {
            inner: Mutex::new(VectorIndex::new(dimension)),
            snapshots: None,
        }
    }

    fn persist(&self, index: &VectorIndex) -> Result<()> {
        match &self.snapshots {
            Some(store) => store.save(index),
            None => Ok(()),
        }
    }

    pub fn add(&self, vector: impl Into<Array1<f32>>, id: impl Into<IdentityId>) -> Result<()> {
        let mut index = self.inner.lock();
        let previous = index.count();
        index.add(vector.into(), id.into())?;

        if let Err(e) = self.persist(&index) {
            index.truncate(previous);
            warn!(error = %e, "add rolled back");
            return Err(e);
        }
        Ok(())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.inner.lock().search(query, k)
    }

    /// Remove every embedding enrolled under `id`. `Ok(false)` if there were none.
    pub fn remove(&self, id: impl Into<IdentityId>) -> Result<bool> {
        let id = id.into();
        let mut index = self.inner.lock();
        let Some(rebuilt) = index.rebuild_without(&id) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&rebuilt) {
            warn!(%id, error = %e, "remove rolled back");
            return Err(e);
        }
        let removed = index.count() - rebuilt.count();
        *index = rebuilt;
        info!(%id, removed, remaining = index.count(), "identity removed");
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        let mut index = self.inner.lock();
        let empty = VectorIndex::new(index.dimension());
        if let Err(e) = self.persist(&empty) {
            warn!(error = %e, "clear rolled back");
            return Err(e);
        }
        *index = empty;
        info!("index cleared");
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.inner.lock().count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn contains(&self, id: impl Into<IdentityId>) -> bool {
        self.inner.lock().contains(&id.into())
    }

    pub fn dimension(&self) -> usize {
        self.inner.lock().dimension()
    }

    pub fn stats(&self) -> IndexStats {
        let index = self.inner.lock();
        let distinct: HashSet<&IdentityId> = index.mapping().iter().collect();
        IndexStats {
            total_embeddings: index.count(),
            distinct_identities: distinct.len(),
            dimension: index.dimension(),
            snapshot_path: self.snapshots.as_ref().map(|s| s.path().to_path_buf()),
        }
    }

    /// Copy of the current contents, taken under the lock.
    pub fn snapshot(&self) -> VectorIndex {
        self.inner.lock().clone()
    }
}
