use crate::mapping::IdentityMapping;
use crate::vector::{IdentityId, IndexEntry};
use crate::{FaceIndexError, Result};
use ndarray::{Array1, ArrayView1};
use std::cmp::Ordering;

/// One scored candidate returned by [`VectorIndex::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: IdentityId,
    pub score: f32,
    pub position: usize,
}

/// Exhaustive (flat) inner-product index.
///
/// Vectors are expected to be L2 normalized by the caller, so the dot product
/// used for scoring equals cosine similarity. `vectors[i]` belongs to
/// `mapping[i]` for every position.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Array1<f32>>,
    mapping: IdentityMapping,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
            mapping: IdentityMapping::new(),
        }
    }

    /// Assemble an index from already-ordered parts, checking every length.
    pub fn from_parts(
        dimension: usize,
        vectors: Vec<Array1<f32>>,
        mapping: IdentityMapping,
    ) -> Result<Self> {
        if vectors.len() != mapping.len() {
            return Err(anyhow::anyhow!(
                "{} vectors but {} identities",
                vectors.len(),
                mapping.len()
            )
            .into());
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(FaceIndexError::InvalidDimension {
                expected: dimension,
                actual: bad.len(),
            });
        }
        Ok(Self {
            dimension,
            vectors,
            mapping,
        })
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        if len != self.dimension {
            return Err(FaceIndexError::InvalidDimension {
                expected: self.dimension,
                actual: len,
            });
        }
        Ok(())
    }

    /// Append `vector` at the next position. Returns that position.
    pub fn add(&mut self, vector: Array1<f32>, id: IdentityId) -> Result<usize> {
        self.check_dimension(vector.len())?;
        let position = self.vectors.len();
        self.vectors.push(vector);
        self.mapping.push(id);
        Ok(position)
    }

    /// Top `k` entries by dot product, best first. Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.check_dimension(query.len())?;
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        let query = ArrayView1::from(query);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, vector.dot(&query)))
            .collect();

        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);

        Ok(scored
            .into_iter()
            .filter_map(|(position, score)| {
                self.mapping.get(position).map(|id| SearchHit {
                    id: id.clone(),
                    score,
                    position,
                })
            })
            .collect())
    }

    /// A fresh index holding every entry not owned by `id`, in original order.
    /// `None` when `id` owns nothing.
    pub fn rebuild_without(&self, id: &IdentityId) -> Option<VectorIndex> {
        if !self.mapping.contains(id) {
            return None;
        }

        let survivors = self.mapping.len() - self.mapping.positions_of(id).len();
        let mut vectors = Vec::with_capacity(survivors);
        let mut mapping = IdentityMapping::with_capacity(survivors);
        for (vector, stored) in self.vectors.iter().zip(self.mapping.iter()) {
            if stored != id {
                vectors.push(vector.clone());
                mapping.push(stored.clone());
            }
        }

        Some(VectorIndex {
            dimension: self.dimension,
            vectors,
            mapping,
        })
    }

    /// Remove every entry owned by `id` through a full rebuild.
    pub fn remove(&mut self, id: &IdentityId) -> bool {
        match self.rebuild_without(id) {
            Some(rebuilt) => {
                *self = rebuilt;
                true
            }
            None => false,
        }
    }

    /// Drop entries at positions `len..`. Used to undo appends.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.vectors.truncate(len);
        self.mapping.truncate(len);
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
        self.mapping.clear();
    }

    pub fn count(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn contains(&self, id: &IdentityId) -> bool {
        self.mapping.contains(id)
    }

    /// Number of vectors enrolled under `id`.
    pub fn entries_for(&self, id: &IdentityId) -> usize {
        self.mapping.iter().filter(|stored| *stored == id).count()
    }

    pub fn mapping(&self) -> &IdentityMapping {
        &self.mapping
    }

    pub fn vectors(&self) -> &[Array1<f32>] {
        &self.vectors
    }

    pub fn entries(&self) -> impl Iterator<Item = IndexEntry<'_>> {
        self.vectors
            .iter()
            .zip(self.mapping.iter())
            .enumerate()
            .map(|(position, (vector, id))| IndexEntry {
                position,
                id,
                vector,
            })
    }
}
