use crate::decision::{MatchOutcome, MatchPolicy, UnknownReason};
use crate::store::{FaceIndex, IndexStats};
use crate::vector::IdentityId;
use crate::{FaceIndexError, Result};
use std::sync::Arc;
use tracing::debug;

/// Produces L2-normalized embeddings from some input, typically a face crop.
///
/// `Ok(None)` means the input held nothing to embed.
pub trait EmbeddingSource {
    type Input: ?Sized;

    fn embed(&self, input: &Self::Input) -> Result<Option<Vec<f32>>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    /// The source could not produce an embedding for the input.
    NoEmbedding,
    Decided(MatchOutcome),
}

impl Recognition {
    pub fn is_recognized(&self) -> bool {
        matches!(self, Recognition::Decided(outcome) if outcome.is_recognized())
    }
}

/// Enrollment and recognition over a shared [`FaceIndex`].
pub struct Recognizer<S> {
    source: S,
    index: Arc<FaceIndex>,
    policy: MatchPolicy,
}

impl<S: EmbeddingSource> Recognizer<S> {
    pub fn new(source: S, index: Arc<FaceIndex>, policy: MatchPolicy) -> Self {
        Self {
            source,
            index,
            policy,
        }
    }

    pub fn index(&self) -> &Arc<FaceIndex> {
        &self.index
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Embed `input` and store it under `id`.
    pub fn enroll(&self, input: &S::Input, id: impl Into<IdentityId>) -> Result<()> {
        let id = id.into();
        let embedding = self
            .source
            .embed(input)?
            .ok_or(FaceIndexError::NoEmbedding)?;
        self.index.add(embedding, id.clone())?;
        debug!(%id, "enrolled");
        Ok(())
    }

    pub fn recognize(&self, input: &S::Input) -> Result<Recognition> {
        if self.index.is_empty() {
            return Ok(Recognition::Decided(MatchOutcome::Unknown {
                reason: UnknownReason::NoCandidates,
            }));
        }
        match self.source.embed(input)? {
            Some(embedding) => self.recognize_embedding(&embedding).map(Recognition::Decided),
            None => Ok(Recognition::NoEmbedding),
        }
    }

    pub fn recognize_embedding(&self, embedding: &[f32]) -> Result<MatchOutcome> {
        let hits = self.index.search(embedding, 1)?;
        let outcome = self.policy.decide(&hits);
        debug!(?outcome, threshold = self.policy.threshold(), "match decided");
        Ok(outcome)
    }

    pub fn forget(&self, id: impl Into<IdentityId>) -> Result<bool> {
        self.index.remove(id)
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}
