use crate::index::SearchHit;
use crate::vector::IdentityId;
use crate::{FaceIndexError, Result};
use serde::{Deserialize, Serialize};

/// Cosine similarity at which ArcFace embeddings are accepted as a match.
pub const DEFAULT_THRESHOLD: f32 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnknownReason {
    /// The index was empty or the search produced nothing.
    NoCandidates,
    BelowThreshold { best_score: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum MatchOutcome {
    Recognized { id: IdentityId, score: f32 },
    Unknown { reason: UnknownReason },
}

impl MatchOutcome {
    pub fn is_recognized(&self) -> bool {
        matches!(self, MatchOutcome::Recognized { .. })
    }

    pub fn id(&self) -> Option<&IdentityId> {
        match self {
            MatchOutcome::Recognized { id, .. } => Some(id),
            MatchOutcome::Unknown { .. } => None,
        }
    }

    /// Best score seen, whether or not it cleared the threshold.
    pub fn score(&self) -> Option<f32> {
        match self {
            MatchOutcome::Recognized { score, .. } => Some(*score),
            MatchOutcome::Unknown {
                reason: UnknownReason::BelowThreshold { best_score },
            } => Some(*best_score),
            MatchOutcome::Unknown {
                reason: UnknownReason::NoCandidates,
            } => None,
        }
    }
}

/// Accept/reject policy applied to the top search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    threshold: f32,
}

impl MatchPolicy {
    pub fn new(threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(FaceIndexError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Decide on the best of `hits`, which must be ordered best first.
    pub fn decide(&self, hits: &[SearchHit]) -> MatchOutcome {
        match hits.first() {
            Some(best) => self.decide_top(&best.id, best.score),
            None => MatchOutcome::Unknown {
                reason: UnknownReason::NoCandidates,
            },
        }
    }

    pub fn decide_top(&self, id: &IdentityId, score: f32) -> MatchOutcome {
        if score >= self.threshold {
            MatchOutcome::Recognized {
                id: id.clone(),
                score,
            }
        } else {
            MatchOutcome::Unknown {
                reason: UnknownReason::BelowThreshold { best_score: score },
            }
        }
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f32) -> SearchHit {
        SearchHit {
            id: id.into(),
            score,
            position: 0,
        }
    }

    #[test]
    fn test_threshold_boundaries() {
        let policy = MatchPolicy::new(0.55).unwrap();

        assert_eq!(
            policy.decide(&[hit("alice", 0.80)]),
            MatchOutcome::Recognized {
                id: "alice".into(),
                score: 0.80
            }
        );
        assert!(policy.decide(&[hit("alice", 0.55)]).is_recognized());
        assert_eq!(
            policy.decide(&[hit("alice", 0.42)]),
            MatchOutcome::Unknown {
                reason: UnknownReason::BelowThreshold { best_score: 0.42 }
            }
        );
    }

    #[test]
    fn test_no_candidates_is_distinct() {
        let outcome = MatchPolicy::default().decide(&[]);
        assert_eq!(
            outcome,
            MatchOutcome::Unknown {
                reason: UnknownReason::NoCandidates
            }
        );
        assert_eq!(outcome.score(), None);
        assert!(outcome.id().is_none());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        assert!(MatchPolicy::new(1.5).is_err());
        assert!(MatchPolicy::new(-0.1).is_err());
        assert!(MatchPolicy::new(f32::NAN).is_err());
        assert!(MatchPolicy::new(0.0).is_ok());
        assert!(MatchPolicy::new(1.0).is_ok());
    }
}
