pub mod calibration;
pub mod config;
pub mod decision;
pub mod index;
pub mod mapping;
pub mod persistence;
pub mod recognizer;
pub mod store;
pub mod utils;
pub mod vector;

use std::path::PathBuf;
use thiserror::Error;

/// Embedding width produced by the ArcFace family of models.
pub const DEFAULT_DIMENSION: usize = 512;

#[derive(Error, Debug)]
pub enum FaceIndexError {
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
    #[error("Corrupt snapshot at {path:?}: {reason}")]
    CorruptSnapshot { path: PathBuf, reason: String },
    #[error("Failed to persist snapshot to {path:?}: {source}")]
    PersistenceWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f32),
    #[error("No embedding could be produced for the input")]
    NoEmbedding,
    #[error("Config Error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FaceIndexError>;

// Re-export main types for convenience
pub use calibration::{collect_scores, sweep_thresholds, ScoreSets, ThresholdReport};
pub use config::IndexConfig;
pub use decision::{MatchOutcome, MatchPolicy, UnknownReason};
pub use index::{SearchHit, VectorIndex};
pub use mapping::IdentityMapping;
pub use persistence::SnapshotStore;
pub use recognizer::{EmbeddingSource, Recognition, Recognizer};
pub use store::{FaceIndex, IndexStats};
pub use utils::{dot_product, l2_norm, normalize_vector};
pub use vector::{IdentityId, IndexEntry};
