use crate::decision::{MatchPolicy, DEFAULT_THRESHOLD};
use crate::{FaceIndexError, Result, DEFAULT_DIMENSION};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Settings for opening a [`FaceIndex`](crate::FaceIndex).
///
/// ```json
/// { "dimension": 512, "snapshot_path": "data/face_index.fidx", "threshold": 0.55 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    pub dimension: usize,
    /// `None` keeps the index purely in memory.
    pub snapshot_path: Option<PathBuf>,
    pub threshold: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            snapshot_path: Some(PathBuf::from("data/face_index.fidx")),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl IndexConfig {
    pub fn in_memory(dimension: usize) -> Self {
        Self {
            dimension,
            snapshot_path: None,
            ..Self::default()
        }
    }

    pub fn with_snapshot_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let config: IndexConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| FaceIndexError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 || self.dimension > u32::MAX as usize {
            return Err(FaceIndexError::Config(format!(
                "dimension {} is out of range",
                self.dimension
            )));
        }
        MatchPolicy::new(self.threshold)?;
        Ok(())
    }

    pub fn policy(&self) -> Result<MatchPolicy> {
        MatchPolicy::new(self.threshold)
    }
}
