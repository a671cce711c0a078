use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity key supplied by the caller. The index never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityId {
    Int(i64),
    Str(String),
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityId::Int(id) => write!(f, "{}", id),
            IdentityId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for IdentityId {
    fn from(id: i64) -> Self {
        IdentityId::Int(id)
    }
}

impl From<i32> for IdentityId {
    fn from(id: i32) -> Self {
        IdentityId::Int(id as i64)
    }
}

impl From<u32> for IdentityId {
    fn from(id: u32) -> Self {
        IdentityId::Int(id as i64)
    }
}

impl From<String> for IdentityId {
    fn from(id: String) -> Self {
        IdentityId::Str(id)
    }
}

impl From<&str> for IdentityId {
    fn from(id: &str) -> Self {
        IdentityId::Str(id.to_string())
    }
}

/// Borrowed view of one stored vector and the identity it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry<'a> {
    pub position: usize,
    pub id: &'a IdentityId,
    pub vector: &'a Array1<f32>,
}

impl IndexEntry<'_> {
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}
