use crate::vector::IdentityId;

/// Position-ordered identity list kept parallel to the stored vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityMapping {
    ids: Vec<IdentityId>,
}

impl IdentityMapping {
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, id: IdentityId) {
        self.ids.push(id);
    }

    pub fn get(&self, position: usize) -> Option<&IdentityId> {
        self.ids.get(position)
    }

    /// Positions holding `id`, ascending.
    pub fn positions_of(&self, id: &IdentityId) -> Vec<usize> {
        self.ids
            .iter()
            .enumerate()
            .filter(|(_, stored)| *stored == id)
            .map(|(position, _)| position)
            .collect()
    }

    pub fn contains(&self, id: &IdentityId) -> bool {
        self.ids.iter().any(|stored| stored == id)
    }

    pub fn truncate(&mut self, len: usize) {
        self.ids.truncate(len);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdentityId> {
        self.ids.iter()
    }
}

impl From<Vec<IdentityId>> for IdentityMapping {
    fn from(ids: Vec<IdentityId>) -> Self {
        Self { ids }
    }
}
