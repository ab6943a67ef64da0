use crate::model::GameIdentity;
use std::collections::HashSet;

/// Game identities already processed in the current run
///
/// The index only suppresses repeated driver-level work (logging, second
/// persistence call); the store enforces uniqueness on its own through the
/// game URL.
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashSet<GameIdentity>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, identity: &GameIdentity) -> bool {
        self.seen.contains(identity)
    }

    /// Records an identity; returns true if it had not been seen before
    pub fn mark(&mut self, identity: GameIdentity) -> bool {
        self.seen.insert(identity)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
