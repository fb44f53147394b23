//! Directory chain bookkeeping
//!
//! Remembers which offset each directory number was found at, so a chain
//! whose next-link points back at an already visited directory is caught
//! before the session starts walking in circles.

use std::collections::HashMap;

use log::debug;

/// Directory number to offset map with loop detection
#[derive(Debug, Default, Clone)]
pub struct DirectoryChain {
    by_index: HashMap<u32, u64>,
    by_offset: HashMap<u64, u32>,
}

impl DirectoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records directory `index` at `offset`.
    ///
    /// Returns false if `offset` already belongs to a different directory
    /// number, which means the chain loops.
    pub fn check(&mut self, index: u32, offset: u64) -> bool {
        if offset == 0 {
            return true;
        }
        if let Some(&known) = self.by_offset.get(&offset) {
            return known == index;
        }
        if let Some(previous) = self.by_index.insert(index, offset) {
            // Directory moved, e.g. after a rewrite
            debug!("Directory {} moved from {:#x} to {:#x}", index, previous, offset);
            self.by_offset.remove(&previous);
        }
        self.by_offset.insert(offset, index);
        true
    }

    /// Offset recorded for directory `index`
    pub fn offset_of(&self, index: u32) -> Option<u64> {
        self.by_index.get(&index).copied()
    }

    /// Directory number recorded at `offset`
    pub fn index_at(&self, offset: u64) -> Option<u32> {
        self.by_offset.get(&offset).copied()
    }

    /// Forgets every directory from `index` on
    pub fn truncate(&mut self, index: u32) {
        self.by_index.retain(|&i, _| i < index);
        let by_index = &self.by_index;
        self.by_offset.retain(|_, i| by_index.contains_key(i));
    }

    pub fn clear(&mut self) {
        self.by_index.clear();
        self.by_offset.clear();
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}
