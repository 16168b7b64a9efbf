//! Original-material records for in-place material overrides.

use std::collections::HashMap;

use crate::scene::{MaterialSlot, NodeId};

/// Pre-override materials, keyed by node.
///
/// A node has an entry exactly while its material is overridden. Only the
/// first override is recorded, so stacking overrides can never lose the
/// original.
#[derive(Debug, Default)]
pub struct MaterialSnapshots {
    originals: HashMap<NodeId, MaterialSlot>,
}

impl MaterialSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `original` unless the node is already overridden.
    ///
    /// Returns true when the snapshot was taken.
    pub fn record(&mut self, node: NodeId, original: MaterialSlot) -> bool {
        if self.originals.contains_key(&node) {
            return false;
        }
        self.originals.insert(node, original);
        true
    }

    /// Remove and return the original materials for restoring
    pub fn take(&mut self, node: NodeId) -> Option<MaterialSlot> {
        self.originals.remove(&node)
    }

    pub fn is_overridden(&self, node: NodeId) -> bool {
        self.originals.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// Nodes currently overridden
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.originals.keys().copied()
    }
}
