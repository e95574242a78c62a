//! Per-node population store.
//!
//! Allocated once for the maximum node count and owned by the simulation
//! context. Each slot is written by `initialize` and afterwards only by
//! `advance` for the same node.

use crate::error::{ChannelError, Result};
use channoise_data::{NodeIndex, NodeState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeStore {
    slots: Vec<Option<NodeState>>,
}

impl NodeStore {
    #[must_use]
    pub fn with_capacity(max_nodes: usize) -> Self {
        Self {
            slots: vec![None; max_nodes],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Checks the index against the store bounds.
    pub fn check_index(&self, node: NodeIndex) -> Result<()> {
        if node < self.slots.len() {
            Ok(())
        } else {
            Err(ChannelError::InvalidNodeIndex {
                node,
                capacity: self.slots.len(),
            })
        }
    }

    /// Mutable access to a slot, initialized or not.
    pub fn slot_mut(&mut self, node: NodeIndex) -> Result<&mut Option<NodeState>> {
        self.check_index(node)?;
        Ok(&mut self.slots[node])
    }

    pub fn get(&self, node: NodeIndex) -> Result<&NodeState> {
        self.check_index(node)?;
        self.slots[node]
            .as_ref()
            .ok_or(ChannelError::NodeNotInitialized(node))
    }

    pub fn get_mut(&mut self, node: NodeIndex) -> Result<&mut NodeState> {
        self.check_index(node)?;
        self.slots[node]
            .as_mut()
            .ok_or(ChannelError::NodeNotInitialized(node))
    }

    pub fn open_count(&self, node: NodeIndex) -> Result<u32> {
        self.get(node).map(|state| state.open)
    }

    pub fn next_event_time(&self, node: NodeIndex) -> Result<Option<f64>> {
        self.get(node).map(|state| state.next_event)
    }

    /// All slots, for drivers that hand disjoint nodes to separate workers.
    pub fn slots_mut(&mut self) -> &mut [Option<NodeState>] {
        &mut self.slots
    }

    /// Initialized nodes with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &NodeState)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(node, slot)| slot.as_ref().map(|state| (node, state)))
    }

    /// Sum of open channels over all initialized nodes.
    #[must_use]
    pub fn total_open(&self) -> u64 {
        self.iter().map(|(_, state)| u64::from(state.open)).sum()
    }
}
