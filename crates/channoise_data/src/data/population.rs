use serde::{Deserialize, Serialize};

/// Index of a spatial node (compartment) carrying its own channel population.
pub type NodeIndex = usize;

/// Aggregated conformational state of a sodium channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelState {
    Closed,
    Open,
}

/// Channel population of one node plus its event clock.
///
/// `next_event` is the absolute time (ms) of the next scheduled transition.
/// `None` means nothing is scheduled, which only happens for an empty
/// population.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeState {
    pub closed: u32,
    pub open: u32,
    pub next_event: Option<f64>,
}

impl NodeState {
    #[must_use]
    pub fn new(closed: u32, open: u32, next_event: Option<f64>) -> Self {
        Self {
            closed,
            open,
            next_event,
        }
    }

    /// Total channel count. Widened so that a corrupted state cannot overflow.
    #[must_use]
    pub fn total(&self) -> u64 {
        u64::from(self.closed) + u64::from(self.open)
    }

    #[must_use]
    pub fn count(&self, state: ChannelState) -> u32 {
        match state {
            ChannelState::Closed => self.closed,
            ChannelState::Open => self.open,
        }
    }

    #[must_use]
    pub fn open_fraction(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => f64::from(self.open) / n as f64,
        }
    }
}
