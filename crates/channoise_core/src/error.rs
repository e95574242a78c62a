//! Error types for the stochastic channel engine.
//!
//! All failures are local and synchronous: they are returned to the caller
//! driving the per-step loop and never recovered inside the engine.

use channoise_data::{NodeIndex, Transition};
use thiserror::Error;

/// Main error type for channoise_core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// Total outflow rate is zero (or produced a non-finite holding time).
    #[error("Degenerate rates at node {node}: total outflow rate {lambda}")]
    DegenerateRate { node: NodeIndex, lambda: f64 },

    /// Node index outside the store.
    #[error("Invalid node index {node} (store holds {capacity} nodes)")]
    InvalidNodeIndex { node: NodeIndex, capacity: usize },

    /// `advance` called before `initialize`.
    #[error("Node {0} has not been initialized")]
    NodeNotInitialized(NodeIndex),

    /// Population counts no longer sum to the channel count, or went negative.
    #[error("Population invariant violated at node {node}: {detail}")]
    PopulationInvariantViolation { node: NodeIndex, detail: String },

    /// Rate provider returned a negative or non-finite value.
    #[error("Rate {transition} = {value} at V_m = {v_m} mV is not a finite non-negative number")]
    InvalidRate {
        transition: Transition,
        v_m: f64,
        value: f64,
    },

    /// Step size not strictly positive and finite.
    #[error("Invalid step size {0}")]
    InvalidStep(f64),

    /// A replayed random stream ran out of draws.
    #[error("Random stream exhausted after {0} draws")]
    RandomStreamExhausted(usize),
}

/// Result type alias for channoise_core operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

impl ChannelError {
    /// Creates a new population invariant violation.
    #[must_use]
    pub fn invariant<S: Into<String>>(node: NodeIndex, detail: S) -> Self {
        Self::PopulationInvariantViolation {
            node,
            detail: detail.into(),
        }
    }

    /// Whether the error is a rate degeneracy the enclosing simulator may
    /// choose to skip instead of aborting.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateRate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChannelError::InvalidNodeIndex {
            node: 12,
            capacity: 4,
        };
        assert_eq!(
            err.to_string(),
            "Invalid node index 12 (store holds 4 nodes)"
        );
    }

    #[test]
    fn test_invariant_helper() {
        let err = ChannelError::invariant(3, "open count underflow");
        assert!(err.to_string().contains("node 3"));
        assert!(err.to_string().contains("open count underflow"));
        assert!(!err.is_degenerate());
    }

    #[test]
    fn test_degenerate_classification() {
        let err = ChannelError::DegenerateRate {
            node: 0,
            lambda: 0.0,
        };
        assert!(err.is_degenerate());
    }
}
