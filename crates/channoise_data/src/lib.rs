//! Plain data types shared by the channel-noise simulator crates.
//!
//! Nothing in here draws random numbers or evaluates rates; see
//! `channoise_core` for the step engine.

pub mod data;

pub use data::kinetics::{KineticParams, RateCoefficients, Transition};
pub use data::population::{ChannelState, NodeIndex, NodeState};
