//! Stochastic sodium channel noise for compartmental neuron models.
//!
//! The step engine lives in `channoise_core`; this crate drives it across
//! many nodes, supplies clamp voltages, and reports open counts and
//! conductances per step.

pub mod model;
