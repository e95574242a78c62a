//! # Channoise Core
//!
//! Exact stochastic simulation of a sodium channel population per membrane
//! node, for injecting channel noise into a compartmental simulator.
//!
//! - Voltage-dependent rate constants behind a [`RateProvider`] seam
//! - Uniform variates behind a [`UniformSource`] seam (any `rand::Rng`)
//! - A per-node [`NodeStore`] owned by the caller
//! - The [`GillespieEngine`] that seeds each node at equilibrium and fires
//!   every transition event inside an outer sampling window
//!
//! ## Example
//!
//! ```
//! use channoise_core::{GillespieEngine, NodeStore, StepWindow};
//! use channoise_data::KineticParams;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let engine: GillespieEngine = GillespieEngine::default();
//! let params = KineticParams::hodgkin_huxley();
//! let mut store = NodeStore::with_capacity(1);
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//!
//! engine.initialize(&mut store, 0, 1000, -65.0, &params, &mut rng).unwrap();
//! for step in 0..100 {
//!     let window = StepWindow::new(0.01, step).unwrap();
//!     let open = engine
//!         .advance(&mut store, 0, 1000, -20.0, window, &params, &mut rng)
//!         .unwrap();
//!     assert!(open <= 1000);
//! }
//! ```

/// Configuration management for run parameters
pub mod config;
/// Observational per-step dumps
pub mod diagnostics;
/// Error taxonomy of the step engine
pub mod error;
/// Event-driven step engine
pub mod gillespie;
/// Run metrics and logging setup
pub mod metrics;
/// Uniform random sources
pub mod random;
/// Rate providers and rate aggregation
pub mod rates;
/// Per-node population store
pub mod store;

pub use config::{AppConfig, DegeneratePolicy};
pub use diagnostics::{DiagnosticSink, NullSink, TracingSink, WriterSink};
pub use error::{ChannelError, Result};
pub use gillespie::{GillespieEngine, Outcome, StepOutcome, StepWindow};
pub use metrics::{init_logging, Metrics};
pub use random::{node_stream, RecordingSource, ReplaySource, UniformSource};
pub use rates::{ElementaryRates, GeneralizedRates, RateLogic, RateProvider};
pub use store::NodeStore;
