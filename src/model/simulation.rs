//! Multi-node driver around the channel step engine.
//!
//! Owns the node store and one ChaCha8 stream per node. Nodes never share
//! mutable state, so a step can be fanned out across rayon workers while
//! each node still sees its windows in strictly increasing order.

use crate::model::protocol::VoltageProtocol;
use crate::model::report::{conductance_ns, RunSummary, StepReport};
use channoise_core::{
    node_stream, AppConfig, ChannelError, DegeneratePolicy, DiagnosticSink, GillespieEngine,
    Metrics, NodeStore, NullSink, StepOutcome, StepWindow,
};
use channoise_data::{KineticParams, NodeIndex, NodeState};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Expected {expected} voltages, got {got}")]
    VoltageCount { expected: usize, got: usize },

    #[error("Node {node} failed at step {step}: {source}")]
    Node {
        node: NodeIndex,
        step: u64,
        #[source]
        source: ChannelError,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Report sink error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] anyhow::Error),
}

/// Everything needed to resume a run bit-for-bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub fingerprint: String,
    pub seed: u64,
    pub step_index: u64,
    pub store: NodeStore,
    pub rngs: Vec<ChaCha8Rng>,
    pub frozen: Vec<bool>,
}

pub struct Simulation {
    pub config: AppConfig,
    pub params: KineticParams,
    pub engine: GillespieEngine,
    pub store: NodeStore,
    pub step_index: u64,
    pub metrics: Metrics,
    seed: u64,
    rngs: Vec<ChaCha8Rng>,
    frozen: Vec<bool>,
    diagnostics: Option<Box<dyn DiagnosticSink + Send>>,
}

impl Simulation {
    pub fn new(config: AppConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let seed = match config.simulation.seed {
            Some(seed) => seed,
            None if config.simulation.deterministic => 0,
            None => rand::thread_rng().gen(),
        };
        let nodes = config.simulation.nodes;
        Ok(Self {
            params: config.kinetic_params(),
            engine: GillespieEngine::default(),
            store: NodeStore::with_capacity(nodes),
            step_index: 0,
            metrics: Metrics::new(config.simulation.log_interval),
            seed,
            rngs: (0..nodes).map(|node| node_stream(seed, node)).collect(),
            frozen: vec![false; nodes],
            diagnostics: None,
            config,
        })
    }

    /// Resumes from a snapshot taken with the same node layout.
    pub fn from_snapshot(
        config: AppConfig,
        snapshot: SimulationSnapshot,
    ) -> Result<Self, SimulationError> {
        let nodes = config.simulation.nodes;
        if snapshot.store.len() != nodes
            || snapshot.rngs.len() != nodes
            || snapshot.frozen.len() != nodes
        {
            return Err(anyhow::anyhow!(
                "Snapshot holds {} nodes, configuration expects {nodes}",
                snapshot.store.len()
            )
            .into());
        }
        if snapshot.fingerprint != config.fingerprint() {
            tracing::warn!(
                snapshot = %snapshot.fingerprint,
                config = %config.fingerprint(),
                "Resuming with a different configuration"
            );
        }
        let mut sim = Self::new(config)?;
        sim.seed = snapshot.seed;
        sim.step_index = snapshot.step_index;
        sim.store = snapshot.store;
        sim.rngs = snapshot.rngs;
        sim.frozen = snapshot.frozen;
        Ok(sim)
    }

    /// Routes per-event and per-step dumps to `sink`. Steps then run
    /// sequentially.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Box<dyn DiagnosticSink + Send>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    /// Start of the next sampling window (ms).
    #[must_use]
    pub fn time_ms(&self) -> f64 {
        self.config.simulation.step_size_ms * self.step_index as f64
    }

    #[must_use]
    pub fn is_frozen(&self, node: NodeIndex) -> bool {
        self.frozen.get(node).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.store.iter().next().is_some() || self.frozen.iter().any(|&f| f)
    }

    /// Open count per node; uninitialized nodes report zero.
    #[must_use]
    pub fn open_counts(&self) -> Vec<u32> {
        (0..self.node_count())
            .map(|node| self.store.open_count(node).unwrap_or(0))
            .collect()
    }

    /// Seeds every node at equilibrium for its starting voltage and resets
    /// the step counter.
    pub fn initialize(&mut self, voltages: &[f64]) -> Result<(), SimulationError> {
        self.check_voltages(voltages)?;
        let n_na = self.config.simulation.channels_per_node;
        for (node, &v_m) in voltages.iter().enumerate() {
            let seeded = self.engine.initialize(
                &mut self.store,
                node,
                n_na,
                v_m,
                &self.params,
                &mut self.rngs[node],
            );
            match seeded {
                Ok(()) => self.frozen[node] = false,
                Err(e) => self.handle_failure(node, e)?,
            }
        }
        self.step_index = 0;
        tracing::info!(
            nodes = self.node_count(),
            channels_per_node = n_na,
            total_open = self.store.total_open(),
            seed = self.seed,
            "Channel populations seeded"
        );
        Ok(())
    }

    /// Advances every node across the current window and moves to the next.
    pub fn step(&mut self, voltages: &[f64]) -> Result<StepReport, SimulationError> {
        self.check_voltages(voltages)?;
        let started = Instant::now();
        let window = StepWindow::new(self.config.simulation.step_size_ms, self.step_index)
            .map_err(anyhow::Error::from)?;
        let n_na = self.config.simulation.channels_per_node;
        let engine = &self.engine;
        let params = &self.params;
        let frozen = &self.frozen;

        let outcomes: Vec<Result<StepOutcome, ChannelError>> =
            if let Some(sink) = self.diagnostics.as_mut() {
                self.store
                    .slots_mut()
                    .iter_mut()
                    .zip(self.rngs.iter_mut())
                    .zip(voltages)
                    .enumerate()
                    .map(|(node, ((slot, rng), &v_m))| {
                        let input = NodeInput {
                            node,
                            frozen: frozen[node],
                            n_na,
                            v_m,
                            window,
                        };
                        advance_node(engine, params, input, slot, rng, &mut **sink)
                    })
                    .collect()
            } else if self.config.simulation.parallel {
                self.store
                    .slots_mut()
                    .par_iter_mut()
                    .zip(self.rngs.par_iter_mut())
                    .zip(voltages.par_iter())
                    .enumerate()
                    .map(|(node, ((slot, rng), &v_m))| {
                        let input = NodeInput {
                            node,
                            frozen: frozen[node],
                            n_na,
                            v_m,
                            window,
                        };
                        advance_node(engine, params, input, slot, rng, &mut NullSink)
                    })
                    .collect()
            } else {
                self.store
                    .slots_mut()
                    .iter_mut()
                    .zip(self.rngs.iter_mut())
                    .zip(voltages)
                    .enumerate()
                    .map(|(node, ((slot, rng), &v_m))| {
                        let input = NodeInput {
                            node,
                            frozen: frozen[node],
                            n_na,
                            v_m,
                            window,
                        };
                        advance_node(engine, params, input, slot, rng, &mut NullSink)
                    })
                    .collect()
            };

        let mut events = 0u64;
        let mut open = Vec::with_capacity(outcomes.len());
        for (node, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(outcome) => {
                    events += u64::from(outcome.events);
                    open.push(outcome.open);
                }
                Err(e) => {
                    self.handle_failure(node, e)?;
                    open.push(self.store.open_count(node).unwrap_or(0));
                }
            }
        }

        let gamma = self.config.channel.single_channel_conductance_ps;
        let report = StepReport {
            step: self.step_index,
            time_ms: window.start(),
            v_m: voltages.to_vec(),
            conductance_ns: open.iter().map(|&n| conductance_ns(n, gamma)).collect(),
            open,
            events,
        };
        self.step_index += 1;
        self.metrics
            .record_step(started.elapsed(), events, report.total_open());
        Ok(report)
    }

    /// Drives `steps` windows with voltages from `protocol`, seeding the
    /// nodes first if needed. `on_report` sees every step.
    pub fn run<F>(
        &mut self,
        protocol: &VoltageProtocol,
        steps: u64,
        mut on_report: F,
    ) -> Result<RunSummary, SimulationError>
    where
        F: FnMut(&StepReport) -> std::io::Result<()>,
    {
        let mut voltages = vec![0.0; self.node_count()];
        if !self.is_initialized() {
            protocol.fill(self.time_ms(), &mut voltages);
            self.initialize(&voltages)?;
        }

        let capacity = self.node_count() as f64 * f64::from(self.config.simulation.channels_per_node);
        let mut fraction_sum = 0.0;
        for _ in 0..steps {
            protocol.fill(self.time_ms(), &mut voltages);
            let report = self.step(&voltages)?;
            if capacity > 0.0 {
                fraction_sum += report.total_open() as f64 / capacity;
            }
            on_report(&report)?;
        }
        self.finish_diagnostics()?;

        Ok(RunSummary {
            fingerprint: self.config.fingerprint(),
            seed: self.seed,
            steps,
            events: self.metrics.event_count(),
            degenerate_nodes: self.metrics.degenerate_nodes(),
            mean_open_fraction: if steps > 0 {
                fraction_sum / steps as f64
            } else {
                0.0
            },
            elapsed_ms: self.metrics.elapsed().as_millis() as u64,
        })
    }

    /// Flushes the diagnostic sink, surfacing any write it failed.
    pub fn finish_diagnostics(&mut self) -> Result<(), SimulationError> {
        if let Some(sink) = self.diagnostics.as_mut() {
            sink.finish()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            fingerprint: self.config.fingerprint(),
            seed: self.seed,
            step_index: self.step_index,
            store: self.store.clone(),
            rngs: self.rngs.clone(),
            frozen: self.frozen.clone(),
        }
    }

    pub fn snapshot_json(&self) -> Result<String, SimulationError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    fn check_voltages(&self, voltages: &[f64]) -> Result<(), SimulationError> {
        if voltages.len() == self.node_count() {
            Ok(())
        } else {
            Err(SimulationError::VoltageCount {
                expected: self.node_count(),
                got: voltages.len(),
            })
        }
    }

    fn handle_failure(&mut self, node: NodeIndex, error: ChannelError) -> Result<(), SimulationError> {
        if let ChannelError::DegenerateRate { lambda, .. } = error {
            if self.config.simulation.on_degenerate == DegeneratePolicy::Skip {
                self.frozen[node] = true;
                self.metrics.record_degenerate(node, lambda);
                return Ok(());
            }
        }
        Err(SimulationError::Node {
            node,
            step: self.step_index,
            source: error,
        })
    }
}

/// Per-node inputs for one window.
#[derive(Debug, Clone, Copy)]
struct NodeInput {
    node: NodeIndex,
    frozen: bool,
    n_na: u32,
    v_m: f64,
    window: StepWindow,
}

fn advance_node<S: DiagnosticSink + ?Sized>(
    engine: &GillespieEngine,
    params: &KineticParams,
    input: NodeInput,
    slot: &mut Option<NodeState>,
    rng: &mut ChaCha8Rng,
    sink: &mut S,
) -> Result<StepOutcome, ChannelError> {
    if input.frozen {
        return Ok(StepOutcome {
            open: slot.map_or(0, |state| state.open),
            events: 0,
        });
    }
    let state = slot
        .as_mut()
        .ok_or(ChannelError::NodeNotInitialized(input.node))?;
    engine.advance_state(
        input.node,
        state,
        input.n_na,
        input.v_m,
        input.window,
        params,
        rng,
        sink,
    )
}
