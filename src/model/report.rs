use serde::{Deserialize, Serialize};

/// Per-step output of the simulation across all nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: u64,
    /// Start of the sampling window (ms).
    pub time_ms: f64,
    pub v_m: Vec<f64>,
    pub open: Vec<u32>,
    /// Sodium conductance per node (nS).
    pub conductance_ns: Vec<f64>,
    pub events: u64,
}

impl StepReport {
    #[must_use]
    pub fn total_open(&self) -> u64 {
        self.open.iter().map(|&n| u64::from(n)).sum()
    }
}

/// End-of-run summary printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub fingerprint: String,
    pub seed: u64,
    pub steps: u64,
    pub events: u64,
    pub degenerate_nodes: u64,
    pub mean_open_fraction: f64,
    pub elapsed_ms: u64,
}

/// Open count to conductance: `open * gamma` with gamma in pS, result in nS.
#[must_use]
pub fn conductance_ns(open: u32, single_channel_ps: f64) -> f64 {
    f64::from(open) * single_channel_ps * 1e-3
}
