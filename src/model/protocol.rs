//! Voltage supplied to each node per step.
//!
//! Stands in for the compartmental voltage integrator: a two-level clamp
//! applied uniformly to every node.

use channoise_core::config::ProtocolConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageProtocol {
    pub holding_mv: f64,
    pub step_mv: f64,
    pub onset_ms: f64,
    pub offset_ms: f64,
}

impl VoltageProtocol {
    /// Constant voltage for the whole run.
    #[must_use]
    pub fn hold(v_m: f64) -> Self {
        Self {
            holding_mv: v_m,
            step_mv: v_m,
            onset_ms: 0.0,
            offset_ms: 0.0,
        }
    }

    /// Membrane voltage at time `t_ms`; the step level applies on
    /// `[onset, offset)`.
    #[must_use]
    pub fn voltage_at(&self, t_ms: f64) -> f64 {
        if self.onset_ms <= t_ms && t_ms < self.offset_ms {
            self.step_mv
        } else {
            self.holding_mv
        }
    }

    /// Writes the voltage at `t_ms` for every node.
    pub fn fill(&self, t_ms: f64, voltages: &mut [f64]) {
        voltages.fill(self.voltage_at(t_ms));
    }
}

impl From<&ProtocolConfig> for VoltageProtocol {
    fn from(config: &ProtocolConfig) -> Self {
        Self {
            holding_mv: config.holding_mv,
            step_mv: config.step_mv,
            onset_ms: config.step_onset_ms,
            offset_ms: config.step_offset_ms,
        }
    }
}
