//! Configuration management for channel-noise runs.
//!
//! Strongly-typed structures mapping to `config.toml`.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `config.toml` file (overrides defaults)
//! 3. Command-line flags (applied by the binary)
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [simulation]
//! nodes = 20
//! channels_per_node = 1000
//! step_size_ms = 0.01
//! steps = 2000
//! seed = 42
//! deterministic = true
//! parallel = false
//! on_degenerate = "abort"
//! log_interval = 500
//!
//! [kinetics]
//! preset = "hodgkin_huxley"
//! constant_rates = [3.0, 1.0, 2.0, 1.0]
//! q10 = 3.0
//! temperature_c = 6.3
//!
//! [protocol]
//! holding_mv = -65.0
//! step_mv = -20.0
//! step_onset_ms = 5.0
//! step_offset_ms = 15.0
//!
//! [channel]
//! single_channel_conductance_ps = 20.0
//! ```

use channoise_data::{KineticParams, RateCoefficients};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the enclosing loop does when a node reports degenerate rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Stop the whole run.
    #[default]
    Abort,
    /// Freeze the node at its last population and keep going.
    Skip,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    pub nodes: usize,
    pub channels_per_node: u32,
    pub step_size_ms: f64,
    pub steps: u64,
    pub seed: Option<u64>,
    pub deterministic: bool,
    pub parallel: bool,
    pub on_degenerate: DegeneratePolicy,
    /// Steps between summary log lines.
    pub log_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nodes: 20,
            channels_per_node: 1000,
            step_size_ms: 0.01,
            steps: 2000,
            seed: None,
            deterministic: false,
            parallel: false,
            on_degenerate: DegeneratePolicy::Abort,
            log_interval: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KineticsPreset {
    #[default]
    HodgkinHuxley,
    Constant,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct KineticsConfig {
    pub preset: KineticsPreset,
    /// alpha_m, beta_m, alpha_h, beta_h (1/ms) for the constant preset.
    pub constant_rates: [f64; 4],
    pub q10: f64,
    pub temperature_c: f64,
}

impl Default for KineticsConfig {
    fn default() -> Self {
        Self {
            preset: KineticsPreset::HodgkinHuxley,
            constant_rates: [3.0, 1.0, 2.0, 1.0],
            q10: 3.0,
            temperature_c: 6.3,
        }
    }
}

/// Two-level voltage clamp.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ProtocolConfig {
    pub holding_mv: f64,
    pub step_mv: f64,
    pub step_onset_ms: f64,
    pub step_offset_ms: f64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            holding_mv: -65.0,
            step_mv: -20.0,
            step_onset_ms: 5.0,
            step_offset_ms: 15.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ChannelConfig {
    pub single_channel_conductance_ps: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            single_channel_conductance_ps: 20.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub kinetics: KineticsConfig,
    pub protocol: ProtocolConfig,
    pub channel: ChannelConfig,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.simulation.nodes > 0, "Node count must be positive");
        anyhow::ensure!(
            self.simulation.nodes <= 100_000,
            "Node count too large (max 100000)"
        );
        anyhow::ensure!(
            self.simulation.step_size_ms.is_finite() && self.simulation.step_size_ms > 0.0,
            "Step size must be positive"
        );
        anyhow::ensure!(
            self.simulation.log_interval > 0,
            "Log interval must be positive"
        );

        anyhow::ensure!(
            self.kinetics
                .constant_rates
                .iter()
                .all(|rate| rate.is_finite() && *rate >= 0.0),
            "Constant rates must be finite and non-negative"
        );
        anyhow::ensure!(
            self.kinetics.q10.is_finite() && self.kinetics.q10 > 0.0,
            "Q10 must be positive"
        );
        anyhow::ensure!(
            self.kinetics.temperature_c.is_finite(),
            "Temperature must be finite"
        );

        anyhow::ensure!(
            self.protocol.holding_mv.is_finite() && self.protocol.step_mv.is_finite(),
            "Clamp voltages must be finite"
        );
        anyhow::ensure!(
            self.protocol.step_offset_ms >= self.protocol.step_onset_ms,
            "Step offset must not precede step onset"
        );

        anyhow::ensure!(
            self.channel.single_channel_conductance_ps >= 0.0,
            "Single-channel conductance must be non-negative"
        );
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                Self::from_toml(&content).map_err(|e| e.context(format!("parsing {}", path.display())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::Error::new(e).context(format!("reading {}", path.display()))),
        }
    }

    /// Kinetic parameters selected by the `[kinetics]` table.
    #[must_use]
    pub fn kinetic_params(&self) -> KineticParams {
        match self.kinetics.preset {
            KineticsPreset::HodgkinHuxley => KineticParams {
                q10: self.kinetics.q10,
                temperature_c: self.kinetics.temperature_c,
                ..KineticParams::hodgkin_huxley()
            },
            KineticsPreset::Constant => {
                let [alpha_m, beta_m, alpha_h, beta_h] = self.kinetics.constant_rates;
                KineticParams {
                    alpha_m: RateCoefficients::constant(alpha_m),
                    beta_m: RateCoefficients::constant(beta_m),
                    alpha_h: RateCoefficients::constant(alpha_h),
                    beta_h: RateCoefficients::constant(beta_h),
                    ..KineticParams::constant(0.0, 0.0, 0.0, 0.0)
                }
            }
        }
    }

    /// Short hash of the settings that change simulation output.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.simulation).as_bytes());
        hasher.update(format!("{:?}", self.kinetics).as_bytes());
        hasher.update(format!("{:?}", self.protocol).as_bytes());
        hasher.update(format!("{:?}", self.channel).as_bytes());
        hex::encode(&hasher.finalize()[..8])
    }
}
