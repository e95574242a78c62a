pub mod macros;

use channoise_core::config::KineticsPreset;
use channoise_core::AppConfig;
use channoise_lib::model::Simulation;

#[allow(dead_code)]
pub struct SimulationBuilder {
    config: AppConfig,
}

#[allow(dead_code)]
impl SimulationBuilder {
    /// One node, 100 channels, constant rates alpha_m=3 beta_m=1 alpha_h=2 beta_h=1.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.simulation.nodes = 1;
        config.simulation.channels_per_node = 100;
        config.simulation.step_size_ms = 0.1;
        config.simulation.seed = Some(42);
        config.simulation.deterministic = true;
        config.kinetics.preset = KineticsPreset::Constant;
        config.kinetics.constant_rates = [3.0, 1.0, 2.0, 1.0];
        Self { config }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.simulation.seed = Some(seed);
        self
    }

    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.config.simulation.nodes = nodes;
        self
    }

    pub fn with_channels(mut self, channels: u32) -> Self {
        self.config.simulation.channels_per_node = channels;
        self
    }

    pub fn with_rates(mut self, rates: [f64; 4]) -> Self {
        self.config.kinetics.preset = KineticsPreset::Constant;
        self.config.kinetics.constant_rates = rates;
        self
    }

    pub fn with_hodgkin_huxley(mut self) -> Self {
        self.config.kinetics.preset = KineticsPreset::HodgkinHuxley;
        self
    }

    pub fn with_step_size(mut self, step_size_ms: f64) -> Self {
        self.config.simulation.step_size_ms = step_size_ms;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.simulation.parallel = parallel;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn config(&self) -> AppConfig {
        self.config.clone()
    }

    pub fn build(self) -> Simulation {
        Simulation::new(self.config).expect("Failed to build simulation")
    }
}
