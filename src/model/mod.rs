pub use channoise_core::{RateLogic, RateProvider, UniformSource};
pub mod config {
    pub use channoise_core::config::*;
}
pub mod engine {
    pub use channoise_core::gillespie::*;
}
pub mod rates {
    pub use channoise_core::rates::*;
}
pub mod store {
    pub use channoise_core::store::*;
}
pub mod state {
    pub use channoise_data::*;
}

pub mod protocol;
pub mod report;
pub mod simulation;

pub use protocol::VoltageProtocol;
pub use report::{RunSummary, StepReport};
pub use simulation::{Simulation, SimulationError, SimulationSnapshot};
