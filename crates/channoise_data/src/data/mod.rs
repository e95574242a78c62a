pub mod kinetics;
pub mod population;
