//! Grid occupancy-depletion simulation.
//!
//! Agents are seated on distinct cells of a rectangular grid. Every iteration
//! each agent, in freshly shuffled order, removes one vacant cell from the
//! pool until an iteration removes nothing or the iteration cap is hit.

pub mod agent;
pub mod config;
pub mod grid;
pub mod simulation;

pub use config::{SimConfig, SimConfigError};
pub use simulation::{SimPhase, Simulation, SimulationError, SimulationReport, StopReason};
