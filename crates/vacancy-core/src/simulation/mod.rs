pub mod lifecycle;
pub mod metrics;
#[cfg(test)]
mod tests;

pub use metrics::*;

use crate::agent::Agent;
use crate::config::{SimConfig, SimConfigError};
use crate::grid::{Cell, GridState};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Where a simulation is in its life. Phases only move forward, one at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    Uninitialized,
    Seeded,
    Running,
    Terminated,
    Reported,
}

impl fmt::Display for SimPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimPhase::Uninitialized => "uninitialized",
            SimPhase::Seeded => "seeded",
            SimPhase::Running => "running",
            SimPhase::Terminated => "terminated",
            SimPhase::Reported => "reported",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    Config(SimConfigError),
    UnseatedAgent { agent_id: u32 },
    SharedCell { cell: Cell },
    /// The agent names a home the grid does not record as theirs.
    SeatNotRecorded { agent_id: u32, cell: Cell },
    OccupancyMismatch { expected: usize, actual: usize },
    InvalidPhase { expected: SimPhase, actual: SimPhase },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "{}", e),
            SimulationError::UnseatedAgent { agent_id } => {
                write!(f, "agent {agent_id} has no home after seeding")
            }
            SimulationError::SharedCell { cell } => write!(
                f,
                "cell ({}, {}) is assigned to more than one agent",
                cell.row, cell.col
            ),
            SimulationError::SeatNotRecorded { agent_id, cell } => write!(
                f,
                "agent {agent_id} is seated at ({}, {}) but the grid does not record it there",
                cell.row, cell.col
            ),
            SimulationError::OccupancyMismatch { expected, actual } => write!(
                f,
                "occupied cell count ({actual}) does not match number of agents ({expected})"
            ),
            SimulationError::InvalidPhase { expected, actual } => {
                write!(f, "simulation is {actual}, expected {expected}")
            }
        }
    }
}

impl From<SimConfigError> for SimulationError {
    fn from(err: SimConfigError) -> Self {
        SimulationError::Config(err)
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            _ => None,
        }
    }
}

const _: () = assert!(SimConfig::MAX_TOTAL_CELLS <= u32::MAX as usize);

pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) grid: GridState,
    pub(crate) agents: Vec<Agent>,
    /// Indices into `agents`, reshuffled before every iteration.
    pub(crate) turn_order: Vec<usize>,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) phase: SimPhase,
    pub(crate) initial_vacancies: usize,
    pub(crate) records: Vec<IterationRecord>,
    pub(crate) stop_reason: Option<StopReason>,
}

impl Simulation {
    /// Build and seed a simulation. Panics on an invalid config.
    pub fn new(config: SimConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Build and seed a simulation driven by `ChaCha12Rng::seed_from_u64(config.seed)`.
    pub fn try_new(config: SimConfig) -> Result<Self, SimulationError> {
        let rng = ChaCha12Rng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }

    /// Build and seed a simulation with an explicit random source.
    pub fn with_rng(config: SimConfig, rng: ChaCha12Rng) -> Result<Self, SimulationError> {
        config.validate()?;
        let grid = GridState::build(config.rows(), config.cols(), config.num_agents)?;
        // validate() keeps num_agents below MAX_TOTAL_CELLS, which fits in a u32 id.
        let agents: Vec<Agent> = (0..config.num_agents)
            .map(|id| Agent::new(id as u32))
            .collect();
        let turn_order = (0..agents.len()).collect();

        let mut sim = Self {
            config,
            grid,
            agents,
            turn_order,
            rng,
            phase: SimPhase::Uninitialized,
            initial_vacancies: 0,
            records: Vec::new(),
            stop_reason: None,
        };
        sim.seed_agents()?;
        Ok(sim)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Agent indices in the order they acted during the latest iteration.
    pub fn turn_order(&self) -> &[usize] {
        &self.turn_order
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    /// Vacancies left right after seeding.
    pub fn initial_vacancies(&self) -> usize {
        self.initial_vacancies
    }

    /// Rows recorded so far, one per executed iteration.
    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub(crate) fn expect_phase(&self, expected: SimPhase) -> Result<(), SimulationError> {
        if self.phase != expected {
            return Err(SimulationError::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }
}
