use super::metrics::{IterationRecord, SimulationReport, StopReason};
use super::{SimPhase, Simulation, SimulationError};
use crate::grid::CellState;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{debug, info};

impl Simulation {
    /// Seat every agent on a distinct random vacancy, in shuffled order.
    pub(crate) fn seed_agents(&mut self) -> Result<(), SimulationError> {
        self.expect_phase(SimPhase::Uninitialized)?;

        let mut seating: Vec<usize> = (0..self.agents.len()).collect();
        seating.shuffle(&mut self.rng);
        for idx in seating {
            let agent = &mut self.agents[idx];
            let Some(cell) = self.grid.pick_random_vacancy(&mut self.rng) else {
                break;
            };
            if self.grid.mark_occupied(cell, agent.id) {
                agent.seat(cell);
            }
        }
        self.verify_seating()?;

        self.initial_vacancies = self.grid.vacant_count();
        self.phase = SimPhase::Seeded;
        info!(
            rows = self.grid.rows(),
            cols = self.grid.cols(),
            agents = self.agents.len(),
            vacancies = self.initial_vacancies,
            "seeded simulation"
        );
        Ok(())
    }

    /// Seating must leave each agent on its own cell, recorded as such in the grid.
    pub(crate) fn verify_seating(&self) -> Result<(), SimulationError> {
        let mut homes = HashSet::with_capacity(self.agents.len());
        for agent in &self.agents {
            let Some(cell) = agent.location() else {
                return Err(SimulationError::UnseatedAgent { agent_id: agent.id });
            };
            if !homes.insert(cell) {
                return Err(SimulationError::SharedCell { cell });
            }
            if self.grid.state(cell) != Some(CellState::Occupied(agent.id)) {
                return Err(SimulationError::SeatNotRecorded {
                    agent_id: agent.id,
                    cell,
                });
            }
        }
        if self.grid.occupied_count() != self.agents.len() {
            return Err(SimulationError::OccupancyMismatch {
                expected: self.agents.len(),
                actual: self.grid.occupied_count(),
            });
        }
        Ok(())
    }

    fn terminate(&mut self, reason: StopReason) {
        self.phase = SimPhase::Terminated;
        self.stop_reason = Some(reason);
        match reason {
            StopReason::Exhausted { iteration } => {
                info!(iteration, "no more vacant cells to remove, stopping early");
            }
            StopReason::IterationCap { iterations } => {
                info!(iterations, "iteration cap reached");
            }
        }
    }

    /// Run one iteration: reshuffle the turn order, give every agent one move
    /// attempt, and record how many vacancies were removed.
    ///
    /// Returns `None` without recording anything when `max_iter` is zero.
    pub fn step(&mut self) -> Result<Option<IterationRecord>, SimulationError> {
        match self.phase {
            SimPhase::Seeded => self.phase = SimPhase::Running,
            SimPhase::Running => {}
            actual => {
                return Err(SimulationError::InvalidPhase {
                    expected: SimPhase::Running,
                    actual,
                })
            }
        }

        let iteration = self.records.len();
        if iteration >= self.config.max_iter {
            self.terminate(StopReason::IterationCap {
                iterations: iteration,
            });
            return Ok(None);
        }

        let vacant_before = self.grid.vacant_count();
        self.turn_order.shuffle(&mut self.rng);
        let mut total_removed = 0;
        for &idx in &self.turn_order {
            total_removed += self.agents[idx].attempt_move(&mut self.grid, &mut self.rng);
        }
        debug_assert!(total_removed <= vacant_before);

        let record = IterationRecord {
            iteration,
            vacant_removed: total_removed,
        };
        self.records.push(record);
        debug!(
            iteration,
            removed = total_removed,
            vacant = self.grid.vacant_count(),
            "iteration complete"
        );

        if total_removed == 0 {
            self.terminate(StopReason::Exhausted { iteration });
        } else if self.records.len() == self.config.max_iter {
            self.terminate(StopReason::IterationCap {
                iterations: self.records.len(),
            });
        }
        Ok(Some(record))
    }

    /// Iterate until a zero-removal iteration or the iteration cap.
    pub fn run(&mut self) -> Result<StopReason, SimulationError> {
        loop {
            self.step()?;
            if let Some(reason) = self.stop_reason {
                return Ok(reason);
            }
        }
    }

    /// Hand the recorded rows over as a report. Only valid once, after the run.
    pub fn report(&mut self) -> Result<SimulationReport, SimulationError> {
        self.expect_phase(SimPhase::Terminated)?;
        let Some(stop_reason) = self.stop_reason else {
            return Err(SimulationError::InvalidPhase {
                expected: SimPhase::Terminated,
                actual: self.phase,
            });
        };
        self.phase = SimPhase::Reported;
        Ok(SimulationReport {
            schema_version: 1,
            world_size: (self.grid.rows(), self.grid.cols()),
            num_agents: self.agents.len(),
            seed: self.config.seed,
            initial_vacancies: self.initial_vacancies,
            stop_reason,
            iterations: std::mem::take(&mut self.records),
        })
    }
}
