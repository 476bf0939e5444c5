use crate::config::{self, SimConfigError};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One addressable grid location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Vacant,
    Occupied(u32),
    /// Permanently out of the vacancy pool.
    Removed,
}

/// Occupancy record for every cell of a rectangular grid.
///
/// States are stored row-major. Vacant cells are also kept in an unordered
/// pool with a per-cell slot index, so picking and removing a vacancy are
/// O(1). `pool.len() + occupied + removed == cell_count` holds after every
/// call.
#[derive(Clone, Debug)]
pub struct GridState {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
    /// Cell indices currently vacant, in no particular order.
    pool: Vec<usize>,
    /// Position of each cell in `pool`, or `NOT_POOLED`.
    pool_slot: Vec<usize>,
    occupied: usize,
    removed: usize,
}

const NOT_POOLED: usize = usize::MAX;

impl GridState {
    /// Build a fully vacant `rows x cols` grid able to seat `num_agents`.
    pub fn build(rows: usize, cols: usize, num_agents: usize) -> Result<Self, SimConfigError> {
        let capacity = config::validate_capacity(rows, cols, num_agents)?;
        Ok(Self {
            rows,
            cols,
            cells: vec![CellState::Vacant; capacity],
            pool: (0..capacity).collect(),
            pool_slot: (0..capacity).collect(),
            occupied: 0,
            removed: 0,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn vacant_count(&self) -> usize {
        self.pool.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    pub fn removed_count(&self) -> usize {
        self.removed
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.index(cell).is_some()
    }

    /// State of `cell`, or `None` when it lies outside the grid.
    pub fn state(&self, cell: Cell) -> Option<CellState> {
        self.index(cell).map(|idx| self.cells[idx])
    }

    /// All vacant cells in row-major order.
    pub fn list_vacancies(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == CellState::Vacant)
            .map(|(idx, _)| self.cell_at(idx))
            .collect()
    }

    /// A uniformly chosen vacancy, or `None` once the pool is empty.
    pub fn pick_random_vacancy<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        self.pool.choose(rng).map(|&idx| self.cell_at(idx))
    }

    /// Take a vacant cell out of the pool for good.
    ///
    /// Returns `false` and changes nothing if the cell is occupied, already
    /// removed, or out of range.
    pub fn mark_removed(&mut self, cell: Cell) -> bool {
        match self.vacant_index(cell) {
            Some(idx) => {
                self.cells[idx] = CellState::Removed;
                self.take_from_pool(idx);
                self.removed += 1;
                true
            }
            None => {
                debug!(?cell, state = ?self.state(cell), "ignoring removal of non-vacant cell");
                false
            }
        }
    }

    /// Seat `agent_id` on a vacant cell. Same rejection rules as `mark_removed`.
    pub fn mark_occupied(&mut self, cell: Cell, agent_id: u32) -> bool {
        match self.vacant_index(cell) {
            Some(idx) => {
                self.cells[idx] = CellState::Occupied(agent_id);
                self.take_from_pool(idx);
                self.occupied += 1;
                true
            }
            None => {
                debug!(?cell, agent_id, state = ?self.state(cell), "ignoring seat on non-vacant cell");
                false
            }
        }
    }

    /// Occupied cells with their occupants, row-major.
    pub fn occupants(&self) -> impl Iterator<Item = (Cell, u32)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(idx, state)| match state {
                CellState::Occupied(id) => Some((self.cell_at(idx), *id)),
                _ => None,
            })
    }

    fn take_from_pool(&mut self, idx: usize) {
        let slot = self.pool_slot[idx];
        debug_assert_ne!(slot, NOT_POOLED);
        self.pool.swap_remove(slot);
        if let Some(&moved) = self.pool.get(slot) {
            self.pool_slot[moved] = slot;
        }
        self.pool_slot[idx] = NOT_POOLED;
    }

    fn vacant_index(&self, cell: Cell) -> Option<usize> {
        self.index(cell)
            .filter(|&idx| self.cells[idx] == CellState::Vacant)
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        (cell.row < self.rows && cell.col < self.cols).then(|| cell.row * self.cols + cell.col)
    }

    fn cell_at(&self, idx: usize) -> Cell {
        Cell::new(idx / self.cols, idx % self.cols)
    }
}
