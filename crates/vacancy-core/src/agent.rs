use crate::grid::{Cell, GridState};
use rand::Rng;

/// An occupant of the grid.
///
/// `location` is set once while seating and is never changed by
/// [`Agent::attempt_move`]: a move consumes some other vacancy without
/// relocating the agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    pub id: u32,
    location: Option<Cell>,
}

impl Agent {
    pub fn new(id: u32) -> Self {
        Self { id, location: None }
    }

    pub fn location(&self) -> Option<Cell> {
        self.location
    }

    pub(crate) fn seat(&mut self, cell: Cell) {
        self.location = Some(cell);
    }

    /// Claim one uniformly chosen vacancy and remove it from the grid.
    ///
    /// Returns 1 if a cell was removed, 0 if the grid had no vacancies left.
    pub fn attempt_move<R: Rng + ?Sized>(&self, grid: &mut GridState, rng: &mut R) -> usize {
        match grid.pick_random_vacancy(rng) {
            Some(cell) => usize::from(grid.mark_removed(cell)),
            None => 0,
        }
    }
}
