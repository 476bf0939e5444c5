use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{error::Error, fmt};

/// Static parameters for one simulation run.
///
/// Missing fields fall back to [`SimConfig::default`] when deserialized, so a
/// config file only needs to name what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid dimensions as `(rows, cols)`.
    pub world_size: (usize, usize),
    pub num_agents: usize,
    pub max_iter: usize,
    pub out_path: PathBuf,
    pub seed: u64,
    /// Write the report table to `out_path` once the run ends.
    pub persist_report: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_size: (20, 20),
            num_agents: 380,
            max_iter: 100,
            out_path: PathBuf::from("vacant_removed.csv"),
            seed: 42,
            persist_report: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimConfigError {
    GridTooSmall { capacity: usize, num_agents: usize },
    CellCountOverflow { rows: usize, cols: usize },
    TooManyCells { max: usize, actual: usize },
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::GridTooSmall {
                capacity,
                num_agents,
            } => write!(
                f,
                "grid too small for number of agents: rows * cols ({capacity}) must exceed num_agents ({num_agents})"
            ),
            SimConfigError::CellCountOverflow { rows, cols } => {
                write!(f, "rows ({rows}) * cols ({cols}) overflows usize")
            }
            SimConfigError::TooManyCells { max, actual } => {
                write!(f, "cell count ({actual}) exceeds supported maximum ({max})")
            }
        }
    }
}

impl Error for SimConfigError {}

impl SimConfig {
    pub const MAX_TOTAL_CELLS: usize = 1 << 24;

    pub fn rows(&self) -> usize {
        self.world_size.0
    }

    pub fn cols(&self) -> usize {
        self.world_size.1
    }

    /// Number of cells the grid will hold, after overflow and size checks.
    pub fn cell_count(&self) -> Result<usize, SimConfigError> {
        checked_cell_count(self.rows(), self.cols())
    }

    /// Cells left vacant once every agent is seated.
    pub fn initial_vacancies(&self) -> Result<usize, SimConfigError> {
        Ok(self.cell_count()?.saturating_sub(self.num_agents))
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        validate_capacity(self.rows(), self.cols(), self.num_agents).map(|_| ())
    }
}

pub(crate) fn checked_cell_count(rows: usize, cols: usize) -> Result<usize, SimConfigError> {
    let capacity = rows
        .checked_mul(cols)
        .ok_or(SimConfigError::CellCountOverflow { rows, cols })?;
    if capacity > SimConfig::MAX_TOTAL_CELLS {
        return Err(SimConfigError::TooManyCells {
            max: SimConfig::MAX_TOTAL_CELLS,
            actual: capacity,
        });
    }
    Ok(capacity)
}

/// Every agent needs a seat and at least one cell must start vacant.
pub(crate) fn validate_capacity(
    rows: usize,
    cols: usize,
    num_agents: usize,
) -> Result<usize, SimConfigError> {
    let capacity = checked_cell_count(rows, cols)?;
    if capacity <= num_agents {
        return Err(SimConfigError::GridTooSmall {
            capacity,
            num_agents,
        });
    }
    Ok(capacity)
}
