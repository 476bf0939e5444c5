use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: &str = "iteration,vacant_removed";

/// Vacancies removed during one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub vacant_removed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// An iteration removed nothing: the vacancy pool is empty.
    Exhausted { iteration: usize },
    IterationCap { iterations: usize },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted { iteration } => write!(
                f,
                "No more vacant cells to remove. Stopping after iteration {iteration}."
            ),
            StopReason::IterationCap { iterations } => {
                write!(f, "Reached the iteration cap after {iterations} iterations.")
            }
        }
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub world_size: (usize, usize),
    pub num_agents: usize,
    pub seed: u64,
    pub initial_vacancies: usize,
    pub stop_reason: StopReason,
    pub iterations: Vec<IterationRecord>,
}

impl SimulationReport {
    /// Removal counts in iteration order, starting at iteration 0.
    pub fn vacant_removed(&self) -> Vec<usize> {
        self.iterations.iter().map(|r| r.vacant_removed).collect()
    }

    pub fn total_removed(&self) -> usize {
        self.iterations.iter().map(|r| r.vacant_removed).sum()
    }

    pub fn stopped_early(&self) -> bool {
        matches!(self.stop_reason, StopReason::Exhausted { .. })
    }

    /// Write the two-column table: header, then one `<iteration>,<count>` line per row.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{CSV_HEADER}")?;
        for record in &self.iterations {
            writeln!(out, "{},{}", record.iteration, record.vacant_removed)?;
        }
        out.flush()
    }

    /// Create (or truncate) `path` and write the table to it.
    pub fn persist(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))
    }
}

/// Console summary of the run.
impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "All results begin at time=0 and go in order to the end.")?;
        writeln!(f)?;
        writeln!(
            f,
            "Number of vacant cells removed per iteration: {:?}",
            self.vacant_removed()
        )?;
        writeln!(
            f,
            "Removed {} of {} initial vacancies.",
            self.total_removed(),
            self.initial_vacancies
        )?;
        write!(f, "{}", self.stop_reason)
    }
}
