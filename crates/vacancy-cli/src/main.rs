use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use vacancy_core::{SimConfig, Simulation};

/// Seat agents on a grid and let them deplete its vacant cells.
#[derive(Debug, Parser)]
#[command(name = "vacancy-sim", version)]
struct Cli {
    /// JSON file with any subset of the configuration fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    rows: Option<usize>,
    #[arg(long)]
    cols: Option<usize>,
    #[arg(long)]
    agents: Option<usize>,
    #[arg(long)]
    max_iter: Option<usize>,
    /// Destination of the `iteration,vacant_removed` table.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// Print the summary only; do not write the table.
    #[arg(long)]
    no_persist: bool,
    /// Repeat for more log output (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str::<SimConfig>(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SimConfig::default(),
        };
        if let Some(rows) = self.rows {
            config.world_size.0 = rows;
        }
        if let Some(cols) = self.cols {
            config.world_size.1 = cols;
        }
        if let Some(agents) = self.agents {
            config.num_agents = agents;
        }
        if let Some(max_iter) = self.max_iter {
            config.max_iter = max_iter;
        }
        if let Some(out) = &self.out {
            config.out_path = out.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.no_persist {
            config.persist_report = false;
        }
        Ok(config)
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.resolve_config()?;
    info!(?config, "starting simulation");

    let mut sim = Simulation::try_new(config.clone()).context("initializing simulation")?;
    sim.run()?;
    let report = sim.report()?;

    println!();
    println!("{report}");

    if config.persist_report {
        report
            .persist(&config.out_path)
            .with_context(|| format!("writing report to {}", config.out_path.display()))?;
        println!();
        println!("Results written to: {}", config.out_path.display());
    }
    Ok(())
}
