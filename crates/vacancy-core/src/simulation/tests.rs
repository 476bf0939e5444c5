use super::*;
use crate::grid::{CellState, GridState};
use std::collections::HashSet;

fn config(rows: usize, cols: usize, num_agents: usize, max_iter: usize, seed: u64) -> SimConfig {
    SimConfig {
        world_size: (rows, cols),
        num_agents,
        max_iter,
        seed,
        ..SimConfig::default()
    }
}

fn run_to_report(cfg: SimConfig) -> SimulationReport {
    let mut sim = Simulation::try_new(cfg).unwrap();
    sim.run().unwrap();
    sim.report().unwrap()
}

#[test]
fn seeding_gives_every_agent_its_own_cell() {
    for seed in 0..10 {
        let sim = Simulation::try_new(config(6, 7, 30, 10, seed)).unwrap();
        assert_eq!(sim.phase(), SimPhase::Seeded);
        assert_eq!(sim.grid().occupied_count(), 30);
        assert_eq!(sim.initial_vacancies(), 42 - 30);

        let mut homes = HashSet::new();
        for agent in sim.agents() {
            let cell = agent.location().expect("agent seated");
            assert!(homes.insert(cell), "cell {cell:?} shared");
            assert_eq!(sim.grid().state(cell), Some(CellState::Occupied(agent.id)));
        }
    }
}

#[test]
fn too_small_grid_fails_before_seeding() {
    let err = Simulation::try_new(config(3, 3, 9, 10, 0)).err().unwrap();
    assert_eq!(
        err,
        SimulationError::Config(SimConfigError::GridTooSmall {
            capacity: 9,
            num_agents: 9,
        })
    );
    assert!(Error::source(&err).is_some());
}

#[test]
fn three_by_three_with_two_agents_depletes_all_seven_vacancies() {
    let report = run_to_report(config(3, 3, 2, 10, 17));
    assert_eq!(report.initial_vacancies, 7);
    assert_eq!(report.vacant_removed(), vec![2, 2, 2, 1, 0]);
    assert_eq!(report.stop_reason, StopReason::Exhausted { iteration: 4 });
    assert_eq!(report.total_removed(), 7);

    let mut buf = Vec::new();
    report.write_csv(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "iteration,vacant_removed");
    assert_eq!(lines.len(), 1 + report.iterations.len());
}

#[test]
fn single_spare_cell_is_removed_then_run_stops() {
    let report = run_to_report(config(1, 3, 2, 10, 3));
    assert_eq!(report.vacant_removed(), vec![1, 0]);
    assert_eq!(report.stop_reason, StopReason::Exhausted { iteration: 1 });
}

#[test]
fn iteration_cap_cuts_run_short() {
    let report = run_to_report(config(10, 10, 2, 3, 8));
    assert_eq!(report.vacant_removed(), vec![2, 2, 2]);
    assert_eq!(report.stop_reason, StopReason::IterationCap { iterations: 3 });
    assert!(report.total_removed() < report.initial_vacancies);
}

#[test]
fn zero_max_iter_records_nothing() {
    let mut sim = Simulation::try_new(config(2, 2, 1, 0, 0)).unwrap();
    assert_eq!(sim.step().unwrap(), None);
    assert_eq!(sim.phase(), SimPhase::Terminated);
    let report = sim.report().unwrap();
    assert!(report.iterations.is_empty());
    assert_eq!(report.stop_reason, StopReason::IterationCap { iterations: 0 });
}

#[test]
fn default_parameters_deplete_in_one_iteration() {
    let report = run_to_report(SimConfig::default());
    assert_eq!(report.initial_vacancies, 20);
    assert_eq!(report.vacant_removed(), vec![20, 0]);
}

#[test]
fn removals_stay_within_vacancy_pool_each_iteration() {
    for seed in 0..5 {
        let mut sim = Simulation::try_new(config(9, 11, 13, 50, seed)).unwrap();
        loop {
            let vacant_before = sim.grid().vacant_count();
            let removed_before = sim.grid().removed_count();
            let Some(record) = sim.step().unwrap() else {
                break;
            };
            assert!(record.vacant_removed <= vacant_before);
            assert_eq!(sim.grid().removed_count(), removed_before + record.vacant_removed);
            assert_eq!(sim.grid().occupied_count(), 13);
            assert_eq!(
                sim.grid().vacant_count()
                    + sim.grid().occupied_count()
                    + sim.grid().removed_count(),
                99
            );
            if sim.phase() == SimPhase::Terminated {
                break;
            }
        }
        let report = sim.report().unwrap();
        assert!(report.iterations.len() <= 50);
        assert_eq!(report.total_removed(), 99 - 13);
        assert_eq!(report.iterations.last().map(|r| r.vacant_removed), Some(0));
        let counts = report.vacant_removed();
        assert!(counts.windows(2).all(|w| w[1] <= w[0]));
    }
}

#[test]
fn agents_never_leave_their_seats() {
    let mut sim = Simulation::try_new(config(5, 5, 4, 100, 21)).unwrap();
    let homes: Vec<_> = sim.agents().iter().map(|a| a.location()).collect();
    sim.run().unwrap();
    let after: Vec<_> = sim.agents().iter().map(|a| a.location()).collect();
    assert_eq!(homes, after);
    for agent in sim.agents() {
        let cell = agent.location().unwrap();
        assert_eq!(sim.grid().state(cell), Some(CellState::Occupied(agent.id)));
    }
}

#[test]
fn same_seed_reproduces_seating_and_removals() {
    let run = |seed| {
        let mut sim = Simulation::try_new(config(8, 8, 10, 3, seed)).unwrap();
        let seats: Vec<_> = sim.agents().iter().map(|a| a.location()).collect();
        sim.run().unwrap();
        (seats, sim.grid().list_vacancies(), sim.turn_order().to_vec())
    };
    assert_eq!(run(99), run(99));
}

#[test]
fn with_rng_matches_seeded_constructor() {
    let cfg = config(4, 4, 3, 10, 5);
    let a = Simulation::try_new(cfg.clone()).unwrap();
    let b = Simulation::with_rng(cfg, ChaCha12Rng::seed_from_u64(5)).unwrap();
    let seats = |s: &Simulation| s.agents().iter().map(|a| a.location()).collect::<Vec<_>>();
    assert_eq!(seats(&a), seats(&b));
}

#[test]
fn phases_advance_in_order_and_reject_misuse() {
    let mut sim = Simulation::try_new(config(2, 2, 1, 10, 0)).unwrap();
    assert_eq!(sim.phase(), SimPhase::Seeded);
    assert!(matches!(
        sim.report(),
        Err(SimulationError::InvalidPhase {
            expected: SimPhase::Terminated,
            actual: SimPhase::Seeded,
        })
    ));

    sim.step().unwrap();
    assert_eq!(sim.phase(), SimPhase::Running);

    sim.run().unwrap();
    assert_eq!(sim.phase(), SimPhase::Terminated);
    assert!(matches!(
        sim.step(),
        Err(SimulationError::InvalidPhase {
            actual: SimPhase::Terminated,
            ..
        })
    ));

    let report = sim.report().unwrap();
    assert_eq!(report.vacant_removed(), vec![1, 1, 1, 0]);
    assert_eq!(sim.phase(), SimPhase::Reported);
    assert!(sim.records().is_empty());
    assert!(sim.report().is_err());
}

#[test]
#[should_panic(expected = "grid too small")]
fn new_panics_on_invalid_config() {
    let _ = Simulation::new(config(1, 1, 1, 1, 0));
}

fn seated_three_by_three() -> Simulation {
    Simulation::try_new(config(3, 3, 2, 10, 12)).unwrap()
}

#[test]
fn verify_seating_accepts_fresh_seating() {
    assert_eq!(seated_three_by_three().verify_seating(), Ok(()));
}

#[test]
fn verify_seating_reports_unseated_agent() {
    let mut sim = seated_three_by_three();
    let id = sim.agents[1].id;
    sim.agents[1] = Agent::new(id);
    assert_eq!(
        sim.verify_seating(),
        Err(SimulationError::UnseatedAgent { agent_id: id })
    );
}

#[test]
fn verify_seating_reports_shared_cell() {
    let mut sim = seated_three_by_three();
    let home = sim.agents[0].location().unwrap();
    sim.agents[1].seat(home);
    assert_eq!(
        sim.verify_seating(),
        Err(SimulationError::SharedCell { cell: home })
    );
}

#[test]
fn verify_seating_reports_seat_missing_from_grid() {
    let mut sim = seated_three_by_three();
    let first = &sim.agents[0];
    let expected = SimulationError::SeatNotRecorded {
        agent_id: first.id,
        cell: first.location().unwrap(),
    };
    sim.grid = GridState::build(3, 3, 2).unwrap();
    let err = sim.verify_seating().unwrap_err();
    assert_eq!(err, expected);
    assert!(err.to_string().contains("does not record"), "{err}");
}

#[test]
fn verify_seating_reports_extra_occupied_cell() {
    let mut sim = seated_three_by_three();
    let spare = sim.grid.pick_random_vacancy(&mut sim.rng).unwrap();
    assert!(sim.grid.mark_occupied(spare, 99));
    assert_eq!(
        sim.verify_seating(),
        Err(SimulationError::OccupancyMismatch {
            expected: 2,
            actual: 3,
        })
    );
}

#[test]
fn persisted_report_file_matches_recorded_iterations() {
    let path = std::env::temp_dir().join(format!(
        "vacancy-core-report-{}.csv",
        std::process::id()
    ));
    let report = run_to_report(config(3, 3, 2, 10, 17));
    report.persist(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "iteration,vacant_removed");
    assert_eq!(lines.len(), 1 + report.iterations.len());
    assert_eq!(&lines[1..], ["0,2", "1,2", "2,2", "3,1", "4,0"]);
}

#[test]
fn large_population_seeds_and_runs_quickly() {
    let report = run_to_report(config(700, 700, 245_000, 10, 6));
    assert_eq!(report.initial_vacancies, 245_000);
    assert_eq!(report.vacant_removed(), vec![245_000, 0]);
}
