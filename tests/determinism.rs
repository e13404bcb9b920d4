//! The final board is a function of the input alone: any worker count
//! from one to one-per-row must produce identical output.

use std::fmt::Write as _;

use ecosim::simulation::partition::distribute;
use ecosim::world::CellContent;
use ecosim::{load_world_str, results_to_string, Simulation};

const ROWS: usize = 16;
const COLS: usize = 12;

/// A mixed board with rock clusters and interleaved populations, laid
/// out by arithmetic so the test needs no fixture file.
fn build_board(generations: u32) -> String {
    let mut records = Vec::new();
    for row in 0..ROWS {
        for col in 0..COLS {
            if (row * 7 + col * 3) % 11 == 0 {
                records.push(format!("ROCK {} {}", row, col));
            } else if (row + 2 * col) % 5 == 0 {
                records.push(format!("RABBIT {} {}", row, col));
            } else if (row * col) % 17 == 3 {
                records.push(format!("FOX {} {}", row, col));
            }
        }
    }

    let mut board = String::new();
    writeln!(
        board,
        "3 4 5 {} {} {} {}",
        generations,
        ROWS,
        COLS,
        records.len()
    )
    .unwrap();
    for record in records {
        board.push_str(&record);
        board.push('\n');
    }
    board
}

fn run_board(input: &str, threads: usize) -> Simulation {
    let loaded = load_world_str(input).expect("board parses");
    let mut simulation = Simulation::new(loaded.params, loaded.world);
    simulation.run(threads, None).expect("run succeeds");
    simulation
}

#[test]
fn test_output_is_identical_for_every_thread_count() {
    let board = build_board(12);
    let reference = run_board(&board, 1);
    let reference_text = results_to_string(reference.params(), reference.world()).unwrap();

    for threads in 2..=ROWS {
        let sim = run_board(&board, threads);
        let text = results_to_string(sim.params(), sim.world()).unwrap();
        assert_eq!(
            text, reference_text,
            "thread count {} diverged from the single-threaded run",
            threads
        );
    }
}

#[test]
fn test_row_counters_match_live_population() {
    for threads in [1, 3, 7] {
        let sim = run_board(&build_board(9), threads);
        assert_eq!(
            sim.counters().per_row_total(),
            sim.world().creature_count() as u32,
            "per-row counters out of sync at {} threads",
            threads
        );
        assert_eq!(
            sim.counters().total(),
            sim.world().creature_count() as u32,
            "cumulative counters out of sync at {} threads",
            threads
        );
    }
}

#[test]
fn test_no_fox_outlives_the_starvation_limit() {
    let sim = run_board(&build_board(15), 4);
    let limit = sim.params().fox_starvation_limit;
    for (row, col, content) in sim.world().iter_populated() {
        if let CellContent::Fox(fox) = content {
            assert!(
                fox.food_age <= limit,
                "fox at ({}, {}) has food_age {} past the limit {}",
                row,
                col,
                fox.food_age,
                limit
            );
        }
    }
}

#[test]
fn test_repartitioning_is_idempotent_after_a_run() {
    let sim = run_board(&build_board(6), 5);
    let cum = sim.counters().cum_snapshot();
    for workers in 1..=ROWS {
        assert_eq!(distribute(&cum, workers), distribute(&cum, workers));
    }
}

#[test]
fn test_thread_count_above_rows_is_rejected() {
    let loaded = load_world_str("1 1 1 1 2 2 0\n").unwrap();
    let mut simulation = Simulation::new(loaded.params, loaded.world);
    let err = simulation.run(3, None).unwrap_err();
    assert!(err.to_string().contains("cannot exceed row count"));

    let err = simulation.run(0, None).unwrap_err();
    assert!(err.to_string().contains("at least 1"));
}
