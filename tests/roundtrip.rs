//! Load -> run zero generations -> emit: the listing must reproduce the
//! input, modulo the pinned generation slot in the header.

use std::fs;
use std::io::BufReader;

use ecosim::{load_world, results_to_string, Simulation, StatsWriter};

const BOARD: &str = "4 6 8 0 3 4 5\n\
                     ROCK 0 2\n\
                     RABBIT 1 0\n\
                     FOX 1 3\n\
                     RABBIT 2 1\n\
                     ROCK 2 3\n";

#[test]
fn test_zero_generation_file_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input_path = dir.path().join("board.txt");
    fs::write(&input_path, BOARD).expect("write board");

    let file = fs::File::open(&input_path).expect("open board");
    let loaded = load_world(BufReader::new(file)).expect("board parses");
    let mut simulation = Simulation::new(loaded.params, loaded.world);
    simulation.run(1, None).expect("run succeeds");

    let output = results_to_string(simulation.params(), simulation.world()).unwrap();
    assert_eq!(output, BOARD, "records must survive a zero-generation run");
}

#[test]
fn test_header_slot_is_pinned_even_for_long_runs() {
    let board = "4 6 8 3 3 4 1\nROCK 0 2\n";
    let loaded = load_world(board.as_bytes()).expect("board parses");
    let mut simulation = Simulation::new(loaded.params, loaded.world);
    simulation.run(1, None).expect("run succeeds");

    let output = results_to_string(simulation.params(), simulation.world()).unwrap();
    let header: Vec<&str> = output.lines().next().unwrap().split(' ').collect();
    assert_eq!(header, vec!["4", "6", "8", "0", "3", "4", "1"]);
}

#[test]
fn test_stats_file_gets_one_line_per_generation() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stats_path = dir.path().join("stats.jsonl");

    let board = "2 3 4 5 4 4 3\nRABBIT 0 0\nRABBIT 2 2\nFOX 3 3\n";
    let loaded = load_world(board.as_bytes()).expect("board parses");
    let mut simulation = Simulation::new(loaded.params, loaded.world);

    let mut stats = StatsWriter::create(&stats_path).expect("create stats sink");
    simulation.run(2, Some(&mut stats)).expect("run succeeds");
    stats.finish().expect("flush stats");

    let text = fs::read_to_string(&stats_path).expect("read stats");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5, "one record per generation");
    for (index, line) in lines.iter().enumerate() {
        let record: serde_json::Value = serde_json::from_str(line).expect("valid JSON line");
        assert_eq!(record["generation"], index as u64);
        assert_eq!(
            record["total"],
            record["rabbits"].as_u64().unwrap() + record["foxes"].as_u64().unwrap()
        );
    }
}
