//! Board Generator
//!
//! A standalone tool that emits random input boards for the simulator.
//! Rock ridges come from Perlin noise so they form natural-looking
//! barriers; rabbits and foxes are scattered by a seeded PCG, so the same
//! seed always reproduces the same board. Densities and ecology
//! thresholds live in a RON config that can be tweaked without
//! recompiling.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// Densities and ecology thresholds for generated boards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Header value: rabbit breeding age
    pub rabbit_breeding_age: u32,
    /// Header value: fox breeding age
    pub fox_breeding_age: u32,
    /// Header value: fox starvation limit
    pub fox_starvation_limit: u32,
    /// Header value: generations to simulate
    pub generations: u32,
    /// Perlin noise frequency for rock ridges
    pub rock_frequency: f64,
    /// Noise threshold above which a cell becomes a rock
    pub rock_threshold: f64,
    /// Probability that a non-rock cell holds a rabbit
    pub rabbit_density: f64,
    /// Probability that a non-rock cell holds a fox
    pub fox_density: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rabbit_breeding_age: 5,
            fox_breeding_age: 7,
            fox_starvation_limit: 9,
            generations: 100,
            rock_frequency: 0.12,
            rock_threshold: 0.45,
            rabbit_density: 0.08,
            fox_density: 0.02,
        }
    }
}

/// Board Generator for the ecosystem simulator
#[derive(Parser, Debug)]
#[command(version, about = "Generate random input boards for the simulator")]
struct Args {
    /// Board rows
    #[arg(short, long, default_value = "64")]
    rows: usize,

    /// Board columns
    #[arg(short, long, default_value = "64")]
    cols: usize,

    /// Seed for board generation (random if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// RON config with densities and ecology thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the default config as RON and exit
    #[arg(long)]
    dump_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<BoardConfig, String> {
    match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|err| format!("failed to read config '{}': {}", path.display(), err))?;
            ron::from_str(&text)
                .map_err(|err| format!("failed to parse config '{}': {}", path.display(), err))
        }
        None => Ok(BoardConfig::default()),
    }
}

/// Generate the placement list for one board.
fn generate_board(config: &BoardConfig, rows: usize, cols: usize, seed: u64) -> Vec<String> {
    let ridges = Perlin::new(seed as u32);
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut placements = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let ridge = ridges.get([
                row as f64 * config.rock_frequency,
                col as f64 * config.rock_frequency,
            ]);
            if ridge > config.rock_threshold {
                placements.push(format!("ROCK {} {}", row, col));
                continue;
            }

            let roll: f64 = rng.gen();
            if roll < config.rabbit_density {
                placements.push(format!("RABBIT {} {}", row, col));
            } else if roll < config.rabbit_density + config.fox_density {
                placements.push(format!("FOX {} {}", row, col));
            }
        }
    }

    placements
}

fn write_board(
    mut out: impl Write,
    config: &BoardConfig,
    rows: usize,
    cols: usize,
    placements: &[String],
) -> io::Result<()> {
    writeln!(
        out,
        "{} {} {} {} {} {} {}",
        config.rabbit_breeding_age,
        config.fox_breeding_age,
        config.fox_starvation_limit,
        config.generations,
        rows,
        cols,
        placements.len()
    )?;
    for placement in placements {
        writeln!(out, "{}", placement)?;
    }
    out.flush()
}

fn main() {
    let args = Args::parse();

    if args.dump_config {
        match ron::ser::to_string_pretty(&BoardConfig::default(), Default::default()) {
            Ok(text) => println!("{}", text),
            Err(err) => {
                eprintln!("failed to serialize default config: {}", err);
                std::process::exit(1);
            }
        }
        return;
    }

    if args.rows == 0 || args.cols == 0 {
        eprintln!("board dimensions must be positive");
        std::process::exit(1);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    let seed = args.seed.unwrap_or_else(rand::random::<u64>);

    if args.verbose {
        println!("Board generator");
        println!("Seed: {}", seed);
        println!("Size: {}x{}", args.rows, args.cols);
    }

    let start_time = Instant::now();
    let placements = generate_board(&config, args.rows, args.cols, seed);

    let result = match &args.output {
        Some(path) => fs::File::create(path)
            .and_then(|file| write_board(io::BufWriter::new(file), &config, args.rows, args.cols, &placements)),
        None => write_board(io::stdout().lock(), &config, args.rows, args.cols, &placements),
    };

    if let Err(err) = result {
        eprintln!("failed to write board: {}", err);
        std::process::exit(1);
    }

    if args.verbose {
        println!(
            "Generated {} placements in {:.1}ms",
            placements.len(),
            start_time.elapsed().as_secs_f64() * 1000.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_reproduces_the_board() {
        let config = BoardConfig::default();
        let first = generate_board(&config, 16, 16, 42);
        let second = generate_board(&config, 16, 16, 42);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = BoardConfig::default();
        let first = generate_board(&config, 16, 16, 1);
        let second = generate_board(&config, 16, 16, 2);
        assert_ne!(first, second);
    }

    #[test]
    fn test_header_matches_placement_count() {
        let config = BoardConfig::default();
        let placements = generate_board(&config, 8, 8, 7);
        let mut buffer = Vec::new();
        write_board(&mut buffer, &config, 8, 8, &placements).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let header: Vec<&str> = text.lines().next().unwrap().split(' ').collect();
        assert_eq!(header.len(), 7);
        assert_eq!(header[6].parse::<usize>().unwrap(), placements.len());
        assert_eq!(text.lines().count(), placements.len() + 1);
    }

    #[test]
    fn test_generated_board_loads() {
        let config = BoardConfig::default();
        let placements = generate_board(&config, 12, 12, 99);
        let mut buffer = Vec::new();
        write_board(&mut buffer, &config, 12, 12, &placements).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let loaded = ecosim::load_world_str(&text).unwrap();
        assert_eq!(loaded.world.rows(), 12);
        assert_eq!(
            loaded.world.populated_count(),
            placements.len()
        );
    }
}
