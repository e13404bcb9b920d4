//! Simulator entry point.
//!
//! Reads a board, advances it the requested number of generations on a
//! worker pool, and writes the final listing.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ecosim::{load_world, write_results, LoadedWorld, Result, Simulation, StatsWriter};

/// Deterministic parallel rabbits-and-foxes ecosystem simulator
#[derive(Parser, Debug)]
#[command(version, about = "Advance a rabbits-and-foxes board by N generations")]
struct Args {
    /// Worker thread count; omitted, non-numeric, or <= 0 runs
    /// single-threaded
    threads: Option<String>,

    /// Input board file (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write per-generation population counts as JSON lines
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Mirror of the classic `atoi` contract: anything that does not parse
/// to a positive integer falls back to single-threaded mode.
fn parse_thread_argument(arg: Option<&str>) -> usize {
    arg.and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|&threads| threads > 0)
        .map(|threads| threads as usize)
        .unwrap_or(1)
}

fn run(args: &Args) -> Result<()> {
    let threads = parse_thread_argument(args.threads.as_deref());

    let LoadedWorld { params, world } = match &args.input {
        Some(path) => load_world(BufReader::new(File::open(path)?))?,
        None => load_world(io::stdin().lock())?,
    };

    let mut stats = match &args.stats {
        Some(path) => Some(StatsWriter::create(path)?),
        None => None,
    };

    let mut simulation = Simulation::new(params, world);

    let start = Instant::now();
    let timing = simulation.run(threads, stats.as_mut())?;
    let elapsed = start.elapsed();

    info!("took {} microseconds", elapsed.as_micros());
    if timing.sample_count > 0 {
        info!(
            "generations: {} (avg {:.3}ms, min {:.3}ms, max {:.3}ms)",
            timing.sample_count,
            timing.average_duration().as_secs_f64() * 1000.0,
            timing.min_duration.as_secs_f64() * 1000.0,
            timing.max_duration.as_secs_f64() * 1000.0,
        );
    }

    match &args.output {
        Some(path) => write_results(
            BufWriter::new(File::create(path)?),
            simulation.params(),
            simulation.world(),
        )?,
        None => write_results(
            BufWriter::new(io::stdout().lock()),
            simulation.params(),
            simulation.world(),
        )?,
    }

    if let Some(stats) = stats {
        stats.finish()?;
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(&args) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
