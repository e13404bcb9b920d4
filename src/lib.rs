//! A deterministic, parallel rabbits-and-foxes ecosystem simulator.
//!
//! A bounded rectangular grid of rocks, rabbits, and foxes advances in
//! discrete generations: rabbits move and breed, foxes hunt, breed, and
//! starve. Rows are partitioned into contiguous bands, one per worker
//! thread, re-balanced each generation by live entity density; moves that
//! cross a band boundary are exchanged pairwise between neighbors. Agent
//! movement is selected by `(generation + row + col) mod choices`, so the
//! final board is a pure function of the input regardless of thread
//! count or scheduling.

pub mod entities;
pub mod errors;
pub mod movement;
pub mod serialization;
pub mod simulation;
pub mod stats;
pub mod world;
pub mod world_loader;

pub use errors::{EcosimError, Result};
pub use serialization::{results_to_string, write_results};
pub use simulation::{Simulation, SimulationParams};
pub use stats::StatsWriter;
pub use world_loader::{load_world, load_world_str, LoadedWorld};
