//! Simulation orchestration: run parameters, validation, and the
//! generation loop over a fixed pool of band workers.

pub mod conflict;
pub mod partition;
pub mod profiler;
pub mod sync;
mod worker;

use std::sync::Barrier;

use tracing::{info, warn};

use crate::errors::{EcosimError, Result};
use crate::stats::StatsWriter;
use crate::world::{RowCounters, World};

use self::conflict::ConflictExchange;
use self::partition::{distribute, BandPlan};
use self::profiler::{GenerationProfiler, GenerationTiming};
use self::sync::Semaphore;
use self::worker::{run_single, run_worker, PhaseEnv, PoolSync, PopulationHook};

/// Ecology thresholds and grid dimensions, immutable for the lifetime of
/// a run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationParams {
    /// Generations a rabbit must reach before it reproduces on a move.
    pub rabbit_breeding_age: u32,
    /// Generations a fox must reach before it reproduces on a move.
    pub fox_breeding_age: u32,
    /// Generations without food after which a fox starves.
    pub fox_starvation_limit: u32,
    /// Generations to simulate.
    pub generations: u32,
    pub rows: usize,
    pub cols: usize,
    /// Number of placement records in the input.
    pub initial_population: usize,
}

/// A loaded world plus the counters the load balancer feeds on.
pub struct Simulation {
    params: SimulationParams,
    world: World,
    counters: RowCounters,
}

impl Simulation {
    pub fn new(params: SimulationParams, world: World) -> Self {
        let counters = RowCounters::new(world.rows());
        counters.rebuild_from(&world);
        Self {
            params,
            world,
            counters,
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn counters(&self) -> &RowCounters {
        &self.counters
    }

    /// Reject thread counts the band model cannot honor: every worker
    /// needs at least one row.
    fn validate_threads(&self, threads: usize) -> Result<()> {
        if threads < 1 {
            return Err(EcosimError::config("thread count must be at least 1"));
        }
        if threads > self.params.rows {
            return Err(EcosimError::config(format!(
                "thread count ({}) cannot exceed row count ({})",
                threads, self.params.rows
            )));
        }
        Ok(())
    }

    /// Advance the world by `params.generations` generations using
    /// `threads` band workers, optionally recording per-generation
    /// population counts. Returns the generation timing summary.
    pub fn run(
        &mut self,
        threads: usize,
        stats: Option<&mut StatsWriter>,
    ) -> Result<GenerationTiming> {
        self.validate_threads(threads)?;

        let mut profiler = GenerationProfiler::new();

        // Only pay the per-generation population scan when a sink is
        // actually attached. Stats failures degrade the run instead of
        // aborting it: log once and stop recording.
        let hook_enabled = stats.is_some();
        let mut stats = stats;
        let mut stats_failed = false;
        let mut hook = move |gen: u32, rabbits: u32, foxes: u32| {
            if stats_failed {
                return;
            }
            if let Some(writer) = stats.as_deref_mut() {
                if let Err(err) = writer.record(gen, rabbits, foxes) {
                    warn!("stats sink failed, disabling: {}", err);
                    stats_failed = true;
                }
            }
        };

        let params = self.params;
        let counters = &self.counters;
        let (cells, reachable) = self.world.split_for_run();
        let env = PhaseEnv {
            params: &params,
            cells,
            reachable,
            counters,
        };

        if threads == 1 {
            let hook_ref: Option<PopulationHook<'_>> =
                if hook_enabled { Some(&mut hook) } else { None };
            run_single(&env, Some(&mut profiler), hook_ref);
        } else {
            info!("running {} generations on {} worker threads", params.generations, threads);
            let plan = BandPlan::new(&distribute(&counters.cum_snapshot(), threads));
            let barrier = Barrier::new(threads);
            let exchange = ConflictExchange::new(threads, params.cols);
            let chain: Vec<Semaphore> = (0..threads).map(|_| Semaphore::new()).collect();
            let pool = PoolSync {
                barrier: &barrier,
                exchange: &exchange,
                chain: &chain,
                plan: &plan,
                workers: threads,
            };

            std::thread::scope(|scope| {
                let mut profiler_slot = Some(&mut profiler);
                let mut hook_slot: Option<PopulationHook<'_>> =
                    if hook_enabled { Some(&mut hook) } else { None };
                for index in 0..threads {
                    let profiler_ref = if index == 0 {
                        profiler_slot.take()
                    } else {
                        None
                    };
                    let hook_ref = if index == threads - 1 {
                        hook_slot.take()
                    } else {
                        None
                    };
                    let env = env;
                    let pool = &pool;
                    scope.spawn(move || run_worker(&env, pool, index, profiler_ref, hook_ref));
                }
            });
        }

        Ok(profiler.into_timing())
    }
}
