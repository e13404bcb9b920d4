//! The per-band worker engine.
//!
//! Each generation runs in two sub-phases, rabbits first, foxes second.
//! A sub-phase reads exclusively from a private snapshot of the band
//! (plus one halo row on each open side) and writes exclusively to the
//! live grid, so iteration order within a band cannot influence what an
//! agent sees. Moves that land outside the band are queued as conflicts
//! and applied by the owning neighbor after the sub-phase.

use std::sync::Barrier;

use tracing::error;

use crate::entities::{
    resolve_fox_move, resolve_rabbit_move, FoxState, MoveOutcome, RabbitState,
};
use crate::movement::{analyze_fox_moves, analyze_rabbit_moves, MoveSet};
use crate::world::{project, CellContent, RowCounters, SharedCells, Snapshot};

use super::conflict::{Conflict, ConflictBuffers, ConflictExchange, ConflictPayload};
use super::partition::{update_cumulative_counts, Band, BandPlan};
use super::profiler::GenerationProfiler;
use super::sync::Semaphore;
use super::SimulationParams;

/// Per-generation population callback, fed to the stats sink by the last
/// worker: `(generation, rabbits, foxes)`.
pub(crate) type PopulationHook<'a> = &'a mut (dyn FnMut(u32, u32, u32) + Send);

/// Everything a sub-phase needs: run parameters, the shared live grid,
/// the frozen reachability cache, and the row counters.
#[derive(Clone, Copy)]
pub(crate) struct PhaseEnv<'a> {
    pub params: &'a SimulationParams,
    pub cells: SharedCells<'a>,
    pub reachable: &'a [MoveSet],
    pub counters: &'a RowCounters,
}

impl PhaseEnv<'_> {
    #[inline]
    fn reachable_at(&self, row: usize, col: usize) -> &MoveSet {
        &self.reachable[project(self.params.cols, row, col)]
    }
}

/// Synchronization shared by the whole worker pool.
pub(crate) struct PoolSync<'a> {
    pub barrier: &'a Barrier,
    pub exchange: &'a ConflictExchange,
    pub chain: &'a [Semaphore],
    pub plan: &'a BandPlan,
    pub workers: usize,
}

/// Snapshot the band plus one halo row above (unless the band starts at
/// row 0) and one below (unless it ends at the last row).
///
/// Callers must be between the snapshot barriers: no worker writes while
/// the copies run.
fn capture_band_snapshot(env: &PhaseEnv<'_>, band: Band) -> Snapshot {
    let first = band.start.saturating_sub(1);
    let last = if band.end < env.params.rows - 1 {
        band.end + 1
    } else {
        band.end
    };
    // SAFETY: see above; the engine brackets snapshotting with barriers.
    unsafe { env.cells.snapshot(first, last) }
}

/// One rabbit's turn. Reads the snapshot, writes the live grid.
fn rabbit_turn(
    env: &PhaseEnv<'_>,
    gen: u32,
    band: Band,
    row: usize,
    col: usize,
    mut rabbit: RabbitState,
    snapshot: &Snapshot,
    conflicts: &mut ConflictBuffers,
) {
    let moves = analyze_rabbit_moves(snapshot, env.reachable_at(row, col), row, col);

    if moves.is_empty() {
        // Boxed in (including by a fox): stay in place and age.
        env.counters.increment(row);
        // SAFETY: `row` is in our band.
        if let CellContent::Rabbit(live) = unsafe { env.cells.cell_mut(row, col) } {
            live.tick_age(gen);
        }
        return;
    }

    let direction = moves.select(gen, row, col);
    let (new_row, new_col) = direction.step(row, col);

    // A parent old enough to breed leaves a newborn at the source;
    // otherwise the source empties.
    let bred = rabbit.age >= env.params.rabbit_breeding_age;
    {
        // SAFETY: `row` is in our band.
        let source = unsafe { env.cells.cell_mut(row, col) };
        if bred {
            *source = CellContent::Rabbit(RabbitState::newborn(gen));
            rabbit.reset_after_breeding(gen);
            env.counters.increment(row);
        } else {
            *source = CellContent::Empty;
        }
    }

    if !band.contains(new_row) {
        // The destination row belongs to a neighbor. Age now (the owner
        // resolves after this sub-phase, when this agent counts as
        // already ticked) and hand the record off.
        if !bred {
            rabbit.tick_age(gen);
        }
        conflicts.push(
            new_row < band.start,
            Conflict {
                row: new_row,
                col: new_col,
                payload: ConflictPayload::Rabbit(rabbit),
            },
        );
        return;
    }

    // SAFETY: `new_row` is in our band.
    let target = unsafe { env.cells.cell_mut(new_row, new_col) };
    match resolve_rabbit_move(rabbit, target) {
        outcome @ (MoveOutcome::MovedToEmpty | MoveOutcome::WonConflict) => {
            if outcome == MoveOutcome::MovedToEmpty {
                env.counters.increment(new_row);
            }
            // The contest compares pre-aging ages; the survivor ages
            // after settling in.
            if !bred {
                if let CellContent::Rabbit(live) = target {
                    live.tick_age(gen);
                }
            }
        }
        MoveOutcome::Lost | MoveOutcome::Illegal | MoveOutcome::KilledPrey => {}
    }
}

/// One fox's turn.
fn fox_turn(
    env: &PhaseEnv<'_>,
    gen: u32,
    band: Band,
    row: usize,
    col: usize,
    mut fox: FoxState,
    snapshot: &Snapshot,
    conflicts: &mut ConflictBuffers,
) {
    let moves = analyze_fox_moves(snapshot, env.reachable_at(row, col), row, col);

    // Hunger advances before anything else. A fox with no prey in reach
    // and an exhausted food budget dies where it stands, before moving
    // or breeding.
    fox.food_age += 1;
    if moves.to_prey.is_empty() && fox.food_age >= env.params.fox_starvation_limit {
        // SAFETY: `row` is in our band.
        unsafe { *env.cells.cell_mut(row, col) = CellContent::Empty };
        return;
    }

    if moves.to_prey.is_empty() && moves.to_empty.is_empty() {
        // Boxed in: stay, age, remain counted in this row.
        env.counters.increment(row);
        fox.mark_updated(gen);
        fox.proc_age += 1;
        // SAFETY: `row` is in our band.
        unsafe { *env.cells.cell_mut(row, col) = CellContent::Fox(fox) };
        return;
    }

    let bred = fox.proc_age >= env.params.fox_breeding_age;
    {
        // SAFETY: `row` is in our band.
        let source = unsafe { env.cells.cell_mut(row, col) };
        if bred {
            *source = CellContent::Fox(FoxState::newborn(gen));
            fox.reset_after_breeding(gen);
            env.counters.increment(row);
        } else {
            *source = CellContent::Empty;
        }
    }

    // Prey moves take priority over empty moves.
    let list = if moves.to_prey.is_empty() {
        &moves.to_empty
    } else {
        &moves.to_prey
    };
    let direction = list.select(gen, row, col);
    let (new_row, new_col) = direction.step(row, col);

    if !band.contains(new_row) {
        if !bred {
            fox.mark_updated(gen);
            fox.proc_age += 1;
        }
        conflicts.push(
            new_row < band.start,
            Conflict {
                row: new_row,
                col: new_col,
                payload: ConflictPayload::Fox(fox),
            },
        );
        return;
    }

    // SAFETY: `new_row` is in our band.
    let target = unsafe { env.cells.cell_mut(new_row, new_col) };
    let outcome = resolve_fox_move(fox, target);
    match outcome {
        MoveOutcome::MovedToEmpty | MoveOutcome::WonConflict | MoveOutcome::KilledPrey => {
            if outcome == MoveOutcome::MovedToEmpty {
                env.counters.increment(new_row);
            }
            if let CellContent::Fox(live) = target {
                if !bred {
                    live.mark_updated(gen);
                    live.proc_age += 1;
                }
                if outcome == MoveOutcome::KilledPrey {
                    live.food_age = 0;
                }
            }
        }
        MoveOutcome::Lost | MoveOutcome::Illegal => {}
    }
}

/// Rabbit sub-phase over the snapshot.
pub(crate) fn rabbit_phase(
    env: &PhaseEnv<'_>,
    gen: u32,
    band: Band,
    snapshot: &Snapshot,
    conflicts: &mut ConflictBuffers,
) {
    for row in band.start..=band.end {
        for col in 0..env.params.cols {
            if let CellContent::Rabbit(state) = snapshot.get(row, col) {
                rabbit_turn(env, gen, band, row, col, *state, snapshot, conflicts);
            }
        }
    }
}

/// Fox sub-phase over the (re-captured) snapshot.
pub(crate) fn fox_phase(
    env: &PhaseEnv<'_>,
    gen: u32,
    band: Band,
    snapshot: &Snapshot,
    conflicts: &mut ConflictBuffers,
) {
    for row in band.start..=band.end {
        for col in 0..env.params.cols {
            if let CellContent::Fox(state) = snapshot.get(row, col) {
                fox_turn(env, gen, band, row, col, *state, snapshot, conflicts);
            }
        }
    }
}

/// Apply a neighbor's queued moves against our own band.
pub(crate) fn resolve_conflicts(env: &PhaseEnv<'_>, band: Band, batch: &[Conflict]) {
    for conflict in batch {
        if !band.contains(conflict.row) {
            error!(
                "conflict for row {} lands outside resolver band {}..={}, skipped",
                conflict.row, band.start, band.end
            );
            continue;
        }

        // SAFETY: the destination row was just checked to be in our band.
        let target = unsafe { env.cells.cell_mut(conflict.row, conflict.col) };
        match conflict.payload {
            ConflictPayload::Rabbit(rabbit) => {
                if resolve_rabbit_move(rabbit, target) == MoveOutcome::MovedToEmpty {
                    env.counters.increment(conflict.row);
                }
            }
            ConflictPayload::Fox(fox) => match resolve_fox_move(fox, target) {
                MoveOutcome::MovedToEmpty => env.counters.increment(conflict.row),
                MoveOutcome::KilledPrey => {
                    // The meal lands after the hunger tick already applied
                    // at the source, so zero is the final value.
                    if let CellContent::Fox(live) = target {
                        live.food_age = 0;
                    }
                }
                _ => {}
            },
        }
    }
}

/// Rabbit and fox population of the whole grid.
///
/// # Safety
/// Must run in a window where no worker writes (the caller sits inside
/// its prefix-chain turn, after every earlier worker posted).
unsafe fn species_scan(env: &PhaseEnv<'_>) -> (u32, u32) {
    let mut rabbits = 0;
    let mut foxes = 0;
    for row in 0..env.params.rows {
        for col in 0..env.params.cols {
            match env.cells.cell(row, col) {
                CellContent::Rabbit(_) => rabbits += 1,
                CellContent::Fox(_) => foxes += 1,
                _ => {}
            }
        }
    }
    (rabbits, foxes)
}

/// The full generation loop of one pooled worker.
pub(crate) fn run_worker(
    env: &PhaseEnv<'_>,
    sync: &PoolSync<'_>,
    index: usize,
    mut profiler: Option<&mut GenerationProfiler>,
    mut population_hook: Option<PopulationHook<'_>>,
) {
    let last = sync.workers - 1;

    for gen in 0..env.params.generations {
        if let Some(profiler) = profiler.as_deref_mut() {
            profiler.start_generation();
        }
        sync.barrier.wait();

        let band = sync.plan.get(index);
        let mut snapshot = capture_band_snapshot(env, band);
        sync.barrier.wait();

        // SAFETY: our own buffers; neighbors only read them between the
        // exchange handshake and the following barrier.
        let conflicts = unsafe { sync.exchange.own_buffers(index) };
        conflicts.clear();
        env.counters.zero_rows(band.start, band.end);

        rabbit_phase(env, gen, band, &snapshot, conflicts);
        sync.exchange
            .exchange(index, |batch| resolve_conflicts(env, band, batch));
        sync.barrier.wait();

        snapshot = capture_band_snapshot(env, band);
        sync.barrier.wait();

        // SAFETY: as above.
        let conflicts = unsafe { sync.exchange.own_buffers(index) };
        conflicts.clear();

        fox_phase(env, gen, band, &snapshot, conflicts);
        sync.exchange
            .exchange(index, |batch| resolve_conflicts(env, band, batch));

        update_cumulative_counts(index, sync.workers, band, env.counters, sync.chain, sync.plan);
        if index == last {
            if let Some(hook) = population_hook.as_mut() {
                // SAFETY: inside our chain turn every earlier worker has
                // posted; nobody writes until the generation-end barrier.
                let (rabbits, foxes) = unsafe { species_scan(env) };
                hook(gen, rabbits, foxes);
            }
        }
        sync.barrier.wait();

        if let Some(profiler) = profiler.as_deref_mut() {
            profiler.end_generation();
        }
    }
}

/// Single-threaded run: the same snapshot/phase code over a whole-grid
/// band. With one band no move can cross a boundary, so no conflict is
/// ever emitted and no synchronization exists.
pub(crate) fn run_single(
    env: &PhaseEnv<'_>,
    mut profiler: Option<&mut GenerationProfiler>,
    mut population_hook: Option<PopulationHook<'_>>,
) {
    let band = Band {
        start: 0,
        end: env.params.rows - 1,
    };
    let mut conflicts = ConflictBuffers::with_capacity(env.params.cols);

    for gen in 0..env.params.generations {
        if let Some(profiler) = profiler.as_deref_mut() {
            profiler.start_generation();
        }

        env.counters.zero_rows(band.start, band.end);
        conflicts.clear();

        let snapshot = capture_band_snapshot(env, band);
        rabbit_phase(env, gen, band, &snapshot, &mut conflicts);
        debug_assert!(conflicts.above.is_empty() && conflicts.below.is_empty());

        let snapshot = capture_band_snapshot(env, band);
        fox_phase(env, gen, band, &snapshot, &mut conflicts);
        debug_assert!(conflicts.above.is_empty() && conflicts.below.is_empty());

        let mut running = 0;
        for row in 0..env.params.rows {
            running += env.counters.row(row);
            env.counters.set_cum(row, running);
        }

        if let Some(hook) = population_hook.as_mut() {
            // SAFETY: single-threaded, nobody else touches the grid.
            let (rabbits, foxes) = unsafe { species_scan(env) };
            hook(gen, rabbits, foxes);
        }

        if let Some(profiler) = profiler.as_deref_mut() {
            profiler.end_generation();
        }
    }
}
