//! World grid: packed row-major cell storage, the per-cell reachability
//! cache, and the per-row entity counters the partitioner feeds on.

mod shared;

pub(crate) use shared::SharedCells;

use std::sync::atomic::{AtomicU32, Ordering};

use crate::entities::{FoxState, RabbitState};
use crate::movement::{reachable_directions, MoveSet};

/// Row-major projection of `(row, col)` into the packed cell array.
#[inline(always)]
pub const fn project(cols: usize, row: usize, col: usize) -> usize {
    row * cols + col
}

/// Contents of one grid cell. The agent record is owned by the cell;
/// moving an agent moves the record out of the source and into the
/// destination (or into a pending conflict record for cross-band moves),
/// so destruction happens exactly once by ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellContent {
    #[default]
    Empty,
    Rock,
    Rabbit(RabbitState),
    Fox(FoxState),
}

impl CellContent {
    /// Listing name for populated cells, `None` for empty ones.
    pub fn kind_name(&self) -> Option<&'static str> {
        match self {
            CellContent::Empty => None,
            CellContent::Rock => Some("ROCK"),
            CellContent::Rabbit(_) => Some("RABBIT"),
            CellContent::Fox(_) => Some("FOX"),
        }
    }

    /// True for rabbits and foxes (the cells the load balancer counts).
    #[inline(always)]
    pub fn is_creature(&self) -> bool {
        matches!(self, CellContent::Rabbit(_) | CellContent::Fox(_))
    }
}

/// The simulation grid.
#[derive(Debug)]
pub struct World {
    rows: usize,
    cols: usize,
    cells: Vec<CellContent>,
    /// In-bounds, non-rock directions per coordinate. Computed once by
    /// `freeze_reachability` after loading and never mutated afterwards.
    reachable: Vec<MoveSet>,
    rocks: usize,
}

impl World {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![CellContent::Empty; rows * cols],
            reachable: vec![MoveSet::new(); rows * cols],
            rocks: 0,
        }
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &CellContent {
        &self.cells[project(self.cols, row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, content: CellContent) {
        let slot = &mut self.cells[project(self.cols, row, col)];
        if matches!(slot, CellContent::Rock) {
            self.rocks -= 1;
        }
        if matches!(content, CellContent::Rock) {
            self.rocks += 1;
        }
        *slot = content;
    }

    pub fn cells(&self) -> &[CellContent] {
        &self.cells
    }

    /// Number of rock cells currently placed.
    pub fn rock_count(&self) -> usize {
        self.rocks
    }

    /// Cached legal directions for a coordinate.
    #[inline]
    pub fn reachable(&self, row: usize, col: usize) -> &MoveSet {
        &self.reachable[project(self.cols, row, col)]
    }

    /// Compute the reachability cache. Must run after every rock is
    /// placed; rocks are static obstacles so the cache stays valid for
    /// the whole run.
    pub fn freeze_reachability(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let set = reachable_directions(row, col, self.rows, self.cols, |r, c| {
                    matches!(self.cells[project(self.cols, r, c)], CellContent::Rock)
                });
                self.reachable[project(self.cols, row, col)] = set;
            }
        }
    }

    /// All populated cells in row-major order.
    pub fn iter_populated(&self) -> impl Iterator<Item = (usize, usize, &CellContent)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, content)| !matches!(content, CellContent::Empty))
            .map(move |(index, content)| (index / self.cols, index % self.cols, content))
    }

    /// Count of non-empty cells (rocks included), the output header total.
    pub fn populated_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|content| !matches!(content, CellContent::Empty))
            .count()
    }

    /// Count of live creatures (rocks excluded).
    pub fn creature_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_creature()).count()
    }

    /// Live creatures in one row.
    pub fn row_creature_count(&self, row: usize) -> u32 {
        let start = project(self.cols, row, 0);
        self.cells[start..start + self.cols]
            .iter()
            .filter(|c| c.is_creature())
            .count() as u32
    }

    /// Rabbit and fox population, in that order.
    pub fn species_counts(&self) -> (u32, u32) {
        let mut rabbits = 0;
        let mut foxes = 0;
        for content in &self.cells {
            match content {
                CellContent::Rabbit(_) => rabbits += 1,
                CellContent::Fox(_) => foxes += 1,
                _ => {}
            }
        }
        (rabbits, foxes)
    }

    /// Split the world into the shared cell view workers write through
    /// and the immutable reachability cache they read.
    pub(crate) fn split_for_run(&mut self) -> (SharedCells<'_>, &[MoveSet]) {
        let cols = self.cols;
        let cells = shared::as_shared_slice(&mut self.cells);
        (SharedCells::new(cells, cols), &self.reachable)
    }
}

/// Immutable copy of a contiguous row range, read during a sub-phase
/// while the live grid is being mutated. Indexed by absolute row.
pub struct Snapshot {
    cells: Vec<CellContent>,
    base_row: usize,
    cols: usize,
}

impl Snapshot {
    pub(crate) fn from_parts(cells: Vec<CellContent>, base_row: usize, cols: usize) -> Self {
        Self {
            cells,
            base_row,
            cols,
        }
    }

    /// Copy rows `first_row..=last_row` out of a plain cell slice.
    pub fn capture_range(
        cells: &[CellContent],
        cols: usize,
        first_row: usize,
        last_row: usize,
    ) -> Self {
        let start = project(cols, first_row, 0);
        let end = project(cols, last_row + 1, 0);
        Self::from_parts(cells[start..end].to_vec(), first_row, cols)
    }

    /// Cell at absolute coordinates. The row must fall inside the
    /// captured range.
    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> &CellContent {
        &self.cells[project(self.cols, row - self.base_row, col)]
    }
}

/// Per-row entity counters shared by the workers.
///
/// `per_row[r]` counts the live creatures of row `r` as the current
/// generation places them; `cum[r]` is the prefix sum refreshed at
/// generation end and consumed by the band partitioner. Every slot is
/// written only by the worker owning that row (or under the serialized
/// prefix chain), so relaxed atomics suffice; the barriers and semaphores
/// provide the cross-thread ordering.
pub struct RowCounters {
    per_row: Vec<AtomicU32>,
    cum: Vec<AtomicU32>,
}

impl RowCounters {
    pub fn new(rows: usize) -> Self {
        Self {
            per_row: (0..rows).map(|_| AtomicU32::new(0)).collect(),
            cum: (0..rows).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Recount every row from the world and rebuild the prefix sums.
    /// Used at load time, before the first partition.
    pub fn rebuild_from(&self, world: &World) {
        let mut running = 0;
        for row in 0..world.rows() {
            let count = world.row_creature_count(row);
            self.per_row[row].store(count, Ordering::Relaxed);
            running += count;
            self.cum[row].store(running, Ordering::Relaxed);
        }
    }

    pub fn rows(&self) -> usize {
        self.per_row.len()
    }

    pub fn zero_rows(&self, first_row: usize, last_row: usize) {
        for row in first_row..=last_row {
            self.per_row[row].store(0, Ordering::Relaxed);
        }
    }

    #[inline(always)]
    pub fn increment(&self, row: usize) {
        self.per_row[row].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn row(&self, row: usize) -> u32 {
        self.per_row[row].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn cum(&self, row: usize) -> u32 {
        self.cum[row].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_cum(&self, row: usize, value: u32) {
        self.cum[row].store(value, Ordering::Relaxed);
    }

    /// Total live creatures according to the prefix sums.
    pub fn total(&self) -> u32 {
        match self.cum.last() {
            Some(last) => last.load(Ordering::Relaxed),
            None => 0,
        }
    }

    /// Sum over `per_row`, used by the invariant checks in tests.
    pub fn per_row_total(&self) -> u32 {
        self.per_row
            .iter()
            .map(|count| count.load(Ordering::Relaxed))
            .sum()
    }

    pub fn cum_snapshot(&self) -> Vec<u32> {
        self.cum
            .iter()
            .map(|count| count.load(Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_is_row_major() {
        assert_eq!(project(5, 0, 0), 0);
        assert_eq!(project(5, 0, 4), 4);
        assert_eq!(project(5, 2, 3), 13);
    }

    #[test]
    fn test_rock_count_tracks_set() {
        let mut world = World::new(2, 2);
        world.set(0, 0, CellContent::Rock);
        world.set(1, 1, CellContent::Rock);
        assert_eq!(world.rock_count(), 2);
        world.set(0, 0, CellContent::Empty);
        assert_eq!(world.rock_count(), 1);
    }

    #[test]
    fn test_iter_populated_is_row_major() {
        let mut world = World::new(2, 3);
        world.set(1, 0, CellContent::Rock);
        world.set(0, 2, CellContent::Rabbit(RabbitState::newborn(0)));
        let coords: Vec<(usize, usize)> = world
            .iter_populated()
            .map(|(row, col, _)| (row, col))
            .collect();
        assert_eq!(coords, vec![(0, 2), (1, 0)]);
    }

    #[test]
    fn test_counters_rebuild_and_totals() {
        let mut world = World::new(3, 3);
        world.set(0, 0, CellContent::Rabbit(RabbitState::newborn(0)));
        world.set(0, 1, CellContent::Fox(FoxState::newborn(0)));
        world.set(2, 2, CellContent::Rabbit(RabbitState::newborn(0)));
        world.set(1, 1, CellContent::Rock);

        let counters = RowCounters::new(3);
        counters.rebuild_from(&world);
        assert_eq!(counters.row(0), 2);
        assert_eq!(counters.row(1), 0);
        assert_eq!(counters.row(2), 1);
        assert_eq!(counters.cum_snapshot(), vec![2, 2, 3]);
        assert_eq!(counters.total(), 3);
        assert_eq!(counters.per_row_total(), world.creature_count() as u32);
    }

    #[test]
    fn test_snapshot_indexes_by_absolute_row() {
        let mut world = World::new(3, 2);
        world.set(2, 1, CellContent::Rock);
        let snap = Snapshot::capture_range(world.cells(), 2, 1, 2);
        assert_eq!(*snap.get(2, 1), CellContent::Rock);
        assert_eq!(*snap.get(1, 0), CellContent::Empty);
    }
}
