//! Directions, cached reachability, and the neighborhood analyzer
//!
//! Every agent moves on the 4-neighborhood (no diagonals) in the fixed
//! order north, east, south, west. Each coordinate caches the in-bounds,
//! non-rock directions once at load; rocks never move, so the cache is
//! valid for the lifetime of a run.

use crate::world::{CellContent, Snapshot};

/// A cardinal direction on the grid. Order is significant: the analyzer
/// emits candidates in `ALL` order and the selection rule indexes into
/// that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in analyzer order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Row/column delta for this direction.
    #[inline(always)]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }

    /// Destination of a step from `(row, col)`, or `None` when it would
    /// leave an `rows x cols` grid.
    #[inline]
    pub fn try_step(
        self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> Option<(usize, usize)> {
        let (dr, dc) = self.offset();
        let new_row = row.checked_add_signed(dr)?;
        let new_col = col.checked_add_signed(dc)?;
        if new_row < rows && new_col < cols {
            Some((new_row, new_col))
        } else {
            None
        }
    }

    /// Destination of a step known to stay in bounds (the caller went
    /// through the reachability cache).
    #[inline(always)]
    pub fn step(self, row: usize, col: usize) -> (usize, usize) {
        let (dr, dc) = self.offset();
        (
            row.wrapping_add_signed(dr),
            col.wrapping_add_signed(dc),
        )
    }
}

/// A small ordered set of candidate directions. Fits on the stack; the
/// analyzer reuses the type both for the per-cell reachability cache and
/// for the per-turn candidate lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveSet {
    dirs: [Direction; 4],
    len: u8,
}

impl MoveSet {
    pub fn new() -> Self {
        Self {
            dirs: [Direction::North; 4],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, dir: Direction) {
        self.dirs[self.len as usize] = dir;
        self.len += 1;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Direction] {
        &self.dirs[..self.len as usize]
    }

    /// Deterministic movement selection: index `(gen + row + col) mod len`
    /// into the candidate list. This rule is the entire determinism
    /// contract of the simulation; identical inputs reproduce bit-identical
    /// boards regardless of thread count.
    #[inline]
    pub fn select(&self, gen: u32, row: usize, col: usize) -> Direction {
        debug_assert!(self.len > 0);
        let index = (gen as usize + row + col) % self.len as usize;
        self.dirs[index]
    }
}

/// Build the reachability cache entry for `(row, col)`: in-bounds
/// neighbors that are not rocks, in `Direction::ALL` order.
pub fn reachable_directions(
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
    is_rock: impl Fn(usize, usize) -> bool,
) -> MoveSet {
    let mut set = MoveSet::new();
    for dir in Direction::ALL {
        if let Some((nr, nc)) = dir.try_step(row, col, rows, cols) {
            if !is_rock(nr, nc) {
                set.push(dir);
            }
        }
    }
    set
}

/// Candidate moves for a fox, partitioned by destination content. Prey
/// moves take priority over empty moves when selecting.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoxMoves {
    pub to_prey: MoveSet,
    pub to_empty: MoveSet,
}

/// Legal moves for a rabbit at `(row, col)` against a snapshot: cached
/// directions whose destination is empty. Anything occupied (rabbit, fox)
/// is excluded entirely.
pub fn analyze_rabbit_moves(
    snapshot: &Snapshot,
    reachable: &MoveSet,
    row: usize,
    col: usize,
) -> MoveSet {
    let mut to_empty = MoveSet::new();
    for &dir in reachable.as_slice() {
        let (nr, nc) = dir.step(row, col);
        if matches!(snapshot.get(nr, nc), CellContent::Empty) {
            to_empty.push(dir);
        }
    }
    to_empty
}

/// Legal moves for a fox at `(row, col)` against a snapshot: prey
/// destinations and empty destinations, disjoint. Same-species cells are
/// excluded; rocks never appear thanks to the reachability cache.
pub fn analyze_fox_moves(
    snapshot: &Snapshot,
    reachable: &MoveSet,
    row: usize,
    col: usize,
) -> FoxMoves {
    let mut moves = FoxMoves::default();
    for &dir in reachable.as_slice() {
        let (nr, nc) = dir.step(row, col);
        match snapshot.get(nr, nc) {
            CellContent::Rabbit(_) => moves.to_prey.push(dir),
            CellContent::Empty => moves.to_empty.push(dir),
            CellContent::Fox(_) | CellContent::Rock => {}
        }
    }
    moves
}
