//! Shared cell access for the worker pool.
//!
//! The live grid is written concurrently by all workers, but the write
//! pattern is strictly disciplined: a worker only mutates cells in rows
//! it owns for the current step (its band during a sub-phase, its band
//! again while resolving neighbors' conflicts), and cross-row reads only
//! happen in the snapshot windows between barriers, when nobody writes.
//! `SharedCells` encodes that discipline as an unsafe contract instead of
//! taking a lock per cell, which would serialize the bands and break the
//! three-named-synchronization-points design.

use std::cell::UnsafeCell;

use super::{project, CellContent, Snapshot};

/// Reinterpret the live cell storage as a slice of `UnsafeCell`s.
/// Sound because `UnsafeCell<T>` has the same memory layout as `T` and
/// the returned view borrows the storage for its whole lifetime.
pub(crate) fn as_shared_slice(cells: &mut [CellContent]) -> &[UnsafeCell<CellContent>] {
    let len = cells.len();
    let ptr = cells.as_mut_ptr().cast::<UnsafeCell<CellContent>>();
    unsafe { std::slice::from_raw_parts(ptr, len) }
}

/// A view of the live grid that workers write through.
#[derive(Clone, Copy)]
pub(crate) struct SharedCells<'w> {
    cells: &'w [UnsafeCell<CellContent>],
    cols: usize,
}

// SAFETY: all mutation goes through the band-ownership contract described
// in the module docs; two workers never touch the same row in the same
// step, and the barrier/semaphore protocol orders the handoffs.
unsafe impl Send for SharedCells<'_> {}
unsafe impl Sync for SharedCells<'_> {}

impl<'w> SharedCells<'w> {
    pub(crate) fn new(cells: &'w [UnsafeCell<CellContent>], cols: usize) -> Self {
        Self { cells, cols }
    }

    /// Read a cell.
    ///
    /// # Safety
    /// The row must be owned by the caller for the current step, or the
    /// call must happen in a window where no worker writes (between the
    /// snapshot barriers, or under the prefix-sum chain).
    #[inline(always)]
    pub(crate) unsafe fn cell(&self, row: usize, col: usize) -> &CellContent {
        &*self.cells[project(self.cols, row, col)].get()
    }

    /// Mutably borrow a cell.
    ///
    /// # Safety
    /// The caller must own the row for the current step: it lies in the
    /// caller's band during a sub-phase, or the write is a conflict
    /// resolution targeting the caller's own band.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn cell_mut(&self, row: usize, col: usize) -> &mut CellContent {
        &mut *self.cells[project(self.cols, row, col)].get()
    }

    /// Copy rows `first_row..=last_row` into a private snapshot.
    ///
    /// # Safety
    /// Must only run in a window where no worker writes any of the copied
    /// rows; the engine brackets snapshotting with barriers.
    pub(crate) unsafe fn snapshot(&self, first_row: usize, last_row: usize) -> Snapshot {
        let start = project(self.cols, first_row, 0);
        let len = (last_row - first_row + 1) * self.cols;
        let src = std::slice::from_raw_parts(self.cells.as_ptr().add(start).cast::<CellContent>(), len);
        Snapshot::from_parts(src.to_vec(), first_row, self.cols)
    }
}
