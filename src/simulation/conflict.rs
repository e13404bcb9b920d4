//! Cross-band move handoff.
//!
//! A worker whose selected destination falls outside its band cannot
//! touch the destination cell. It clears (or re-seeds) the source,
//! moves the agent record into a conflict, and queues it toward the
//! neighbor that owns the destination row. After each sub-phase the
//! neighbors exchange buffers pairwise and the owning worker replays the
//! move against its own live cells.

use std::cell::UnsafeCell;

use crate::entities::{FoxState, RabbitState};

use super::sync::Semaphore;

/// The agent record a pending cross-band move carries. The record was
/// moved out of its source cell when the conflict was enqueued, so the
/// conflict owns it until resolution.
#[derive(Debug, Clone, Copy)]
pub enum ConflictPayload {
    Rabbit(RabbitState),
    Fox(FoxState),
}

/// A move waiting to be applied by the worker owning the destination row.
#[derive(Debug, Clone, Copy)]
pub struct Conflict {
    pub row: usize,
    pub col: usize,
    pub payload: ConflictPayload,
}

/// One worker's pending cross-band moves, split by which neighbor owns
/// the destination.
pub struct ConflictBuffers {
    /// Destinations above the band (owned by worker `i - 1`).
    pub above: Vec<Conflict>,
    /// Destinations below the band (owned by worker `i + 1`).
    pub below: Vec<Conflict>,
}

impl ConflictBuffers {
    /// A band boundary row can emit at most one conflict per column.
    pub fn with_capacity(cols: usize) -> Self {
        Self {
            above: Vec::with_capacity(cols),
            below: Vec::with_capacity(cols),
        }
    }

    pub fn clear(&mut self) {
        self.above.clear();
        self.below.clear();
    }

    /// Queue a move toward the neighbor owning `row`.
    pub fn push(&mut self, toward_above: bool, conflict: Conflict) {
        if toward_above {
            self.above.push(conflict);
        } else {
            self.below.push(conflict);
        }
    }
}

/// The pairwise exchange: per-worker buffers plus the per-worker
/// completion semaphores. A worker posts its own semaphore once per
/// neighbor when its sub-phase (and therefore its buffers) are final;
/// consumers drain whichever neighbor signals first.
pub(crate) struct ConflictExchange {
    buffers: Vec<UnsafeCell<ConflictBuffers>>,
    semaphores: Vec<Semaphore>,
    workers: usize,
}

// SAFETY: a worker's buffers are mutated only by that worker during its
// sub-phase; neighbors read them only after acquiring the owner's
// semaphore, which the owner posts after its last write. Owners clear
// buffers only after the following barrier, when all readers are done.
unsafe impl Sync for ConflictExchange {}

impl ConflictExchange {
    pub(crate) fn new(workers: usize, cols: usize) -> Self {
        Self {
            buffers: (0..workers)
                .map(|_| UnsafeCell::new(ConflictBuffers::with_capacity(cols)))
                .collect(),
            semaphores: (0..workers).map(|_| Semaphore::new()).collect(),
            workers,
        }
    }

    /// This worker's own buffers, for enqueuing and clearing.
    ///
    /// # Safety
    /// Only callable by worker `index`, and only while no neighbor holds
    /// the read handshake (during a sub-phase or right after a barrier).
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn own_buffers(&self, index: usize) -> &mut ConflictBuffers {
        &mut *self.buffers[index].get()
    }

    /// Announce this worker's buffers as final and resolve the conflicts
    /// its neighbors queued toward it. `resolve` receives each neighbor's
    /// batch exactly once; either neighbor may be serviced first.
    pub(crate) fn exchange(&self, index: usize, mut resolve: impl FnMut(&[Conflict])) {
        if self.workers < 2 {
            return;
        }

        let last = self.workers - 1;
        let own = &self.semaphores[index];

        // Post once per neighbor so both can proceed past our buffers.
        own.post();
        if index > 0 && index < last {
            own.post();
        }

        if index == 0 {
            self.semaphores[1].acquire();
            // SAFETY: the acquire ordered us after the neighbor's final write.
            resolve(unsafe { &(*self.buffers[1].get()).above });
        } else if index == last {
            self.semaphores[last - 1].acquire();
            resolve(unsafe { &(*self.buffers[last - 1].get()).below });
        } else {
            // Interior worker: drain whichever neighbor is ready first.
            let mut above_done = false;
            let mut below_done = false;
            while !(above_done && below_done) {
                if !above_done && self.semaphores[index - 1].try_acquire() {
                    resolve(unsafe { &(*self.buffers[index - 1].get()).below });
                    above_done = true;
                }
                if !below_done && self.semaphores[index + 1].try_acquire() {
                    resolve(unsafe { &(*self.buffers[index + 1].get()).above });
                    below_done = true;
                }
                std::hint::spin_loop();
            }
        }
    }
}
