//! Row-band partitioning.
//!
//! Rows are split into contiguous bands whose live-entity counts are as
//! close as possible to `total / workers`, using the cumulative per-row
//! counts. The split is recomputed by the last worker at the end of every
//! generation, after the prefix sums are refreshed under the serialized
//! chain.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::world::RowCounters;

use super::sync::Semaphore;

/// A contiguous, inclusive row range assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start: usize,
    pub end: usize,
}

impl Band {
    #[inline(always)]
    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row <= self.end
    }
}

/// Split rows into `workers` bands balanced by cumulative entity count.
///
/// For each band but the last, the end row is the largest row whose
/// cumulative count does not exceed `(t + 1) * total / workers`, clamped
/// so every subsequent band keeps at least one row; the last band absorbs
/// the rest. Pure in its inputs, so re-running it with unchanged counts
/// reproduces the same bands.
pub fn distribute(cum: &[u32], workers: usize) -> Vec<Band> {
    debug_assert!(workers >= 1 && workers <= cum.len());

    let last_row = cum.len() - 1;
    let total = cum.last().copied().unwrap_or(0) as u64;
    let mut bands = Vec::with_capacity(workers);
    let mut next_start = 0;

    for t in 0..workers {
        let start = next_start;
        let end = if t == workers - 1 {
            last_row
        } else {
            let remaining = workers - t - 1;
            let target = (t as u64 + 1) * total / workers as u64;
            // Largest row whose cumulative count stays within the target.
            let by_count = cum
                .partition_point(|&count| count as u64 <= target)
                .saturating_sub(1);
            // Leave at least one row for every band after this one.
            by_count.min(last_row - remaining).max(start)
        };
        bands.push(Band { start, end });
        next_start = end + 1;
    }

    bands
}

/// The current band assignment, readable by every worker. Slots are only
/// rewritten by the last worker inside its prefix-chain turn, and the
/// generation-end barrier orders that write before the next reads.
pub(crate) struct BandPlan {
    slots: Vec<(AtomicUsize, AtomicUsize)>,
}

impl BandPlan {
    pub(crate) fn new(bands: &[Band]) -> Self {
        Self {
            slots: bands
                .iter()
                .map(|band| (AtomicUsize::new(band.start), AtomicUsize::new(band.end)))
                .collect(),
        }
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Band {
        let (start, end) = &self.slots[index];
        Band {
            start: start.load(Ordering::Relaxed),
            end: end.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn store(&self, bands: &[Band]) {
        debug_assert_eq!(bands.len(), self.slots.len());
        for (slot, band) in self.slots.iter().zip(bands) {
            slot.0.store(band.start, Ordering::Relaxed);
            slot.1.store(band.end, Ordering::Relaxed);
        }
    }
}

/// Fold this worker's per-row counts into the running prefix sums, then
/// hand the chain to the next worker. The last worker, holding the
/// complete sums, recomputes the band plan for the next generation.
pub(crate) fn update_cumulative_counts(
    worker: usize,
    workers: usize,
    band: Band,
    counters: &RowCounters,
    chain: &[Semaphore],
    plan: &BandPlan,
) {
    if worker > 0 {
        chain[worker - 1].acquire();
    }

    for row in band.start..=band.end {
        let prev = if row > 0 { counters.cum(row - 1) } else { 0 };
        counters.set_cum(row, prev + counters.row(row));
    }

    if worker == workers - 1 {
        plan.store(&distribute(&counters.cum_snapshot(), workers));
    } else {
        chain[worker].post();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split_on_uniform_counts() {
        // One entity per row, 8 rows, 4 workers: two rows each.
        let cum: Vec<u32> = (1..=8).collect();
        let bands = distribute(&cum, 4);
        assert_eq!(
            bands,
            vec![
                Band { start: 0, end: 1 },
                Band { start: 2, end: 3 },
                Band { start: 4, end: 5 },
                Band { start: 6, end: 7 },
            ]
        );
    }

    #[test]
    fn test_skewed_counts_shrink_the_heavy_band() {
        // All entities in row 0: the first band takes the single heavy
        // row, the last band absorbs the empty remainder.
        let cum = vec![30, 30, 30, 30];
        let bands = distribute(&cum, 3);
        assert_eq!(bands[0], Band { start: 0, end: 0 });
        assert_eq!(bands[1], Band { start: 1, end: 1 });
        assert_eq!(bands[2], Band { start: 2, end: 3 });
    }

    #[test]
    fn test_one_worker_takes_everything() {
        let cum = vec![0, 2, 2, 5];
        assert_eq!(distribute(&cum, 1), vec![Band { start: 0, end: 3 }]);
    }

    #[test]
    fn test_worker_per_row_degenerates_to_single_rows() {
        let cum = vec![1, 1, 4];
        let bands = distribute(&cum, 3);
        assert_eq!(
            bands,
            vec![
                Band { start: 0, end: 0 },
                Band { start: 1, end: 1 },
                Band { start: 2, end: 2 },
            ]
        );
    }

    #[test]
    fn test_empty_grid_still_covers_all_rows() {
        let cum = vec![0; 6];
        let bands = distribute(&cum, 2);
        assert_eq!(bands[0].start, 0);
        assert_eq!(bands[1].end, 5);
        assert_eq!(bands[0].end + 1, bands[1].start);
    }

    #[test]
    fn test_repartition_is_idempotent() {
        let cum = vec![3, 3, 9, 10, 14, 14, 20, 21];
        let first = distribute(&cum, 3);
        let second = distribute(&cum, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bands_are_contiguous_and_exhaustive() {
        let cum = vec![0, 1, 1, 2, 8, 8, 8, 9, 12, 13];
        for workers in 1..=cum.len() {
            let bands = distribute(&cum, workers);
            assert_eq!(bands.len(), workers);
            assert_eq!(bands[0].start, 0);
            assert_eq!(bands[workers - 1].end, cum.len() - 1);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].end + 1, pair[1].start);
                assert!(pair[0].end >= pair[0].start);
            }
        }
    }
}
