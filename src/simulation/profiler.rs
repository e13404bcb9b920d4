//! Generation timing.
//!
//! Tracks how long each generation takes so the end-of-run report can
//! show average/min/max tick cost. Owned by worker 0, which brackets its
//! generation loop with `start_generation`/`end_generation`.

use std::time::{Duration, Instant};

/// Aggregate timing data over all generations of a run.
#[derive(Debug, Clone)]
pub struct GenerationTiming {
    pub total_duration: Duration,
    pub sample_count: u64,
    pub last_duration: Duration,
    pub max_duration: Duration,
    pub min_duration: Duration,
}

impl GenerationTiming {
    pub fn new() -> Self {
        Self {
            total_duration: Duration::ZERO,
            sample_count: 0,
            last_duration: Duration::ZERO,
            max_duration: Duration::ZERO,
            min_duration: Duration::MAX,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.total_duration += duration;
        self.last_duration = duration;
        self.sample_count += 1;
        self.max_duration = self.max_duration.max(duration);
        self.min_duration = self.min_duration.min(duration);
    }

    pub fn average_duration(&self) -> Duration {
        if self.sample_count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.sample_count as u32
        }
    }
}

impl Default for GenerationTiming {
    fn default() -> Self {
        Self::new()
    }
}

/// Start/stop wrapper around `GenerationTiming`.
#[derive(Debug, Default)]
pub struct GenerationProfiler {
    timing: GenerationTiming,
    current_start: Option<Instant>,
}

impl GenerationProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_generation(&mut self) {
        self.current_start = Some(Instant::now());
    }

    pub fn end_generation(&mut self) {
        if let Some(start) = self.current_start.take() {
            self.timing.record(start.elapsed());
        }
    }

    pub fn timing(&self) -> &GenerationTiming {
        &self.timing
    }

    pub fn into_timing(self) -> GenerationTiming {
        self.timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_extremes() {
        let mut timing = GenerationTiming::new();
        timing.record(Duration::from_millis(4));
        timing.record(Duration::from_millis(2));
        timing.record(Duration::from_millis(6));
        assert_eq!(timing.sample_count, 3);
        assert_eq!(timing.min_duration, Duration::from_millis(2));
        assert_eq!(timing.max_duration, Duration::from_millis(6));
        assert_eq!(timing.average_duration(), Duration::from_millis(4));
        assert_eq!(timing.last_duration, Duration::from_millis(6));
    }

    #[test]
    fn test_profiler_requires_start() {
        let mut profiler = GenerationProfiler::new();
        profiler.end_generation();
        assert_eq!(profiler.timing().sample_count, 0);

        profiler.start_generation();
        profiler.end_generation();
        assert_eq!(profiler.timing().sample_count, 1);
    }
}
