//! Counting semaphore built on `Mutex` + `Condvar`.
//!
//! The engine blocks in exactly three places: the shared barrier, the
//! per-worker conflict semaphore, and the per-worker preceding semaphore
//! that serializes the prefix-sum chain. This type backs the latter two.

use std::sync::{Condvar, Mutex, PoisonError};

pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    pub fn new() -> Self {
        Self {
            permits: Mutex::new(0),
            available: Condvar::new(),
        }
    }

    /// Release one permit, waking one waiter.
    pub fn post(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        *permits += 1;
        drop(permits);
        self.available.notify_one();
    }

    /// Block until a permit is available, then take it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
    }

    /// Take a permit if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        if *permits > 0 {
            *permits -= 1;
            true
        } else {
            false
        }
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_try_acquire_respects_count() {
        let sem = Semaphore::new();
        assert!(!sem.try_acquire());
        sem.post();
        sem.post();
        assert!(sem.try_acquire());
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
    }

    #[test]
    fn test_acquire_blocks_until_posted() {
        let sem = Arc::new(Semaphore::new());
        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || {
                sem.acquire();
                sem.acquire();
            })
        };
        sem.post();
        sem.post();
        waiter.join().expect("waiter thread panicked");
    }
}
