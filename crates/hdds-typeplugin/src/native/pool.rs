// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scratch sample pool.
//!
//! Each serialize / deserialize call borrows one [`NativeSample`] and gives
//! it back through the [`ScratchSample`] guard, so the sample is released
//! exactly once on every exit path, including errors and panics.
//!
//! # Performance
//!
//! - acquire: one uncontended mutex lock + `Vec::pop`
//! - release: reset to the template (arena blocks are kept for reuse)

use super::NativeSample;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters exposed for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub acquired: u64,
    pub released: u64,
    /// Samples currently parked in the pool.
    pub pooled: usize,
}

impl PoolStats {
    /// Samples handed out and not yet returned.
    pub fn outstanding(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

/// Bounded free list of samples sharing one default template.
#[derive(Debug)]
pub struct SamplePool {
    template: Arc<[u8]>,
    free: Mutex<Vec<NativeSample>>,
    capacity: usize,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl SamplePool {
    pub fn new(template: Arc<[u8]>, capacity: usize) -> Self {
        Self {
            template,
            free: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Borrow a default-initialised sample.
    pub fn acquire(&self) -> ScratchSample<'_> {
        self.acquired.fetch_add(1, Ordering::Relaxed);
        let sample = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| NativeSample::new(&self.template));
        ScratchSample {
            pool: self,
            sample,
        }
    }

    fn release(&self, mut sample: NativeSample) {
        self.released.fetch_add(1, Ordering::Relaxed);
        sample.reset(&self.template);
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(sample);
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            pooled: self.free.lock().len(),
        }
    }
}

/// A sample on loan from a [`SamplePool`]; returned on drop.
#[derive(Debug)]
pub struct ScratchSample<'p> {
    pool: &'p SamplePool,
    sample: NativeSample,
}

impl Deref for ScratchSample<'_> {
    type Target = NativeSample;

    fn deref(&self) -> &NativeSample {
        &self.sample
    }
}

impl DerefMut for ScratchSample<'_> {
    fn deref_mut(&mut self) -> &mut NativeSample {
        &mut self.sample
    }
}

impl Drop for ScratchSample<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.sample));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::Place;

    fn pool(capacity: usize) -> SamplePool {
        SamplePool::new(Arc::from(vec![5u8; 8]), capacity)
    }

    #[test]
    fn test_acquire_release_counts() {
        let pool = pool(2);
        {
            let a = pool.acquire();
            let _b = pool.acquire();
            assert_eq!(a.root_bytes(), &[5u8; 8]);
            assert_eq!(pool.stats().outstanding(), 2);
        }
        let stats = pool.stats();
        assert_eq!(stats.acquired, 2);
        assert_eq!(stats.released, 2);
        assert_eq!(stats.pooled, 2);
    }

    #[test]
    fn test_released_sample_is_reset() {
        let pool = pool(1);
        {
            let mut s = pool.acquire();
            s.bytes_mut(Place::ROOT, 1).expect("root")[0] = 0xAA;
            let _ = s.allocate(32);
        }
        let s = pool.acquire();
        assert_eq!(s.root_bytes(), &[5u8; 8]);
        assert_eq!(s.arena_blocks(), 0);
    }

    #[test]
    fn test_capacity_is_bounded() {
        let pool = pool(1);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            let _c = pool.acquire();
        }
        assert_eq!(pool.stats().pooled, 1);
        assert_eq!(pool.stats().outstanding(), 0);
    }

    #[test]
    fn test_release_on_unwind() {
        let pool = pool(4);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _s = pool.acquire();
            panic!("conversion blew up");
        }));
        assert!(result.is_err());
        assert_eq!(pool.stats().outstanding(), 0);
    }
}
