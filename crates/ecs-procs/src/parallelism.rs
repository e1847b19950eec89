//! The process-wide parallelism setting.
//!
//! Rust has no runtime-global scheduler knob, so the crate keeps one: a value
//! the embedding application reads when sizing its runtime or thread pools
//! (see [`runtime::multi_thread`](crate::runtime::multi_thread)).

use std::num::NonZeroUsize;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::OVERRIDE_ENV;

/// Read and write access to a parallelism setting.
pub trait Parallelism: Send + Sync {
    fn get(&self) -> NonZeroUsize;
    fn set(&self, n: NonZeroUsize);
}

/// In-memory parallelism value.
#[derive(Debug)]
pub struct AtomicParallelism(AtomicUsize);

impl AtomicParallelism {
    pub fn new(n: NonZeroUsize) -> Self {
        Self(AtomicUsize::new(n.get()))
    }
}

impl Parallelism for AtomicParallelism {
    fn get(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.0.load(Ordering::Acquire)).unwrap_or(NonZeroUsize::MIN)
    }

    fn set(&self, n: NonZeroUsize) {
        self.0.store(n.get(), Ordering::Release);
    }
}

static PROCESS: LazyLock<AtomicParallelism> =
    LazyLock::new(|| AtomicParallelism::new(initial_parallelism()));

/// Starts from the operator override if it parses, else the host's
/// available parallelism.
fn initial_parallelism() -> NonZeroUsize {
    std::env::var(OVERRIDE_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<NonZeroUsize>().ok())
        .or_else(|| std::thread::available_parallelism().ok())
        .unwrap_or(NonZeroUsize::MIN)
}

/// The process-wide setting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessParallelism;

impl Parallelism for ProcessParallelism {
    fn get(&self) -> NonZeroUsize {
        PROCESS.get()
    }

    fn set(&self, n: NonZeroUsize) {
        PROCESS.set(n);
    }
}

/// Current process-wide parallelism.
pub fn current() -> NonZeroUsize {
    ProcessParallelism.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn atomic_round_trips_value() {
        let p = AtomicParallelism::new(nz(8));
        assert_eq!(p.get().get(), 8);
        p.set(nz(2));
        assert_eq!(p.get().get(), 2);
    }

    #[test]
    fn process_value_is_shared() {
        let _serial = testing::serial();
        let before = current();
        ProcessParallelism.set(nz(3));
        assert_eq!(current().get(), 3);
        ProcessParallelism.set(before);
        assert_eq!(current(), before);
    }
}
