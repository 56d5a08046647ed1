//! Worker pool scheduling
//!
//! Splits a path count across a fixed number of workers. Each worker owns a
//! ChaCha8 stream seeded from the run's base seed and its worker index, so the
//! output depends only on the seed, the worker count and the generator.
//! Results are collected worker-major: all of worker 0's paths, then worker
//! 1's, and so on.

use std::num::NonZeroUsize;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::EngineError;
use crate::progress::SimulationProgress;

/// Offset between consecutive worker stream seeds
pub const WORKER_SEED_STRIDE: u64 = 1_000_003;

/// Stream seed of worker `worker`
#[must_use]
pub fn stream_seed(base: u64, worker: usize) -> u64 {
    base.wrapping_add((worker as u64).wrapping_mul(WORKER_SEED_STRIDE))
}

/// 32-byte ChaCha8 key: the seed's little-endian bytes, then zeros
#[must_use]
pub fn seed_key(seed: u64) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    key
}

/// The configured seed as raw `u64` bits, or the current time in
/// nanoseconds when absent.
///
/// The clock fallback is the non-deterministic mode; pass a seed for
/// reproducible runs.
#[must_use]
pub fn base_seed(seed: Option<i64>) -> u64 {
    seed.map_or_else(
        || jiff::Timestamp::now().as_nanosecond() as u64,
        |s| s as u64,
    )
}

/// Fixed-size pool of simulation workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Pool with `workers` workers (at least one)
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Pool sized to the host's available parallelism
    #[must_use]
    pub fn available() -> Self {
        Self::new(
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        )
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Paths assigned to each worker: `n / workers` each with the remainder
    /// on the last worker.
    #[must_use]
    pub fn partition(&self, num_paths: usize) -> Vec<usize> {
        let share = num_paths / self.workers;
        let mut shares = vec![share; self.workers];
        if let Some(last) = shares.last_mut() {
            *last += num_paths % self.workers;
        }
        shares
    }

    /// Run `generate` `num_paths` times across the workers.
    ///
    /// Every worker checks `progress` for cancellation before each path and
    /// bumps its counter after. A cancelled run returns
    /// [`EngineError::Cancelled`] once all workers have stopped.
    pub fn run<T, F>(
        &self,
        num_paths: usize,
        base_seed: u64,
        progress: Option<&SimulationProgress>,
        generate: F,
    ) -> Result<Vec<T>, EngineError>
    where
        T: Send,
        F: Fn(&mut ChaCha8Rng) -> T + Sync,
    {
        let shares = self.partition(num_paths);
        tracing::debug!(workers = self.workers, ?shares, base_seed, "partitioned paths");

        if let Some(p) = progress {
            p.reset(num_paths);
        }

        let batches = self.run_workers(&shares, base_seed, progress, &generate)?;

        let mut out = Vec::with_capacity(num_paths);
        for batch in batches {
            out.extend(batch);
        }
        Ok(out)
    }

    #[cfg(feature = "parallel")]
    fn run_workers<T, F>(
        &self,
        shares: &[usize],
        base_seed: u64,
        progress: Option<&SimulationProgress>,
        generate: &F,
    ) -> Result<Vec<Vec<T>>, EngineError>
    where
        T: Send,
        F: Fn(&mut ChaCha8Rng) -> T + Sync,
    {
        use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;

        // Every worker runs to completion (or cancellation) before the error
        // of any one is reported
        let results: Vec<Result<Vec<T>, EngineError>> = pool.install(|| {
            shares
                .par_iter()
                .enumerate()
                .map(|(w, &count)| {
                    run_worker(count, stream_seed(base_seed, w), progress, generate)
                })
                .collect()
        });
        results.into_iter().collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn run_workers<T, F>(
        &self,
        shares: &[usize],
        base_seed: u64,
        progress: Option<&SimulationProgress>,
        generate: &F,
    ) -> Result<Vec<Vec<T>>, EngineError>
    where
        T: Send,
        F: Fn(&mut ChaCha8Rng) -> T + Sync,
    {
        shares
            .iter()
            .enumerate()
            .map(|(w, &count)| run_worker(count, stream_seed(base_seed, w), progress, generate))
            .collect()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::available()
    }
}

fn run_worker<T, F>(
    count: usize,
    seed: u64,
    progress: Option<&SimulationProgress>,
    generate: &F,
) -> Result<Vec<T>, EngineError>
where
    F: Fn(&mut ChaCha8Rng) -> T,
{
    let mut rng = ChaCha8Rng::from_seed(seed_key(seed));
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        if progress.is_some_and(SimulationProgress::is_cancelled) {
            return Err(EngineError::Cancelled);
        }
        out.push(generate(&mut rng));
        if let Some(p) = progress {
            p.increment();
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_partition_sums_to_total() {
        for workers in 1..=9 {
            let pool = WorkerPool::new(workers);
            for n in [0, 1, 7, 100, 1001] {
                let shares = pool.partition(n);
                assert_eq!(shares.len(), workers);
                assert_eq!(shares.iter().sum::<usize>(), n);
                assert!(shares[..workers - 1].iter().all(|&s| s == n / workers));
            }
        }
        assert_eq!(WorkerPool::new(4).partition(10), vec![2, 2, 2, 4]);
        assert_eq!(WorkerPool::new(8).partition(3), vec![0, 0, 0, 0, 0, 0, 0, 3]);
    }

    #[test]
    fn test_zero_workers_is_one() {
        assert_eq!(WorkerPool::new(0).workers(), 1);
        assert!(WorkerPool::available().workers() >= 1);
    }

    #[test]
    fn test_seed_derivation() {
        assert_eq!(stream_seed(42, 0), 42);
        assert_eq!(stream_seed(42, 3), 42 + 3 * WORKER_SEED_STRIDE);
        assert_eq!(stream_seed(u64::MAX, 1), WORKER_SEED_STRIDE - 1);

        let key = seed_key(0x0102_0304_0506_0708);
        assert_eq!(&key[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert!(key[8..].iter().all(|&b| b == 0));

        assert_eq!(base_seed(Some(9)), 9);
        assert_eq!(base_seed(Some(-1)), u64::MAX);
        assert_eq!(base_seed(Some(i64::MIN)), 1 << 63);
    }

    #[test]
    fn test_run_is_deterministic() {
        let pool = WorkerPool::new(3);
        let draw = |rng: &mut ChaCha8Rng| rng.random::<u64>();

        let a = pool.run(10, 42, None, draw).unwrap();
        let b = pool.run(10, 42, None, draw).unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);

        let c = pool.run(10, 43, None, draw).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_run_is_worker_major() {
        let pool = WorkerPool::new(2);
        let out = pool.run(5, 7, None, |rng| rng.random::<u64>()).unwrap();

        let mut first = ChaCha8Rng::from_seed(seed_key(stream_seed(7, 0)));
        let mut second = ChaCha8Rng::from_seed(seed_key(stream_seed(7, 1)));
        let expected: Vec<u64> = (0..2)
            .map(|_| first.random::<u64>())
            .chain((0..3).map(|_| second.random::<u64>()))
            .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_run_counts_progress() {
        let progress = SimulationProgress::new();
        let out = WorkerPool::new(4)
            .run(17, 1, Some(&progress), |_| ())
            .unwrap();
        assert_eq!(out.len(), 17);
        assert_eq!(progress.completed(), 17);
        assert_eq!(progress.total(), 17);
    }

    #[test]
    fn test_cancelled_run() {
        let progress = SimulationProgress::new();
        progress.cancel();
        let err = WorkerPool::new(2)
            .run(10, 1, Some(&progress), |_| ())
            .unwrap_err();
        assert_eq!(err, EngineError::Cancelled);
        assert_eq!(progress.completed(), 0);
    }

    #[test]
    fn test_cancel_mid_run() {
        let progress = SimulationProgress::new();
        let handle = progress.clone();
        let err = WorkerPool::new(1)
            .run(100, 1, Some(&progress), |_| {
                if handle.completed() == 9 {
                    handle.cancel();
                }
            })
            .unwrap_err();
        assert_eq!(err, EngineError::Cancelled);
        assert_eq!(progress.completed(), 10);
    }
}
