//! Worker pool for column computation
//!
//! A single Q-matrix column is the only unit of work split across threads.
//! The column is cut into contiguous chunks, one per worker, and the call
//! returns only after every chunk has been written.

use log::warn;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Columns shorter than this are filled on the calling thread
pub const MIN_PARALLEL_ROWS: usize = 1024;

/// Fixed-size pool that fills one column at a time
#[derive(Debug)]
pub struct ColumnWorkers {
    pool: Option<ThreadPool>,
}

impl ColumnWorkers {
    /// Create workers for columns of `rows` entries
    ///
    /// `num_threads` of 0 picks the machine default; 1, or a column shorter
    /// than [`MIN_PARALLEL_ROWS`], keeps everything on the calling thread.
    pub fn new(rows: usize, num_threads: usize) -> Self {
        if num_threads == 1 || rows < MIN_PARALLEL_ROWS {
            return Self::sequential();
        }
        Self::with_threads(num_threads)
    }

    /// Workers that never leave the calling thread
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Build a pool of `num_threads` workers regardless of column length
    pub fn with_threads(num_threads: usize) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("smosvm-column-{i}"))
            .build();

        match pool {
            Ok(pool) => Self { pool: Some(pool) },
            Err(err) => {
                warn!("Falling back to sequential column computation: {err}");
                Self::sequential()
            }
        }
    }

    /// Number of threads a column is split over
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads())
    }

    /// Write `entry(j)` into `out[j]` for every position of `out`
    pub fn fill<F>(&self, out: &mut [f64], entry: F)
    where
        F: Fn(usize) -> f64 + Sync,
    {
        let Some(pool) = &self.pool else {
            for (j, slot) in out.iter_mut().enumerate() {
                *slot = entry(j);
            }
            return;
        };

        let chunk = out.len().div_ceil(pool.current_num_threads()).max(1);
        pool.install(|| {
            out.par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(c, slots)| {
                    let start = c * chunk;
                    for (k, slot) in slots.iter_mut().enumerate() {
                        *slot = entry(start + k);
                    }
                });
        });
    }
}
