//! Q matrix for one-class novelty detection: `Q[i][j] = K(i, j)`

use crate::cache::ColumnCache;
use crate::core::{Parameter, Problem, Result};
use crate::kernel::{Kernel, KernelFunction};
use crate::qmatrix::{cached_column, cached_pair, column_storage, ColumnWorkers, QMatrix};

#[derive(Debug)]
pub struct OneClassQ<'a> {
    kernel: KernelFunction<'a>,
    qd: Vec<f64>,
    cache: ColumnCache,
    workers: ColumnWorkers,
}

impl<'a> OneClassQ<'a> {
    pub fn new(problem: &'a Problem, param: &Parameter) -> Result<Self> {
        let kernel = KernelFunction::new(problem, param)?;
        let qd = (0..problem.len()).map(|i| kernel.compute(i, i)).collect();
        let (cache, workers) = column_storage(problem, param, problem.len());

        Ok(Self {
            kernel,
            qd,
            cache,
            workers,
        })
    }
}

impl QMatrix for OneClassQ<'_> {
    fn get_qd(&self) -> &[f64] {
        &self.qd
    }

    fn get_q(&mut self, i: usize, len: usize) -> &[f64] {
        let Self {
            ref kernel,
            ref mut cache,
            ref workers,
            ..
        } = *self;
        cached_column(cache, i, len, |c, out| {
            workers.fill(out, |j| kernel.compute(c, j))
        })
    }

    fn get_q_pair(&mut self, i: usize, j: usize, len: usize) -> (&[f64], &[f64]) {
        let Self {
            ref kernel,
            ref mut cache,
            ref workers,
            ..
        } = *self;
        cached_pair(cache, i, j, len, |c, out| {
            workers.fill(out, |k| kernel.compute(c, k))
        })
    }

    fn compute_q(&self, i: usize, j: usize) -> f64 {
        self.kernel.compute(i, j)
    }
}
