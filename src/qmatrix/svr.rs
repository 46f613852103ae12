//! Q matrix for support vector regression
//!
//! The regression dual has `2l` variables: `alpha` for `0..l` and `alpha*`
//! for `l..2l`. Variable `i` maps back to data row `i mod l` and carries
//! sign +1 in the first half and -1 in the second, so
//! `Q[i][j] = sign(i) * sign(j) * K(row(i), row(j))`.

use crate::cache::ColumnCache;
use crate::core::{Parameter, Problem, Result};
use crate::kernel::{Kernel, KernelFunction};
use crate::qmatrix::{cached_column, cached_pair, column_storage, ColumnWorkers, QMatrix};

#[derive(Debug)]
pub struct SvrQ<'a> {
    l: usize,
    kernel: KernelFunction<'a>,
    qd: Vec<f64>,
    cache: ColumnCache,
    workers: ColumnWorkers,
}

impl<'a> SvrQ<'a> {
    pub fn new(problem: &'a Problem, param: &Parameter) -> Result<Self> {
        let l = problem.len();
        let kernel = KernelFunction::new(problem, param)?;
        let half: Vec<f64> = (0..l).map(|i| kernel.compute(i, i)).collect();
        let qd = half.iter().chain(half.iter()).copied().collect();
        let (cache, workers) = column_storage(problem, param, 2 * l);

        Ok(Self {
            l,
            kernel,
            qd,
            cache,
            workers,
        })
    }

    /// Data row behind variable `i`
    pub fn real_index(&self, i: usize) -> usize {
        real_index(self.l, i)
    }

    /// +1 for `alpha`, -1 for `alpha*`
    pub fn sign(&self, i: usize) -> f64 {
        sign(self.l, i)
    }
}

fn real_index(l: usize, i: usize) -> usize {
    if i < l {
        i
    } else {
        i - l
    }
}

fn sign(l: usize, i: usize) -> f64 {
    if i < l {
        1.0
    } else {
        -1.0
    }
}

fn fill_column(
    kernel: &KernelFunction<'_>,
    workers: &ColumnWorkers,
    l: usize,
    i: usize,
    out: &mut [f64],
) {
    let sign_i = sign(l, i);
    let real_i = real_index(l, i);

    let (first, second) = out.split_at_mut(l);
    workers.fill(first, |j| sign_i * kernel.compute(real_i, j));
    for (neg, &pos) in second.iter_mut().zip(first.iter()) {
        *neg = -pos;
    }
}

impl QMatrix for SvrQ<'_> {
    fn get_qd(&self) -> &[f64] {
        &self.qd
    }

    fn get_q(&mut self, i: usize, len: usize) -> &[f64] {
        let Self {
            l,
            ref kernel,
            ref mut cache,
            ref workers,
            ..
        } = *self;
        cached_column(cache, i, len, |c, out| {
            fill_column(kernel, workers, l, c, out)
        })
    }

    fn get_q_pair(&mut self, i: usize, j: usize, len: usize) -> (&[f64], &[f64]) {
        let Self {
            l,
            ref kernel,
            ref mut cache,
            ref workers,
            ..
        } = *self;
        cached_pair(cache, i, j, len, |c, out| {
            fill_column(kernel, workers, l, c, out)
        })
    }

    fn compute_q(&self, i: usize, j: usize) -> f64 {
        self.sign(i)
            * self.sign(j)
            * self.kernel.compute(self.real_index(i), self.real_index(j))
    }
}
