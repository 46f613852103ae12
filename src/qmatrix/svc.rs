//! Q matrix for support vector classification: `Q[i][j] = y_i * y_j * K(i, j)`

use crate::cache::ColumnCache;
use crate::core::{Parameter, Problem, Result};
use crate::kernel::{Kernel, KernelFunction};
use crate::qmatrix::{cached_column, cached_pair, column_storage, ColumnWorkers, QMatrix};

#[derive(Debug)]
pub struct SvcQ<'a> {
    kernel: KernelFunction<'a>,
    y: Vec<i8>,
    qd: Vec<f64>,
    cache: ColumnCache,
    workers: ColumnWorkers,
}

impl<'a> SvcQ<'a> {
    /// `y` holds the ±1 sign of every row
    pub fn new(problem: &'a Problem, param: &Parameter, y: &[i8]) -> Result<Self> {
        let kernel = KernelFunction::new(problem, param)?;
        let qd = (0..problem.len()).map(|i| kernel.compute(i, i)).collect();
        let (cache, workers) = column_storage(problem, param, problem.len());

        Ok(Self {
            kernel,
            y: y.to_vec(),
            qd,
            cache,
            workers,
        })
    }
}

fn fill_column(
    kernel: &KernelFunction<'_>,
    y: &[i8],
    workers: &ColumnWorkers,
    i: usize,
    out: &mut [f64],
) {
    let y_i = f64::from(y[i]);
    workers.fill(out, |j| y_i * f64::from(y[j]) * kernel.compute(i, j));
}

impl QMatrix for SvcQ<'_> {
    fn get_qd(&self) -> &[f64] {
        &self.qd
    }

    fn get_q(&mut self, i: usize, len: usize) -> &[f64] {
        let Self {
            ref kernel,
            ref y,
            ref mut cache,
            ref workers,
            ..
        } = *self;
        cached_column(cache, i, len, |c, out| fill_column(kernel, y, workers, c, out))
    }

    fn get_q_pair(&mut self, i: usize, j: usize, len: usize) -> (&[f64], &[f64]) {
        let Self {
            ref kernel,
            ref y,
            ref mut cache,
            ref workers,
            ..
        } = *self;
        cached_pair(cache, i, j, len, |c, out| {
            fill_column(kernel, y, workers, c, out)
        })
    }

    fn compute_q(&self, i: usize, j: usize) -> f64 {
        f64::from(self.y[i]) * f64::from(self.y[j]) * self.kernel.compute(i, j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, SparseVector};
    use approx::assert_relative_eq;

    fn problem() -> Problem {
        let rows = vec![
            SparseVector::new(vec![1, 2], vec![1.0, 2.0]),
            SparseVector::new(vec![1], vec![-1.0]),
            SparseVector::new(vec![2], vec![0.5]),
            SparseVector::new(vec![1, 2], vec![0.3, -0.7]),
        ];
        Problem::from_rows(&[1.0, -1.0, -1.0, 1.0], &rows)
    }

    #[test]
    fn test_column_applies_label_signs() {
        let problem = problem();
        let param = Parameter {
            kernel_type: KernelType::Rbf,
            gamma: 0.5,
            ..Parameter::default()
        };
        let y = [1, -1, -1, 1];
        let kernel = KernelFunction::new(&problem, &param).unwrap();
        let mut q = SvcQ::new(&problem, &param, &y).unwrap();

        let column = q.get_q(1, 4).to_vec();
        for j in 0..4 {
            let expected = f64::from(y[1] * y[j]) * kernel.compute(1, j);
            assert_relative_eq!(column[j], expected, epsilon = 1e-15);
            assert_relative_eq!(q.compute_q(1, j), expected, epsilon = 1e-15);
        }
        for (i, &d) in q.get_qd().iter().enumerate() {
            assert_eq!(d, kernel.compute(i, i));
            assert_eq!(d, 1.0);
        }
    }

    #[test]
    fn test_pair_matches_single_columns() {
        let problem = problem();
        let param = Parameter {
            kernel_type: KernelType::Linear,
            ..Parameter::default()
        };
        let y = [1, -1, -1, 1];
        let mut q = SvcQ::new(&problem, &param, &y).unwrap();

        let col0 = q.get_q(0, 4).to_vec();
        let col3 = q.get_q(3, 4).to_vec();
        let (a, b) = q.get_q_pair(3, 0, 4);
        assert_eq!(a, col3.as_slice());
        assert_eq!(b, col0.as_slice());
    }

    #[test]
    fn test_parallel_columns_match_sequential() {
        let rows: Vec<SparseVector> = (0..64)
            .map(|i| SparseVector::from_dense(&[i as f64 * 0.1, (i % 7) as f64, 1.0]))
            .collect();
        let labels: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let y: Vec<i8> = labels.iter().map(|&l| l as i8).collect();
        let problem = Problem::from_rows(&labels, &rows);
        let param = Parameter {
            gamma: 0.2,
            ..Parameter::default()
        };

        let mut sequential = SvcQ::new(&problem, &param, &y).unwrap();
        let mut parallel = SvcQ::new(&problem, &param, &y).unwrap();
        parallel.workers = ColumnWorkers::with_threads(4);

        for i in [0, 17, 63] {
            let expected = sequential.get_q(i, 64).to_vec();
            assert_eq!(parallel.get_q(i, 64), expected.as_slice());
        }
    }
}
