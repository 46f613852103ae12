//! Sigmoid (Tanh) Kernel Implementation
//!
//! K(x, y) = tanh(γ * <x, y> + r)
//!
//! The sigmoid kernel is not positive semi-definite for every choice of
//! γ and r. The solver copes with that through the TAU floor on the
//! quadratic coefficient; no special handling is needed here.

use crate::core::Problem;
use crate::kernel::linear::dot;
use crate::kernel::Kernel;

/// Sigmoid (Hyperbolic Tangent) kernel
#[derive(Debug, Clone, Copy)]
pub struct SigmoidKernel<'a> {
    problem: &'a Problem,
    /// Scaling parameter for the dot product
    pub gamma: f64,
    /// Bias/offset parameter
    pub coef0: f64,
}

impl<'a> SigmoidKernel<'a> {
    pub fn new(problem: &'a Problem, gamma: f64, coef0: f64) -> Self {
        Self {
            problem,
            gamma,
            coef0,
        }
    }
}

impl Kernel for SigmoidKernel<'_> {
    fn compute(&self, i: usize, j: usize) -> f64 {
        let q = self.gamma * dot(self.problem.row(i), self.problem.row(j)) + self.coef0;
        q.tanh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use approx::assert_relative_eq;

    #[test]
    fn test_sigmoid_kernel_bounded() {
        let rows = vec![
            SparseVector::new(vec![1], vec![100.0]),
            SparseVector::new(vec![1], vec![-100.0]),
            SparseVector::new(vec![2], vec![1.0]),
        ];
        let problem = Problem::from_rows(&[1.0, -1.0, 1.0], &rows);
        let kernel = SigmoidKernel::new(&problem, 1.0, 0.0);

        assert_relative_eq!(kernel.compute(0, 0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(kernel.compute(0, 1), -1.0, epsilon = 1e-12);
        assert_eq!(kernel.compute(0, 2), 0.0);
    }

    #[test]
    fn test_sigmoid_kernel_with_offset() {
        let rows = vec![
            SparseVector::new(vec![1], vec![1.0]),
            SparseVector::new(vec![1], vec![2.0]),
        ];
        let problem = Problem::from_rows(&[1.0, -1.0], &rows);
        let kernel = SigmoidKernel::new(&problem, 0.5, -1.0);

        assert_relative_eq!(kernel.compute(0, 1), 0.0f64.tanh(), epsilon = 1e-12);
        assert_relative_eq!(kernel.compute(1, 1), 1.0f64.tanh(), epsilon = 1e-12);
    }
}
