//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-γ * ||x - y||²)
//! where γ (gamma) is a hyperparameter that controls the kernel width.
//!
//! The squared distance is expanded as ||x||² + ||y||² - 2 * x^T * y. The
//! squared norm of every training row is computed once at construction, so
//! each evaluation costs a single sparse dot product.

use crate::core::Problem;
use crate::kernel::linear::dot;
use crate::kernel::Kernel;

/// RBF (Radial Basis Function) kernel: K(x, y) = exp(-γ * ||x - y||²)
///
/// The gamma parameter controls the "reach" of each training example:
/// - High gamma: close points have high influence (potential overfitting)
/// - Low gamma: distant points have influence (potential underfitting)
#[derive(Debug, Clone)]
pub struct RbfKernel<'a> {
    problem: &'a Problem,
    gamma: f64,
    x_square: Vec<f64>,
}

impl<'a> RbfKernel<'a> {
    /// Create an RBF kernel, precomputing the squared norm of every row
    pub fn new(problem: &'a Problem, gamma: f64) -> Self {
        let x_square = (0..problem.len())
            .map(|i| dot(problem.row(i), problem.row(i)))
            .collect();
        Self {
            problem,
            gamma,
            x_square,
        }
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RbfKernel<'_> {
    fn compute(&self, i: usize, j: usize) -> f64 {
        let q = self.x_square[i] + self.x_square[j]
            - 2.0 * dot(self.problem.row(i), self.problem.row(j));
        (-self.gamma * q).exp()
    }
}
