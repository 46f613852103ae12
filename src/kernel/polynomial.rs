//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = (γ * <x, y> + r)^d
//!
//! Where:
//! - γ (gamma): scaling factor for the dot product
//! - r (coef0): independent term in the polynomial
//! - d (degree): degree of the polynomial

use crate::core::Problem;
use crate::kernel::linear::dot;
use crate::kernel::Kernel;

/// Polynomial kernel with configurable degree, gamma, and coefficient
#[derive(Debug, Clone, Copy)]
pub struct PolynomialKernel<'a> {
    problem: &'a Problem,
    /// Scaling factor for the dot product
    pub gamma: f64,
    /// Independent term in the polynomial
    pub coef0: f64,
    /// Degree of the polynomial
    pub degree: i32,
}

impl<'a> PolynomialKernel<'a> {
    /// Creates a new polynomial kernel over the rows of `problem`
    pub fn new(problem: &'a Problem, degree: i32, gamma: f64, coef0: f64) -> Self {
        Self {
            problem,
            gamma,
            coef0,
            degree,
        }
    }
}

impl Kernel for PolynomialKernel<'_> {
    fn compute(&self, i: usize, j: usize) -> f64 {
        let q = self.gamma * dot(self.problem.row(i), self.problem.row(j)) + self.coef0;
        q.powi(self.degree)
    }
}
