//! Kernel functions for SVM
//!
//! Every kernel family has its own type implementing [`Kernel`];
//! [`KernelFunction`] is the closed set the solver works with.

pub mod linear;
pub mod polynomial;
pub mod precomputed;
pub mod rbf;
pub mod sigmoid;
pub mod traits;

pub use self::linear::*;
pub use self::polynomial::*;
pub use self::precomputed::*;
pub use self::rbf::*;
pub use self::sigmoid::*;
pub use self::traits::*;

use crate::core::{KernelType, Parameter, Problem, Result, SvmNode};

/// Kernel evaluator for one training problem
#[derive(Debug, Clone)]
pub enum KernelFunction<'a> {
    Linear(LinearKernel<'a>),
    Polynomial(PolynomialKernel<'a>),
    Rbf(RbfKernel<'a>),
    Sigmoid(SigmoidKernel<'a>),
    Precomputed(PrecomputedKernel<'a>),
}

impl<'a> KernelFunction<'a> {
    /// Build the evaluator selected by `param.kernel_type`
    pub fn new(problem: &'a Problem, param: &Parameter) -> Result<Self> {
        Ok(match param.kernel_type {
            KernelType::Linear => Self::Linear(LinearKernel::new(problem)),
            KernelType::Polynomial => Self::Polynomial(PolynomialKernel::new(
                problem,
                param.degree,
                param.gamma,
                param.coef0,
            )),
            KernelType::Rbf => Self::Rbf(RbfKernel::new(problem, param.gamma)),
            KernelType::Sigmoid => {
                Self::Sigmoid(SigmoidKernel::new(problem, param.gamma, param.coef0))
            }
            KernelType::Precomputed => Self::Precomputed(PrecomputedKernel::new(problem)?),
        })
    }
}

impl Kernel for KernelFunction<'_> {
    fn compute(&self, i: usize, j: usize) -> f64 {
        match self {
            Self::Linear(k) => k.compute(i, j),
            Self::Polynomial(k) => k.compute(i, j),
            Self::Rbf(k) => k.compute(i, j),
            Self::Sigmoid(k) => k.compute(i, j),
            Self::Precomputed(k) => k.compute(i, j),
        }
    }
}

/// Kernel value between two standalone rows, used at prediction time
///
/// For the precomputed kernel `x` is the query row (`0:ID` followed by its
/// kernel values against the training rows) and `y` a support vector, whose
/// `0:ID` entry selects the position to read from `x`.
pub fn k_function(x: &[SvmNode], y: &[SvmNode], param: &Parameter) -> f64 {
    match param.kernel_type {
        KernelType::Linear => dot(x, y),
        KernelType::Polynomial => (param.gamma * dot(x, y) + param.coef0).powi(param.degree),
        KernelType::Rbf => {
            let q = dot(x, x) + dot(y, y) - 2.0 * dot(x, y);
            (-param.gamma * q).exp()
        }
        KernelType::Sigmoid => (param.gamma * dot(x, y) + param.coef0).tanh(),
        KernelType::Precomputed => {
            let position = y.first().map_or(0, |node| node.value as usize);
            x.get(position)
                .filter(|node| !node.is_terminator())
                .map_or(0.0, |node| node.value)
        }
    }
}
