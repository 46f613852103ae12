//! Linear kernel implementation

use crate::core::{Problem, SvmNode};
use crate::kernel::Kernel;

/// Linear kernel: K(x, y) = x^T * y
#[derive(Debug, Clone, Copy)]
pub struct LinearKernel<'a> {
    problem: &'a Problem,
}

impl<'a> LinearKernel<'a> {
    /// Create a new linear kernel over the rows of `problem`
    pub fn new(problem: &'a Problem) -> Self {
        Self { problem }
    }
}

impl Kernel for LinearKernel<'_> {
    fn compute(&self, i: usize, j: usize) -> f64 {
        dot(self.problem.row(i), self.problem.row(j))
    }
}

/// Dot product of two sparse rows
///
/// Both rows have ascending indices, so a merge walk with two cursors visits
/// each entry once. The walk stops as soon as either row reaches its
/// terminator or the end of its slice.
pub fn dot(px: &[SvmNode], py: &[SvmNode]) -> f64 {
    let mut sum = 0.0;
    let mut i = 0;
    let mut j = 0;

    while let (Some(x), Some(y)) = (px.get(i), py.get(j)) {
        if x.is_terminator() || y.is_terminator() {
            break;
        }
        let x_idx = x.index;
        let y_idx = y.index;

        if x_idx == y_idx {
            sum += x.value * y.value;
            i += 1;
            j += 1;
        } else if x_idx > y_idx {
            j += 1;
        } else {
            i += 1;
        }
    }

    sum
}
