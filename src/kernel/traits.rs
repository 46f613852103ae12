//! Kernel trait definition

/// Pairwise kernel evaluation over the rows of a training problem
///
/// Implementations capture the problem and kernel hyperparameters at
/// construction, so `compute` is a pure function of the two row indices.
/// It must be symmetric: `compute(i, j) == compute(j, i)`.
///
/// `Sync` is required because a column may be filled from several worker
/// threads at once.
pub trait Kernel: Sync {
    /// Compute kernel value K(x_i, x_j)
    fn compute(&self, i: usize, j: usize) -> f64;
}
