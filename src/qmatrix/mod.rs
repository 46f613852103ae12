//! Q matrices of the SVM dual problems
//!
//! Each formulation sees the kernel matrix through its own sign and
//! duplication convention. Columns are computed on demand into buffers
//! recycled by a [`ColumnCache`] and may be spread over [`ColumnWorkers`].

pub mod one_class;
pub mod svc;
pub mod svr;
pub mod workers;

pub use self::one_class::OneClassQ;
pub use self::svc::SvcQ;
pub use self::svr::SvrQ;
pub use self::workers::ColumnWorkers;

use crate::cache::ColumnCache;
use crate::core::{Parameter, Problem};

/// Column access to the Q matrix of one dual problem
pub trait QMatrix {
    /// Diagonal entries `Q[i][i]`
    fn get_qd(&self) -> &[f64];

    /// The first `len` entries of column `i`
    fn get_q(&mut self, i: usize, len: usize) -> &[f64];

    /// Columns `i` and `j` together, both truncated to `len`
    fn get_q_pair(&mut self, i: usize, j: usize, len: usize) -> (&[f64], &[f64]);

    /// A single entry `Q[i][j]`
    fn compute_q(&self, i: usize, j: usize) -> f64;
}

/// The Q matrices the solver can run on
#[derive(Debug)]
pub enum QMatrixKind<'a> {
    Svc(SvcQ<'a>),
    OneClass(OneClassQ<'a>),
    Svr(SvrQ<'a>),
}

impl QMatrix for QMatrixKind<'_> {
    fn get_qd(&self) -> &[f64] {
        match self {
            Self::Svc(q) => q.get_qd(),
            Self::OneClass(q) => q.get_qd(),
            Self::Svr(q) => q.get_qd(),
        }
    }

    fn get_q(&mut self, i: usize, len: usize) -> &[f64] {
        match self {
            Self::Svc(q) => q.get_q(i, len),
            Self::OneClass(q) => q.get_q(i, len),
            Self::Svr(q) => q.get_q(i, len),
        }
    }

    fn get_q_pair(&mut self, i: usize, j: usize, len: usize) -> (&[f64], &[f64]) {
        match self {
            Self::Svc(q) => q.get_q_pair(i, j, len),
            Self::OneClass(q) => q.get_q_pair(i, j, len),
            Self::Svr(q) => q.get_q_pair(i, j, len),
        }
    }

    fn compute_q(&self, i: usize, j: usize) -> f64 {
        match self {
            Self::Svc(q) => q.compute_q(i, j),
            Self::OneClass(q) => q.compute_q(i, j),
            Self::Svr(q) => q.compute_q(i, j),
        }
    }
}

/// Cache and worker pool sized for columns of `col_size` entries
fn column_storage(problem: &Problem, param: &Parameter, col_size: usize) -> (ColumnCache, ColumnWorkers) {
    let cache = ColumnCache::with_memory_limit(col_size, col_size, param.cache_size);
    let workers = ColumnWorkers::new(problem.len(), param.num_threads);
    (cache, workers)
}

/// Recompute column `i` into its cache buffer
fn cached_column<'c, F>(cache: &'c mut ColumnCache, i: usize, len: usize, fill: F) -> &'c [f64]
where
    F: Fn(usize, &mut [f64]),
{
    let column = cache.get_column(i);
    fill(i, &mut *column);
    let column: &'c [f64] = column;
    &column[..len]
}

/// Recompute columns `i` and `j` into their cache buffers
fn cached_pair<'c, F>(
    cache: &'c mut ColumnCache,
    i: usize,
    j: usize,
    len: usize,
    fill: F,
) -> (&'c [f64], &'c [f64])
where
    F: Fn(usize, &mut [f64]),
{
    if i == j {
        let column = cached_column(cache, i, len, fill);
        return (column, column);
    }

    let (column_i, column_j) = cache.get_column_pair(i, j);
    fill(i, &mut *column_i);
    fill(j, &mut *column_j);
    let column_i: &'c [f64] = column_i;
    let column_j: &'c [f64] = column_j;
    (&column_i[..len], &column_j[..len])
}
