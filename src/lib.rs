//! Support Vector Machine training and prediction with Sequential Minimal
//! Optimization
//!
//! Covers C-SVC, nu-SVC, one-class SVM, epsilon-SVR and nu-SVR over linear,
//! polynomial, RBF, sigmoid and precomputed kernels. Training decomposes
//! multi-class problems one-vs-one and optionally fits Platt-scaled pairwise
//! probabilities coupled into class probabilities at prediction time.
//!
//! ```rust,no_run
//! use smosvm::{Parameter, Problem, SparseVector};
//!
//! # fn main() -> smosvm::Result<()> {
//! let mut problem = Problem::new();
//! problem.push(1.0, &SparseVector::from_dense(&[1.0, 1.0]));
//! problem.push(-1.0, &SparseVector::from_dense(&[-1.0, -1.0]));
//!
//! let model = smosvm::train(&problem, &Parameter::default())?;
//! let label = model.predict(SparseVector::from_dense(&[0.8, 0.9]).nodes());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod model;
pub mod persistence;
pub mod predict;
pub mod probability;
pub mod qmatrix;
pub mod solver;
pub mod train;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, SVM};
pub use crate::cache::{CacheStats, ColumnCache};
pub use crate::core::types::*;
pub use crate::core::{KernelType, Parameter, Result, SVMError, SvmType};
pub use crate::data::LibSVMDataset;
pub use crate::kernel::{k_function, Kernel, KernelFunction};
pub use crate::model::Model;
pub use crate::train::train;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
