//! SVM solver implementations
//!
//! This module implements the Sequential Minimal Optimization (SMO) algorithm
//! with second-order working-set selection, as described in "Working Set
//! Selection Using Second Order Information for Training SVM" by Fan, Chen
//! and Lin.

pub mod smo;
pub mod wss;

pub use self::smo::*;
pub use self::wss::*;
