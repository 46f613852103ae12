//! Data loading
//!
//! Readers that turn text datasets into a [`crate::core::Problem`].

pub mod libsvm;

pub use self::libsvm::*;
