//! Core types for SVM training and prediction

pub mod error;
pub mod params;
pub mod types;

pub use self::error::*;
pub use self::params::*;
pub use self::types::*;
