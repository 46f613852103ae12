//! High-level API for Support Vector Machine operations
//!
//! This module provides a builder over [`Parameter`] plus helpers for
//! batch prediction and evaluation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use smosvm::api::{evaluate, SVM};
//! use smosvm::core::KernelType;
//! use smosvm::data::LibSVMDataset;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = SVM::new()
//!     .with_kernel(KernelType::Rbf)
//!     .with_c(10.0)
//!     .with_gamma(0.5)
//!     .train_from_file("data.libsvm")?;
//!
//! let test = LibSVMDataset::from_file("test.libsvm")?;
//! let metrics = evaluate(&model, test.problem());
//! println!("Accuracy: {:.2}%", metrics.accuracy() * 100.0);
//! # Ok(())
//! # }
//! ```

use crate::core::{KernelType, Parameter, Problem, Result, SvmType};
use crate::data::LibSVMDataset;
use crate::model::Model;
use crate::train::train;
use std::path::Path;

/// High-level SVM interface with builder pattern
#[derive(Debug, Clone, Default)]
pub struct SVM {
    param: Parameter,
}

impl SVM {
    /// Create a C-SVC with RBF kernel and default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing parameter set
    pub fn with_params(param: Parameter) -> Self {
        Self { param }
    }

    pub fn with_svm_type(mut self, svm_type: SvmType) -> Self {
        self.param.svm_type = svm_type;
        self
    }

    pub fn with_kernel(mut self, kernel_type: KernelType) -> Self {
        self.param.kernel_type = kernel_type;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.param.c = c;
        self
    }

    pub fn with_nu(mut self, nu: f64) -> Self {
        self.param.nu = nu;
        self
    }

    /// Set kernel width; 0 derives it from the data
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.param.gamma = gamma;
        self
    }

    pub fn with_degree(mut self, degree: i32) -> Self {
        self.param.degree = degree;
        self
    }

    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.param.coef0 = coef0;
        self
    }

    /// Set the epsilon-SVR tube width
    pub fn with_p(mut self, p: f64) -> Self {
        self.param.p = p;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.param.eps = epsilon;
        self
    }

    /// Set maximum number of solver iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.param.max_iter = Some(max_iterations);
        self
    }

    /// Set kernel cache size in MB
    pub fn with_cache_size(mut self, megabytes: f64) -> Self {
        self.param.cache_size = megabytes;
        self
    }

    /// Set worker threads for kernel column computation
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.param.num_threads = num_threads;
        self
    }

    /// Scale C for the given class label
    pub fn with_class_weight(mut self, label: i32, weight: f64) -> Self {
        self.param.weight_label.push(label);
        self.param.weight.push(weight);
        self
    }

    /// Fit probability estimates alongside the model
    pub fn with_probability(mut self, probability: bool) -> Self {
        self.param.probability = probability;
        self
    }

    pub fn params(&self) -> &Parameter {
        &self.param
    }

    /// Train on a problem
    pub fn train(&self, problem: &Problem) -> Result<Model> {
        train(problem, &self.param)
    }

    /// Train from LibSVM format file
    pub fn train_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Model> {
        let dataset = LibSVMDataset::from_file(path)?;
        self.train(dataset.problem())
    }
}

/// Predict every row of a problem
pub fn predict_problem(model: &Model, problem: &Problem) -> Vec<f64> {
    (0..problem.len())
        .map(|i| model.predict(problem.row(i)))
        .collect()
}

/// Prediction quality against known labels or targets
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    pub total: usize,
    pub correct: usize,
    /// Mean squared error, meaningful for regression
    pub mean_squared_error: f64,
    /// Squared correlation coefficient, meaningful for regression
    pub squared_correlation: f64,
}

impl EvaluationMetrics {
    /// Build metrics from predicted and true values
    pub fn from_predictions(predicted: &[f64], actual: &[f64]) -> Self {
        let total = predicted.len().min(actual.len());
        let mut correct = 0;
        let (mut error, mut sum_v, mut sum_y) = (0.0, 0.0, 0.0);
        let (mut sum_vv, mut sum_yy, mut sum_vy) = (0.0, 0.0, 0.0);

        for (&v, &y) in predicted.iter().zip(actual) {
            if v == y {
                correct += 1;
            }
            error += (v - y) * (v - y);
            sum_v += v;
            sum_y += y;
            sum_vv += v * v;
            sum_yy += y * y;
            sum_vy += v * y;
        }

        let n = total as f64;
        let (mean_squared_error, squared_correlation) = if total == 0 {
            (0.0, 0.0)
        } else {
            let numerator = n * sum_vy - sum_v * sum_y;
            let denominator = (n * sum_vv - sum_v * sum_v) * (n * sum_yy - sum_y * sum_y);
            let scc = if denominator == 0.0 {
                0.0
            } else {
                numerator * numerator / denominator
            };
            (error / n, scc)
        };

        Self {
            total,
            correct,
            mean_squared_error,
            squared_correlation,
        }
    }

    /// Fraction of exactly matching predictions
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Predict a problem and compare against its labels
pub fn evaluate(model: &Model, problem: &Problem) -> EvaluationMetrics {
    let predicted = predict_problem(model, problem);
    EvaluationMetrics::from_predictions(&predicted, &problem.y)
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;

    /// Train a C-SVC on LibSVM data with default parameters
    pub fn train_libsvm<P: AsRef<Path>>(path: P) -> Result<Model> {
        SVM::new().train_from_file(path)
    }

    /// Quick evaluation: train on training file, test on test file
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
    ) -> Result<f64> {
        let model = train_libsvm(train_path)?;
        let test = LibSVMDataset::from_file(test_path)?;
        Ok(evaluate(&model, test.problem()).accuracy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn separable() -> Problem {
        let mut problem = Problem::new();
        for (label, x) in [(1.0, 2.0), (-1.0, -2.0), (1.0, 1.5), (-1.0, -1.5)] {
            problem.push(label, &SparseVector::from_dense(&[x]));
        }
        problem
    }

    #[test]
    fn test_svm_builder_pattern() {
        let svm = SVM::new()
            .with_c(2.0)
            .with_epsilon(0.01)
            .with_max_iterations(5000)
            .with_class_weight(1, 3.0);

        assert_eq!(svm.params().c, 2.0);
        assert_eq!(svm.params().eps, 0.01);
        assert_eq!(svm.params().max_iter, Some(5000));
        assert_eq!(svm.params().weight_label, vec![1]);
        assert_eq!(svm.params().weight, vec![3.0]);
    }

    #[test]
    fn test_quick_training() {
        let problem = separable();
        let model = SVM::new()
            .with_kernel(KernelType::Linear)
            .train(&problem)
            .expect("Training should succeed");

        let x = SparseVector::from_dense(&[1.0]);
        assert_eq!(model.predict(x.nodes()), 1.0);
        assert!(model.total_sv() > 0);
        assert_eq!(evaluate(&model, &problem).accuracy(), 1.0);
    }

    #[test]
    fn test_train_from_file() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "+1 1:2.0\n-1 1:-2.0\n+1 1:1.5\n-1 1:-1.5").unwrap();
        file.flush().unwrap();

        let model = SVM::new().train_from_file(file.path()).unwrap();
        assert_eq!(model.labels(), &[1, -1]);
    }

    #[test]
    fn test_evaluation_metrics() {
        let metrics = EvaluationMetrics::from_predictions(&[1.0, 2.0, 3.0, 5.0], &[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(metrics.total, 4);
        assert_eq!(metrics.correct, 3);
        assert_eq!(metrics.accuracy(), 0.75);
        assert_relative_eq!(metrics.mean_squared_error, 0.25);
        assert!(metrics.squared_correlation > 0.9 && metrics.squared_correlation <= 1.0);
    }

    #[test]
    fn test_empty_evaluation() {
        let metrics = EvaluationMetrics::from_predictions(&[], &[]);
        assert_eq!(metrics.accuracy(), 0.0);
        assert_eq!(metrics.mean_squared_error, 0.0);
    }
}
