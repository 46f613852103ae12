//! Training parameters
//!
//! [`Parameter`] mirrors the option set of the classic libsvm tools. It is
//! immutable once training starts; every component receives it by reference.

use crate::core::{Problem, Result, SVMError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SVM formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SvmType {
    CSvc,
    NuSvc,
    OneClass,
    EpsilonSvr,
    NuSvr,
}

impl SvmType {
    const NAMES: [&'static str; 5] = ["c_svc", "nu_svc", "one_class", "epsilon_svr", "nu_svr"];
    const ALL: [SvmType; 5] = [
        SvmType::CSvc,
        SvmType::NuSvc,
        SvmType::OneClass,
        SvmType::EpsilonSvr,
        SvmType::NuSvr,
    ];

    /// Name used in model files
    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// True for C-SVC and nu-SVC
    pub fn is_classification(self) -> bool {
        matches!(self, SvmType::CSvc | SvmType::NuSvc)
    }
}

impl fmt::Display for SvmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SvmType {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        Self::NAMES
            .iter()
            .position(|&name| name == s)
            .map(|pos| Self::ALL[pos])
            .ok_or_else(|| SVMError::UnsupportedSvmType(s.to_string()))
    }
}

impl TryFrom<i32> for SvmType {
    type Error = SVMError;

    fn try_from(code: i32) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|c| Self::ALL.get(c).copied())
            .ok_or_else(|| SVMError::UnsupportedSvmType(code.to_string()))
    }
}

/// Kernel function family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelType {
    Linear,
    Polynomial,
    Rbf,
    Sigmoid,
    Precomputed,
}

impl KernelType {
    const NAMES: [&'static str; 5] = ["linear", "polynomial", "rbf", "sigmoid", "precomputed"];
    const ALL: [KernelType; 5] = [
        KernelType::Linear,
        KernelType::Polynomial,
        KernelType::Rbf,
        KernelType::Sigmoid,
        KernelType::Precomputed,
    ];

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Whether the kernel reads `gamma`
    pub fn uses_gamma(self) -> bool {
        matches!(
            self,
            KernelType::Polynomial | KernelType::Rbf | KernelType::Sigmoid
        )
    }

    /// Whether the kernel reads `coef0`
    pub fn uses_coef0(self) -> bool {
        matches!(self, KernelType::Polynomial | KernelType::Sigmoid)
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelType {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        Self::NAMES
            .iter()
            .position(|&name| name == s)
            .map(|pos| Self::ALL[pos])
            .ok_or_else(|| SVMError::UnsupportedKernel(s.to_string()))
    }
}

impl TryFrom<i32> for KernelType {
    type Error = SVMError;

    fn try_from(code: i32) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|c| Self::ALL.get(c).copied())
            .ok_or_else(|| SVMError::UnsupportedKernel(code.to_string()))
    }
}

/// Full parameter set for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub svm_type: SvmType,
    pub kernel_type: KernelType,
    /// Polynomial degree
    pub degree: i32,
    /// Kernel width; 0 means derive `1 / max_feature_index` from the data
    pub gamma: f64,
    pub coef0: f64,
    /// Stopping tolerance on the duality-gap proxy
    pub eps: f64,
    /// Regularization strength (C-SVC, epsilon-SVR, nu-SVR)
    pub c: f64,
    /// nu-SVC, one-class, nu-SVR
    pub nu: f64,
    /// Tube width for epsilon-SVR
    pub p: f64,
    /// Labels whose C is scaled by the matching entry of `weight`
    pub weight_label: Vec<i32>,
    pub weight: Vec<f64>,
    /// Fit pairwise sigmoid parameters for probability output
    pub probability: bool,
    /// Kernel column cache budget in MB
    pub cache_size: f64,
    /// Worker threads for column computation; 0 picks the machine default
    pub num_threads: usize,
    /// Overrides the default solver iteration cap
    pub max_iter: Option<usize>,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            svm_type: SvmType::CSvc,
            kernel_type: KernelType::Rbf,
            degree: 3,
            gamma: 0.0,
            coef0: 0.0,
            eps: 1e-3,
            c: 1.0,
            nu: 0.5,
            p: 0.1,
            weight_label: Vec::new(),
            weight: Vec::new(),
            probability: false,
            cache_size: 100.0,
            num_threads: 0,
            max_iter: None,
        }
    }
}

impl Parameter {
    /// Fill in `gamma = 1 / max_feature_index` when it was left at zero
    pub fn resolve_gamma(&mut self, problem: &Problem) {
        let max_index = problem.max_index();
        if self.gamma == 0.0 && max_index > 0 {
            self.gamma = 1.0 / f64::from(max_index);
        }
    }

    /// Validate the parameters against a training problem
    pub fn check(&self, problem: &Problem) -> Result<()> {
        if problem.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if self.gamma < 0.0 {
            return Err(invalid("gamma < 0"));
        }
        if self.kernel_type == KernelType::Polynomial && self.degree < 0 {
            return Err(invalid("degree of polynomial kernel < 0"));
        }
        if self.cache_size <= 0.0 {
            return Err(invalid("cache_size <= 0"));
        }
        if self.eps <= 0.0 {
            return Err(invalid("eps <= 0"));
        }
        if matches!(
            self.svm_type,
            SvmType::CSvc | SvmType::EpsilonSvr | SvmType::NuSvr
        ) && self.c <= 0.0
        {
            return Err(invalid("C <= 0"));
        }
        if matches!(
            self.svm_type,
            SvmType::NuSvc | SvmType::OneClass | SvmType::NuSvr
        ) && (self.nu <= 0.0 || self.nu > 1.0)
        {
            return Err(invalid("nu <= 0 or nu > 1"));
        }
        if self.svm_type == SvmType::EpsilonSvr && self.p < 0.0 {
            return Err(invalid("p < 0"));
        }
        if self.probability && !self.svm_type.is_classification() {
            return Err(invalid(
                "probability estimates are only available for classification",
            ));
        }
        if self.weight_label.len() != self.weight.len() {
            return Err(invalid("weight_label and weight differ in length"));
        }
        if self.svm_type == SvmType::NuSvc {
            self.check_nu_feasibility(problem)?;
        }
        Ok(())
    }

    fn check_nu_feasibility(&self, problem: &Problem) -> Result<()> {
        let mut labels: Vec<i32> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        for &y in &problem.y {
            let label = y as i32;
            match labels.iter().position(|&l| l == label) {
                Some(pos) => counts[pos] += 1,
                None => {
                    labels.push(label);
                    counts.push(1);
                }
            }
        }

        for i in 0..counts.len() {
            for j in i + 1..counts.len() {
                let (n1, n2) = (counts[i] as f64, counts[j] as f64);
                if self.nu * (n1 + n2) / 2.0 > n1.min(n2) {
                    return Err(invalid("specified nu is infeasible"));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> SVMError {
    SVMError::InvalidParameter(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;

    fn toy_problem(labels: &[f64]) -> Problem {
        let rows: Vec<SparseVector> = labels
            .iter()
            .enumerate()
            .map(|(i, _)| SparseVector::new(vec![1, 3], vec![i as f64, 1.0]))
            .collect();
        Problem::from_rows(labels, &rows)
    }

    #[test]
    fn test_parameter_defaults() {
        let param = Parameter::default();
        assert_eq!(param.svm_type, SvmType::CSvc);
        assert_eq!(param.kernel_type, KernelType::Rbf);
        assert_eq!(param.degree, 3);
        assert_eq!(param.c, 1.0);
        assert_eq!(param.nu, 0.5);
        assert_eq!(param.eps, 1e-3);
        assert_eq!(param.p, 0.1);
        assert!(!param.probability);
    }

    #[test]
    fn test_type_names_round_trip() {
        for ty in SvmType::ALL {
            assert_eq!(ty.name().parse::<SvmType>().unwrap(), ty);
        }
        for ty in KernelType::ALL {
            assert_eq!(ty.to_string().parse::<KernelType>().unwrap(), ty);
        }
        assert_eq!(SvmType::try_from(3).unwrap(), SvmType::EpsilonSvr);
        assert_eq!(KernelType::try_from(2).unwrap(), KernelType::Rbf);
    }

    #[test]
    fn test_unknown_types_are_configuration_errors() {
        assert!(matches!(
            "c_svm".parse::<SvmType>(),
            Err(SVMError::UnsupportedSvmType(_))
        ));
        assert!(matches!(
            SvmType::try_from(7),
            Err(SVMError::UnsupportedSvmType(_))
        ));
        assert!(matches!(
            "laplacian".parse::<KernelType>(),
            Err(SVMError::UnsupportedKernel(_))
        ));
        assert!(matches!(
            KernelType::try_from(-1),
            Err(SVMError::UnsupportedKernel(_))
        ));
    }

    #[test]
    fn test_resolve_gamma() {
        let problem = toy_problem(&[1.0, -1.0]);
        let mut param = Parameter::default();
        param.resolve_gamma(&problem);
        assert_eq!(param.gamma, 1.0 / 3.0);

        param.gamma = 0.25;
        param.resolve_gamma(&problem);
        assert_eq!(param.gamma, 0.25);
    }

    #[test]
    fn test_check_rejects_bad_values() {
        let problem = toy_problem(&[1.0, -1.0]);

        let mut param = Parameter::default();
        param.c = 0.0;
        assert!(matches!(
            param.check(&problem),
            Err(SVMError::InvalidParameter(_))
        ));

        let mut param = Parameter::default();
        param.svm_type = SvmType::OneClass;
        param.nu = 1.5;
        assert!(param.check(&problem).is_err());

        let mut param = Parameter::default();
        param.svm_type = SvmType::EpsilonSvr;
        param.probability = true;
        assert!(param.check(&problem).is_err());

        assert!(matches!(
            Parameter::default().check(&Problem::new()),
            Err(SVMError::EmptyDataset)
        ));
    }

    #[test]
    fn test_nu_svc_feasibility() {
        let problem = toy_problem(&[1.0, 1.0, 1.0, -1.0]);
        let mut param = Parameter::default();
        param.svm_type = SvmType::NuSvc;

        param.nu = 0.9;
        assert!(param.check(&problem).is_err());

        param.nu = 0.5;
        assert!(param.check(&problem).is_ok());
    }
}
