//! Trained SVM model
//!
//! A model owns a compacted copy of its support vectors: every SV row is
//! copied into `sv_space` and closed by a terminator, and `sv` holds the
//! start offset of each row. Per class pair values (`rho`, `prob_a`,
//! `prob_b`) are ordered `(0,1), (0,2), ..., (0,k-1), (1,2), ...`.

pub mod text;

use crate::core::{row_entries, KernelType, Parameter, Problem, Result, SVMError, SvmNode, SvmType};
use serde::{Deserialize, Serialize};

/// Trained model, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub(crate) param: Parameter,
    /// Number of classes; 2 for regression and one-class models
    pub(crate) nr_class: usize,
    pub(crate) sv_space: Vec<SvmNode>,
    pub(crate) sv: Vec<usize>,
    /// `nr_class - 1` rows of `total_sv` coefficients
    pub(crate) sv_coef: Vec<Vec<f64>>,
    pub(crate) rho: Vec<f64>,
    /// Class labels in training order; empty for regression and one-class
    pub(crate) label: Vec<i32>,
    /// Support vectors per class, aligned with `label`
    pub(crate) n_sv: Vec<usize>,
    /// 1-based training row of each support vector
    pub(crate) sv_indices: Vec<usize>,
    pub(crate) prob_a: Option<Vec<f64>>,
    pub(crate) prob_b: Option<Vec<f64>>,
}

impl Model {
    pub fn param(&self) -> &Parameter {
        &self.param
    }

    pub fn svm_type(&self) -> SvmType {
        self.param.svm_type
    }

    pub fn nr_class(&self) -> usize {
        self.nr_class
    }

    pub fn labels(&self) -> &[i32] {
        &self.label
    }

    pub fn total_sv(&self) -> usize {
        self.sv.len()
    }

    pub fn n_sv(&self) -> &[usize] {
        &self.n_sv
    }

    pub fn rho(&self) -> &[f64] {
        &self.rho
    }

    pub fn sv_coef(&self) -> &[Vec<f64>] {
        &self.sv_coef
    }

    pub fn sv_indices(&self) -> &[usize] {
        &self.sv_indices
    }

    /// Whether pairwise sigmoid parameters are available
    pub fn has_probability(&self) -> bool {
        self.param.svm_type.is_classification() && self.prob_a.is_some() && self.prob_b.is_some()
    }

    pub fn prob_a(&self) -> Option<&[f64]> {
        self.prob_a.as_deref()
    }

    pub fn prob_b(&self) -> Option<&[f64]> {
        self.prob_b.as_deref()
    }

    /// Sentinel-terminated row of support vector `k`
    pub fn support_vector(&self, k: usize) -> &[SvmNode] {
        &self.sv_space[self.sv[k]..]
    }

    /// Number of class pairs, which is the length of `rho`
    pub fn nr_pairs(&self) -> usize {
        if self.param.svm_type.is_classification() {
            self.nr_class * self.nr_class.saturating_sub(1) / 2
        } else {
            1
        }
    }

    /// Check that the per-class and per-pair tables agree with `nr_class`
    /// and the support vector count
    ///
    /// Models read from disk go through this before they are handed out, so
    /// prediction can index the tables freely.
    pub fn validate(&self) -> Result<()> {
        let classification = self.param.svm_type.is_classification();
        if classification && self.nr_class == 0 {
            return Err(SVMError::ModelFormat(
                "nr_class must be at least 1".to_string(),
            ));
        }
        if !classification && self.nr_class != 2 {
            return Err(SVMError::ModelFormat(format!(
                "{} models have nr_class 2, got {}",
                self.param.svm_type, self.nr_class
            )));
        }

        let total_sv = self.total_sv();
        let nr_pairs = self.nr_pairs();
        check_count("rho", self.rho.len(), nr_pairs)?;
        check_count("coefficient rows", self.sv_coef.len(), self.nr_class - 1)?;
        for coef in &self.sv_coef {
            check_count("coefficients", coef.len(), total_sv)?;
        }

        if classification {
            check_count("label", self.label.len(), self.nr_class)?;
            check_count("nr_sv", self.n_sv.len(), self.nr_class)?;
            check_count("nr_sv total", self.n_sv.iter().sum(), total_sv)?;
        }
        if let Some(prob_a) = &self.prob_a {
            check_count("probA", prob_a.len(), nr_pairs)?;
        }
        if let Some(prob_b) = &self.prob_b {
            check_count("probB", prob_b.len(), nr_pairs)?;
        }
        if !self.sv_indices.is_empty() {
            check_count("sv_indices", self.sv_indices.len(), total_sv)?;
        }

        let terminated = self.sv_space.last().map_or(total_sv == 0, SvmNode::is_terminator);
        if !terminated || self.sv.iter().any(|&offset| offset >= self.sv_space.len()) {
            return Err(SVMError::ModelFormat(
                "support vector rows are not terminated".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_count(key: &str, len: usize, expected: usize) -> Result<()> {
    if len == expected {
        Ok(())
    } else {
        Err(SVMError::ModelFormat(format!(
            "{} has {} values, expected {}",
            key, len, expected
        )))
    }
}

/// Copy the selected training rows into a fresh terminated arena
///
/// Precomputed-kernel rows only keep their `0:ID` entry, which is all the
/// predictor reads from a support vector.
pub(crate) fn compact_rows<I>(problem: &Problem, rows: I, kernel_type: KernelType) -> (Vec<SvmNode>, Vec<usize>)
where
    I: IntoIterator<Item = usize>,
{
    let mut space = Vec::new();
    let mut offsets = Vec::new();

    for r in rows {
        offsets.push(space.len());
        let row = row_entries(problem.row(r));
        if kernel_type == KernelType::Precomputed {
            space.extend(row.take(1).copied());
        } else {
            space.extend(row.copied());
        }
        space.push(SvmNode::terminator());
    }

    (space, offsets)
}
