//! Training decomposition
//!
//! Classification trains one binary machine per unordered pair of classes
//! (one-vs-one) and merges their support vectors into a single model.
//! Regression and one-class detection solve a single problem.

pub mod formulations;

pub use self::formulations::*;

use crate::core::{Parameter, Problem, Result, SvmType};
use crate::model::{compact_rows, Model};
use crate::probability::binary_svc_probability;
use log::{debug, info, warn};

/// Coefficients and offset of one binary sub-problem
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub alpha: Vec<f64>,
    pub rho: f64,
}

/// Training rows grouped by class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGroups {
    /// Labels in order of first occurrence
    pub labels: Vec<i32>,
    /// Offset of each class inside `perm`
    pub start: Vec<usize>,
    pub count: Vec<usize>,
    /// Training row indices, grouped class by class
    pub perm: Vec<usize>,
}

impl ClassGroups {
    pub fn nr_class(&self) -> usize {
        self.labels.len()
    }

    /// Training rows of class `c`
    pub fn rows(&self, c: usize) -> &[usize] {
        &self.perm[self.start[c]..self.start[c] + self.count[c]]
    }
}

/// Group training rows by label
///
/// Labels keep their first-occurrence order, except that a `{-1, +1}`
/// problem starting with -1 is swapped so that +1 is class 0.
pub fn group_classes(problem: &Problem) -> ClassGroups {
    let mut labels: Vec<i32> = Vec::new();
    let mut count: Vec<usize> = Vec::new();
    let mut data_label = Vec::with_capacity(problem.len());

    for &y in &problem.y {
        let this_label = y as i32;
        let class = match labels.iter().position(|&l| l == this_label) {
            Some(c) => {
                count[c] += 1;
                c
            }
            None => {
                labels.push(this_label);
                count.push(1);
                labels.len() - 1
            }
        };
        data_label.push(class);
    }

    if labels == [-1, 1] {
        labels.swap(0, 1);
        count.swap(0, 1);
        for class in &mut data_label {
            *class = 1 - *class;
        }
    }

    let mut start = vec![0; labels.len()];
    for c in 1..labels.len() {
        start[c] = start[c - 1] + count[c - 1];
    }

    let mut next = start.clone();
    let mut perm = vec![0; problem.len()];
    for (i, &class) in data_label.iter().enumerate() {
        perm[next[class]] = i;
        next[class] += 1;
    }

    ClassGroups {
        labels,
        start,
        count,
        perm,
    }
}

/// Solve one binary or single-problem formulation
pub fn train_one(problem: &Problem, param: &Parameter, cp: f64, cn: f64) -> Result<Decision> {
    let si = match param.svm_type {
        SvmType::CSvc => solve_c_svc(problem, param, cp, cn)?,
        SvmType::NuSvc => solve_nu_svc(problem, param)?,
        SvmType::OneClass => solve_one_class(problem, param)?,
        SvmType::EpsilonSvr => solve_epsilon_svr(problem, param)?,
        SvmType::NuSvr => solve_nu_svr(problem, param)?,
    };
    debug!("obj = {}, rho = {}", si.obj, si.rho);

    let mut n_sv = 0;
    let mut n_bsv = 0;
    for (&a, &y) in si.alpha.iter().zip(&problem.y) {
        if a.abs() > 0.0 {
            n_sv += 1;
            let bound = if y > 0.0 {
                si.upper_bound_p
            } else {
                si.upper_bound_n
            };
            if a.abs() >= bound {
                n_bsv += 1;
            }
        }
    }
    debug!("nSV = {n_sv}, nBSV = {n_bsv}");

    Ok(Decision {
        alpha: si.alpha,
        rho: si.rho,
    })
}

/// Train a model on `problem`
///
/// The parameters are validated first; a zero `gamma` is replaced by
/// `1 / max_feature_index` and stored in the model.
pub fn train(problem: &Problem, param: &Parameter) -> Result<Model> {
    param.check(problem)?;
    let mut param = param.clone();
    param.resolve_gamma(problem);

    let model = if param.svm_type.is_classification() {
        train_classification(problem, param)
    } else {
        train_single(problem, param)?
    };
    info!("Total nSV = {}", model.total_sv());
    Ok(model)
}

fn weighted_c(param: &Parameter, labels: &[i32]) -> Vec<f64> {
    let mut weighted = vec![param.c; labels.len()];
    for (&weight_label, &weight) in param.weight_label.iter().zip(&param.weight) {
        match labels.iter().position(|&l| l == weight_label) {
            Some(c) => weighted[c] *= weight,
            None => warn!("class label {weight_label} specified in weight is not found"),
        }
    }
    weighted
}

fn train_classification(problem: &Problem, param: Parameter) -> Model {
    let groups = group_classes(problem);
    let nr_class = groups.nr_class();
    if nr_class == 1 {
        warn!("training data contains only one class");
    }
    let weighted = weighted_c(&param, &groups.labels);

    let l = problem.len();
    let mut nonzero = vec![false; l];
    let mut decisions = Vec::new();
    let mut prob_a = Vec::new();
    let mut prob_b = Vec::new();

    for i in 0..nr_class {
        for j in i + 1..nr_class {
            let (rows_i, rows_j) = (groups.rows(i), groups.rows(j));
            let (ci, cj) = (rows_i.len(), rows_j.len());

            let rows: Vec<usize> = rows_i.iter().chain(rows_j).copied().collect();
            let signs: Vec<f64> = (0..ci + cj)
                .map(|k| if k < ci { 1.0 } else { -1.0 })
                .collect();
            let sub = problem.subset(&rows, signs);

            if param.probability {
                let (a, b) = binary_svc_probability(&sub, &param, weighted[i], weighted[j])
                    .unwrap_or_else(|err| {
                        warn!(
                            "probability estimation failed for classes {} and {}: {err}",
                            groups.labels[i], groups.labels[j]
                        );
                        (0.0, 0.0)
                    });
                prob_a.push(a);
                prob_b.push(b);
            }

            let decision = match train_one(&sub, &param, weighted[i], weighted[j]) {
                Ok(decision) => decision,
                Err(err) => {
                    warn!(
                        "training failed for classes {} and {}: {err}",
                        groups.labels[i], groups.labels[j]
                    );
                    Decision {
                        alpha: vec![0.0; ci + cj],
                        rho: 0.0,
                    }
                }
            };

            let start_i = groups.start[i];
            let start_j = groups.start[j];
            for k in 0..ci {
                if decision.alpha[k].abs() > 0.0 {
                    nonzero[start_i + k] = true;
                }
            }
            for k in 0..cj {
                if decision.alpha[ci + k].abs() > 0.0 {
                    nonzero[start_j + k] = true;
                }
            }
            decisions.push(decision);
        }
    }

    let n_sv: Vec<usize> = (0..nr_class)
        .map(|c| {
            let start = groups.start[c];
            (start..start + groups.count[c])
                .filter(|&k| nonzero[k])
                .count()
        })
        .collect();
    let total_sv: usize = n_sv.iter().sum();

    let sv_positions: Vec<usize> = (0..l).filter(|&k| nonzero[k]).collect();
    let (sv_space, sv) = compact_rows(
        problem,
        sv_positions.iter().map(|&k| groups.perm[k]),
        param.kernel_type,
    );
    let sv_indices = sv_positions.iter().map(|&k| groups.perm[k] + 1).collect();

    let mut nz_start = vec![0; nr_class];
    for c in 1..nr_class {
        nz_start[c] = nz_start[c - 1] + n_sv[c - 1];
    }

    // classifier (i, j): coefficients of class i go to sv_coef[j - 1],
    // those of class j to sv_coef[i]
    let mut sv_coef = vec![vec![0.0; total_sv]; nr_class.saturating_sub(1)];
    let mut pair = 0;
    for i in 0..nr_class {
        for j in i + 1..nr_class {
            let decision = &decisions[pair];
            let ci = groups.count[i];

            let mut q = nz_start[i];
            for k in 0..ci {
                if nonzero[groups.start[i] + k] {
                    sv_coef[j - 1][q] = decision.alpha[k];
                    q += 1;
                }
            }
            let mut q = nz_start[j];
            for k in 0..groups.count[j] {
                if nonzero[groups.start[j] + k] {
                    sv_coef[i][q] = decision.alpha[ci + k];
                    q += 1;
                }
            }
            pair += 1;
        }
    }

    let probability = param.probability;
    Model {
        param,
        nr_class,
        sv_space,
        sv,
        sv_coef,
        rho: decisions.iter().map(|d| d.rho).collect(),
        label: groups.labels,
        n_sv,
        sv_indices,
        prob_a: probability.then_some(prob_a),
        prob_b: probability.then_some(prob_b),
    }
}

/// One-class and regression: a single problem, failures are reported
fn train_single(problem: &Problem, param: Parameter) -> Result<Model> {
    let decision = train_one(problem, &param, 0.0, 0.0)?;

    let rows: Vec<usize> = (0..problem.len())
        .filter(|&i| decision.alpha[i].abs() > 0.0)
        .collect();
    let (sv_space, sv) = compact_rows(problem, rows.iter().copied(), param.kernel_type);
    let coef = rows.iter().map(|&i| decision.alpha[i]).collect();

    Ok(Model {
        param,
        nr_class: 2,
        sv_space,
        sv,
        sv_coef: vec![coef],
        rho: vec![decision.rho],
        label: Vec::new(),
        n_sv: Vec::new(),
        sv_indices: rows.iter().map(|&i| i + 1).collect(),
        prob_a: None,
        prob_b: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, SVMError, SparseVector};

    fn problem(labels: &[f64]) -> Problem {
        let rows: Vec<SparseVector> = labels
            .iter()
            .enumerate()
            .map(|(i, &y)| SparseVector::from_dense(&[y + 0.1 * i as f64, 1.0]))
            .collect();
        Problem::from_rows(labels, &rows)
    }

    #[test]
    fn test_group_classes_first_occurrence() {
        let groups = group_classes(&problem(&[3.0, 1.0, 3.0, 2.0, 1.0]));
        assert_eq!(groups.labels, vec![3, 1, 2]);
        assert_eq!(groups.count, vec![2, 2, 1]);
        assert_eq!(groups.start, vec![0, 2, 4]);
        assert_eq!(groups.perm, vec![0, 2, 1, 4, 3]);
        assert_eq!(groups.rows(1), &[1, 4]);
    }

    #[test]
    fn test_group_classes_swaps_minus_one_first() {
        let groups = group_classes(&problem(&[-1.0, 1.0, -1.0, 1.0, 1.0]));
        assert_eq!(groups.labels, vec![1, -1]);
        assert_eq!(groups.count, vec![3, 2]);
        assert_eq!(groups.perm, vec![1, 3, 4, 0, 2]);
    }

    #[test]
    fn test_weighted_c_ignores_unknown_labels() {
        let param = Parameter {
            c: 2.0,
            weight_label: vec![5, 7],
            weight: vec![3.0, 10.0],
            ..Parameter::default()
        };
        assert_eq!(weighted_c(&param, &[1, 5]), vec![2.0, 6.0]);
    }

    #[test]
    fn test_three_class_model_layout() {
        let labels = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let rows = vec![
            SparseVector::from_dense(&[0.0, 0.1]),
            SparseVector::from_dense(&[0.2, 0.0]),
            SparseVector::from_dense(&[5.0, 0.0]),
            SparseVector::from_dense(&[5.2, 0.3]),
            SparseVector::from_dense(&[0.0, 5.0]),
            SparseVector::from_dense(&[0.4, 5.3]),
        ];
        let problem = Problem::from_rows(&labels, &rows);
        let param = Parameter {
            kernel_type: KernelType::Linear,
            c: 10.0,
            ..Parameter::default()
        };

        let model = train(&problem, &param).unwrap();
        assert_eq!(model.nr_class(), 3);
        assert_eq!(model.labels(), &[0, 1, 2]);
        assert_eq!(model.rho().len(), 3);
        assert_eq!(model.sv_coef().len(), 2);
        assert_eq!(model.n_sv().iter().sum::<usize>(), model.total_sv());
        for row in model.sv_coef() {
            assert_eq!(row.len(), model.total_sv());
        }
        assert!(model.sv_indices().windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn test_regression_model_has_one_row() {
        let targets = [0.0, 0.5, 1.0, 1.5];
        let rows: Vec<SparseVector> = (0..4)
            .map(|i| SparseVector::new(vec![1], vec![i as f64]))
            .collect();
        let problem = Problem::from_rows(&targets, &rows);
        let param = Parameter {
            svm_type: SvmType::EpsilonSvr,
            kernel_type: KernelType::Linear,
            ..Parameter::default()
        };

        let model = train(&problem, &param).unwrap();
        assert_eq!(model.nr_class(), 2);
        assert_eq!(model.rho().len(), 1);
        assert_eq!(model.sv_coef().len(), 1);
        assert!(model.labels().is_empty());
        assert!(model.sv_indices().iter().all(|&i| (1..=4).contains(&i)));
    }

    #[test]
    fn test_invalid_parameters_are_reported() {
        let param = Parameter {
            c: -1.0,
            ..Parameter::default()
        };
        assert!(matches!(
            train(&problem(&[1.0, -1.0]), &param),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_gamma_is_resolved_into_model() {
        let model = train(&problem(&[1.0, -1.0, 1.0]), &Parameter::default()).unwrap();
        assert_eq!(model.param().gamma, 0.5);
    }

    #[test]
    fn test_failed_pair_keeps_pair_alignment() {
        // rows lack the 0:ID serial, so the precomputed kernel cannot be built
        let param = Parameter {
            kernel_type: KernelType::Precomputed,
            ..Parameter::default()
        };
        let model = train(&problem(&[1.0, 2.0, 3.0]), &param).unwrap();
        assert_eq!(model.rho(), &[0.0, 0.0, 0.0]);
        assert_eq!(model.total_sv(), 0);
    }
}
