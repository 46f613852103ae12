//! Dual formulations of the five SVM types
//!
//! Each function sets up the linear term, signs and a feasible starting
//! alpha for its problem, runs the solver and maps the solution back to one
//! signed coefficient per training row.

use crate::core::{Parameter, Problem, Result, SVMError};
use crate::qmatrix::{OneClassQ, QMatrixKind, SvcQ, SvrQ};
use crate::solver::{Solution, Solver, WorkingSetSelector};
use log::debug;

/// Signs of a binary sub-problem: +1 for positive labels, -1 otherwise
fn label_signs(problem: &Problem) -> Vec<i8> {
    problem
        .y
        .iter()
        .map(|&y| if y > 0.0 { 1 } else { -1 })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn run(
    q: QMatrixKind<'_>,
    p: Vec<f64>,
    y: Vec<i8>,
    alpha: Vec<f64>,
    cp: f64,
    cn: f64,
    param: &Parameter,
    selector: WorkingSetSelector,
) -> Solution {
    let mut solver = Solver::new(q, p, y, alpha, cp, cn, param.eps).with_selector(selector);
    if let Some(max_iter) = param.max_iter {
        solver = solver.with_max_iter(max_iter);
    }
    solver.solve()
}

pub fn solve_c_svc(problem: &Problem, param: &Parameter, cp: f64, cn: f64) -> Result<Solution> {
    let l = problem.len();
    let y = label_signs(problem);
    let q = QMatrixKind::Svc(SvcQ::new(problem, param, &y)?);

    let mut si = run(
        q,
        vec![-1.0; l],
        y.clone(),
        vec![0.0; l],
        cp,
        cn,
        param,
        WorkingSetSelector::Standard,
    );

    let sum_alpha: f64 = si.alpha.iter().sum();
    if cp == cn {
        debug!("nu = {}", sum_alpha / (cp * l as f64));
    }
    for (a, &s) in si.alpha.iter_mut().zip(&y) {
        *a *= f64::from(s);
    }

    Ok(si)
}

pub fn solve_nu_svc(problem: &Problem, param: &Parameter) -> Result<Solution> {
    let l = problem.len();
    let y = label_signs(problem);

    let mut sum_pos = param.nu * l as f64 / 2.0;
    let mut sum_neg = sum_pos;
    let alpha: Vec<f64> = y
        .iter()
        .map(|&s| {
            let sum = if s == 1 { &mut sum_pos } else { &mut sum_neg };
            let a = sum.min(1.0);
            *sum -= a;
            a
        })
        .collect();

    let q = QMatrixKind::Svc(SvcQ::new(problem, param, &y)?);
    let mut si = run(
        q,
        vec![0.0; l],
        y.clone(),
        alpha,
        1.0,
        1.0,
        param,
        WorkingSetSelector::Nu,
    );

    let r = si.r;
    if r <= 0.0 {
        return Err(SVMError::TrainingFailed(format!(
            "nu-SVC solution has non-positive margin scale r = {r}"
        )));
    }
    debug!("C = {}", 1.0 / r);

    for (a, &s) in si.alpha.iter_mut().zip(&y) {
        *a *= f64::from(s) / r;
    }
    si.rho /= r;
    si.obj /= r * r;
    si.upper_bound_p = 1.0 / r;
    si.upper_bound_n = 1.0 / r;

    Ok(si)
}

pub fn solve_one_class(problem: &Problem, param: &Parameter) -> Result<Solution> {
    let l = problem.len();
    let total = param.nu * l as f64;
    let n = (total.floor() as usize).min(l);

    let mut alpha = vec![0.0; l];
    alpha[..n].fill(1.0);
    if n < l {
        alpha[n] = total - n as f64;
    }

    let q = QMatrixKind::OneClass(OneClassQ::new(problem, param)?);
    Ok(run(
        q,
        vec![0.0; l],
        vec![1; l],
        alpha,
        1.0,
        1.0,
        param,
        WorkingSetSelector::Standard,
    ))
}

/// Fold the `2l` regression variables back into `alpha_i - alpha*_i`
fn fold_svr_alpha(si: &mut Solution, l: usize) {
    let (alpha, alpha_star) = si.alpha.split_at(l);
    si.alpha = alpha.iter().zip(alpha_star).map(|(a, s)| a - s).collect();
}

pub fn solve_epsilon_svr(problem: &Problem, param: &Parameter) -> Result<Solution> {
    let l = problem.len();
    let mut linear_term = Vec::with_capacity(2 * l);
    linear_term.extend(problem.y.iter().map(|&t| param.p - t));
    linear_term.extend(problem.y.iter().map(|&t| param.p + t));
    let y: Vec<i8> = (0..2 * l).map(|i| if i < l { 1 } else { -1 }).collect();

    let q = QMatrixKind::Svr(SvrQ::new(problem, param)?);
    let mut si = run(
        q,
        linear_term,
        y,
        vec![0.0; 2 * l],
        param.c,
        param.c,
        param,
        WorkingSetSelector::Standard,
    );

    fold_svr_alpha(&mut si, l);
    let sum_alpha: f64 = si.alpha.iter().map(|a| a.abs()).sum();
    debug!("nu = {}", sum_alpha / (param.c * l as f64));

    Ok(si)
}

pub fn solve_nu_svr(problem: &Problem, param: &Parameter) -> Result<Solution> {
    let l = problem.len();
    let c = param.c;

    let mut sum = c * param.nu * l as f64 / 2.0;
    let mut alpha = vec![0.0; 2 * l];
    for i in 0..l {
        let a = sum.min(c);
        alpha[i] = a;
        alpha[i + l] = a;
        sum -= a;
    }

    let mut linear_term = Vec::with_capacity(2 * l);
    linear_term.extend(problem.y.iter().map(|&t| -t));
    linear_term.extend(problem.y.iter().copied());
    let y: Vec<i8> = (0..2 * l).map(|i| if i < l { 1 } else { -1 }).collect();

    let q = QMatrixKind::Svr(SvrQ::new(problem, param)?);
    let mut si = run(
        q,
        linear_term,
        y,
        alpha,
        c,
        c,
        param,
        WorkingSetSelector::Nu,
    );

    debug!("epsilon = {}", -si.r);
    fold_svr_alpha(&mut si, l);

    Ok(si)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, SparseVector, SvmType};
    use approx::assert_relative_eq;

    fn line_problem(targets: &[f64]) -> Problem {
        let rows: Vec<SparseVector> = (0..targets.len())
            .map(|i| SparseVector::new(vec![1], vec![i as f64 / 4.0]))
            .collect();
        Problem::from_rows(targets, &rows)
    }

    fn linear(svm_type: SvmType) -> Parameter {
        Parameter {
            svm_type,
            kernel_type: KernelType::Linear,
            ..Parameter::default()
        }
    }

    #[test]
    fn test_c_svc_coefficients_carry_label_sign() {
        let problem = line_problem(&[-1.0, -1.0, 1.0, 1.0]);
        let si = solve_c_svc(&problem, &linear(SvmType::CSvc), 5.0, 5.0).unwrap();

        assert!(si.alpha[0] <= 0.0 && si.alpha[1] <= 0.0);
        assert!(si.alpha[2] >= 0.0 && si.alpha[3] >= 0.0);
        assert_relative_eq!(si.alpha.iter().sum::<f64>(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_nu_svc_rescales_bounds() {
        let problem = line_problem(&[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
        let mut param = linear(SvmType::NuSvc);
        param.nu = 0.5;
        let si = solve_nu_svc(&problem, &param).unwrap();

        assert_eq!(si.upper_bound_p, si.upper_bound_n);
        for &a in &si.alpha {
            assert!(a.abs() <= si.upper_bound_p + 1e-12);
        }
        assert_relative_eq!(si.alpha.iter().sum::<f64>(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_one_class_starting_mass() {
        let problem = line_problem(&[1.0; 5]);
        let mut param = linear(SvmType::OneClass);
        param.kernel_type = KernelType::Rbf;
        param.gamma = 1.0;
        param.nu = 0.5;
        let si = solve_one_class(&problem, &param).unwrap();

        // nu * l = 2.5 is conserved by every step
        assert_relative_eq!(si.alpha.iter().sum::<f64>(), 2.5, epsilon = 1e-10);
    }

    #[test]
    fn test_epsilon_svr_folds_to_l_coefficients() {
        let problem = line_problem(&[0.0, 0.5, 1.0, 1.5, 2.0]);
        let mut param = linear(SvmType::EpsilonSvr);
        param.c = 10.0;
        param.p = 0.01;
        let si = solve_epsilon_svr(&problem, &param).unwrap();

        assert_eq!(si.alpha.len(), 5);
        assert_relative_eq!(si.alpha.iter().sum::<f64>(), 0.0, epsilon = 1e-10);
        // f(x) = 2x fits exactly: w = sum(coef * x) and f(0) = -rho
        let w: f64 = si
            .alpha
            .iter()
            .enumerate()
            .map(|(i, a)| a * i as f64 / 4.0)
            .sum();
        assert_relative_eq!(w, 2.0, epsilon = 0.05);
        assert_relative_eq!(-si.rho, 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_nu_svr_folds_to_l_coefficients() {
        let problem = line_problem(&[0.1, 0.4, 1.1, 1.4, 2.2]);
        let mut param = linear(SvmType::NuSvr);
        param.c = 1.0;
        let si = solve_nu_svr(&problem, &param).unwrap();

        assert_eq!(si.alpha.len(), 5);
        assert!(si.alpha.iter().all(|a| a.abs() <= 1.0 + 1e-12));
        assert_relative_eq!(si.alpha.iter().sum::<f64>(), 0.0, epsilon = 1e-10);
    }
}
