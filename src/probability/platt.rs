//! Platt scaling
//!
//! Fits the sigmoid parameters of one class pair from decision values the
//! pair's machine produces on rows it was not trained on.

use crate::core::{Parameter, Problem, Result};
use crate::kernel::k_function;
use crate::train::train_one;
use log::debug;

/// Number of cross-validation folds used to collect decision values
pub const NR_FOLD: usize = 5;

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPS: f64 = 1e-5;

/// Cross-entropy of the sigmoid at `(a, b)` against the smoothed targets
fn objective(dec_values: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    dec_values
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let f_apb = f * a + b;
            if f_apb >= 0.0 {
                t * f_apb + (1.0 + (-f_apb).exp()).ln()
            } else {
                (t - 1.0) * f_apb + (1.0 + f_apb.exp()).ln()
            }
        })
        .sum()
}

/// Fit `(A, B)` by Newton's method with backtracking line search
///
/// `labels` are compared against zero: positive values form the +1 class.
pub fn sigmoid_train(dec_values: &[f64], labels: &[f64]) -> (f64, f64) {
    let prior1 = labels.iter().filter(|&&y| y > 0.0).count() as f64;
    let prior0 = labels.len() as f64 - prior1;

    let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
    let lo_target = 1.0 / (prior0 + 2.0);
    let targets: Vec<f64> = labels
        .iter()
        .map(|&y| if y > 0.0 { hi_target } else { lo_target })
        .collect();

    let mut a = 0.0;
    let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
    let mut fval = objective(dec_values, &targets, a, b);

    for _ in 0..MAX_ITER {
        let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
        let (mut g1, mut g2) = (0.0, 0.0);

        for (&f, &t) in dec_values.iter().zip(&targets) {
            let f_apb = f * a + b;
            let (p, q) = if f_apb >= 0.0 {
                let e = (-f_apb).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = f_apb.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = t - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < EPS && g2.abs() < EPS {
            break;
        }

        let det = h11 * h22 - h21 * h21;
        let da = -(h22 * g1 - h21 * g2) / det;
        let db = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * da + g2 * db;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let (new_a, new_b) = (a + step * da, b + step * db);
            let new_f = objective(dec_values, &targets, new_a, new_b);
            if new_f < fval + 0.0001 * step * gd {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }

        if step < MIN_STEP {
            debug!("Line search fails in two-class probability estimates");
            break;
        }
    }

    (a, b)
}

/// Sigmoid parameters for one binary sub-problem
///
/// Row `k` is held out in fold `k % NR_FOLD`. Each fold's machine is trained
/// on the remaining rows; a training fold with a single class predicts +1 or
/// -1 for its held-out rows instead.
pub fn binary_svc_probability(problem: &Problem, param: &Parameter, cp: f64, cn: f64) -> Result<(f64, f64)> {
    let l = problem.len();
    let mut dec_values = vec![0.0; l];

    for fold in 0..NR_FOLD {
        let (held_out, kept): (Vec<usize>, Vec<usize>) = (0..l).partition(|&k| k % NR_FOLD == fold);
        if held_out.is_empty() {
            continue;
        }

        let positives = kept.iter().filter(|&&k| problem.y[k] > 0.0).count();
        let negatives = kept.len() - positives;

        if positives == 0 || negatives == 0 {
            let value = match (positives, negatives) {
                (0, 0) => 0.0,
                (_, 0) => 1.0,
                _ => -1.0,
            };
            for &k in &held_out {
                dec_values[k] = value;
            }
            continue;
        }

        let labels = kept.iter().map(|&k| problem.y[k]).collect();
        let sub = problem.subset(&kept, labels);
        let decision = train_one(&sub, param, cp, cn)?;

        for &t in &held_out {
            let query = problem.row(t);
            let sum: f64 = decision
                .alpha
                .iter()
                .enumerate()
                .filter(|(_, &a)| a != 0.0)
                .map(|(s, &a)| a * k_function(query, sub.row(s), param))
                .sum();
            dec_values[t] = sum - decision.rho;
        }
    }

    Ok(sigmoid_train(&dec_values, &problem.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, SparseVector};
    use crate::probability::sigmoid_predict;

    #[test]
    fn test_sigmoid_train_orders_probabilities() {
        let dec = [2.0, 1.5, 0.8, 0.3, -0.2, -0.9, -1.4, -2.2];
        let labels = [1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0];
        let (a, b) = sigmoid_train(&dec, &labels);

        assert!(a.is_finite() && b.is_finite());
        assert!(a < 0.0);
        assert!(sigmoid_predict(2.0, a, b) > 0.5);
        assert!(sigmoid_predict(-2.0, a, b) < 0.5);
    }

    #[test]
    fn test_sigmoid_train_prior_only() {
        let (a, b) = sigmoid_train(&[0.0; 4], &[1.0, 1.0, 1.0, -1.0]);
        // with no signal the sigmoid reduces to the smoothed prior
        assert!(a.abs() < 1e-6);
        assert!(sigmoid_predict(0.0, a, b) > 0.5);
    }

    #[test]
    fn test_binary_probability_on_separable_pair() {
        let rows: Vec<SparseVector> = (0..20)
            .map(|i| {
                let x = if i < 10 { 1.0 + i as f64 * 0.1 } else { -1.0 - (i - 10) as f64 * 0.1 };
                SparseVector::from_dense(&[x, 0.5])
            })
            .collect();
        let labels: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { -1.0 }).collect();
        let problem = Problem::from_rows(&labels, &rows);
        let param = Parameter {
            kernel_type: KernelType::Linear,
            ..Parameter::default()
        };

        let (a, b) = binary_svc_probability(&problem, &param, 1.0, 1.0).unwrap();
        assert!(a < 0.0);
        assert!(sigmoid_predict(1.0, a, b) > 0.5);
    }
}
