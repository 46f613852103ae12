//! Probability calibration
//!
//! Pairwise decision values are mapped to probabilities with a fitted
//! sigmoid `1 / (1 + exp(A * f + B))` and the pairwise estimates are
//! coupled into one distribution over the classes.

pub mod platt;

pub use self::platt::{binary_svc_probability, sigmoid_train};

use log::warn;

/// Floor and ceiling applied to pairwise probabilities
pub const MIN_PROB: f64 = 1e-7;

/// Numerically stable `1 / (1 + exp(A * f + B))`
pub fn sigmoid_predict(decision_value: f64, a: f64, b: f64) -> f64 {
    let f_apb = decision_value * a + b;
    if f_apb >= 0.0 {
        (-f_apb).exp() / (1.0 + (-f_apb).exp())
    } else {
        1.0 / (1.0 + f_apb.exp())
    }
}

/// Pairwise probability clamped to `[MIN_PROB, 1 - MIN_PROB]`
pub fn pairwise_probability(decision_value: f64, a: f64, b: f64) -> f64 {
    sigmoid_predict(decision_value, a, b).clamp(MIN_PROB, 1.0 - MIN_PROB)
}

/// Couple pairwise probabilities `r[i][j] = P(i | i or j)` into class
/// probabilities
///
/// Solves `min_p 0.5 * p^T Q p` subject to `sum(p) = 1` by fixed-point
/// iteration, stopping once `max_t |(Qp)_t - p^T Q p| < 0.005 / k`. Hitting
/// the iteration cap is logged and the current estimate returned.
pub fn multiclass_probability(r: &[Vec<f64>]) -> Vec<f64> {
    let k = r.len();
    let mut p = vec![1.0 / k as f64; k];
    let mut q = vec![vec![0.0; k]; k];
    let mut qp = vec![0.0; k];
    let eps = 0.005 / k as f64;

    for t in 0..k {
        for j in 0..t {
            q[t][t] += r[j][t] * r[j][t];
            q[t][j] = q[j][t];
        }
        for j in t + 1..k {
            q[t][t] += r[j][t] * r[j][t];
            q[t][j] = -r[j][t] * r[t][j];
        }
    }

    let max_iter = k.max(100);
    let mut iter = 0;
    while iter < max_iter {
        // recompute Qp and pQp from scratch for numerical accuracy
        let mut p_qp = 0.0;
        for t in 0..k {
            qp[t] = q[t].iter().zip(&p).map(|(a, b)| a * b).sum();
            p_qp += p[t] * qp[t];
        }

        let max_error = qp
            .iter()
            .map(|v| (v - p_qp).abs())
            .fold(0.0, f64::max);
        if max_error < eps {
            break;
        }

        for t in 0..k {
            let diff = (-qp[t] + p_qp) / q[t][t];
            p[t] += diff;
            p_qp = (p_qp + diff * (diff * q[t][t] + 2.0 * qp[t])) / (1.0 + diff) / (1.0 + diff);
            for j in 0..k {
                qp[j] = (qp[j] + diff * q[t][j]) / (1.0 + diff);
                p[j] /= 1.0 + diff;
            }
        }
        iter += 1;
    }

    if iter >= max_iter {
        warn!("Exceeds max_iter in multiclass_prob");
    }
    p
}
