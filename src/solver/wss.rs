//! Working-set selection
//!
//! Both selectors use second-order information: `i` is the maximal
//! violating variable and `j` the candidate giving the largest decrease of
//! the objective for the pair. They report convergence by returning `None`
//! once the maximal violation drops below `eps`.

use crate::qmatrix::QMatrix;
use crate::solver::{AlphaStatus, Solver, TAU};

/// Pair selection strategy for one solver run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkingSetSelector {
    /// C-SVC, one-class and epsilon-SVR
    #[default]
    Standard,
    /// nu-SVC and nu-SVR: both variables always share a sign
    Nu,
}

impl WorkingSetSelector {
    /// Pick the next pair to optimize, or `None` when the solver has converged
    pub fn select<Q: QMatrix>(self, solver: &mut Solver<Q>) -> Option<(usize, usize)> {
        match self {
            Self::Standard => select_standard(solver),
            Self::Nu => select_nu(solver),
        }
    }
}

/// `-(grad_diff^2) / quad_coef` with non-positive curvature floored at TAU
fn objective_decrease(grad_diff: f64, quad_coef: f64) -> f64 {
    let quad_coef = if quad_coef > 0.0 { quad_coef } else { TAU };
    -(grad_diff * grad_diff) / quad_coef
}

fn select_standard<Q: QMatrix>(solver: &Solver<Q>) -> Option<(usize, usize)> {
    let mut gmax = f64::NEG_INFINITY;
    let mut gmax2 = f64::NEG_INFINITY;
    let mut gmax_idx = None;

    for t in 0..solver.l {
        let g = solver.gradient[t];
        if solver.y[t] == 1 {
            if !solver.is_upper_bound(t) && -g >= gmax {
                gmax = -g;
                gmax_idx = Some(t);
            }
            if !solver.is_lower_bound(t) && g >= gmax2 {
                gmax2 = g;
            }
        } else {
            if !solver.is_lower_bound(t) && g >= gmax {
                gmax = g;
                gmax_idx = Some(t);
            }
            if !solver.is_upper_bound(t) && -g >= gmax2 {
                gmax2 = -g;
            }
        }
    }

    if gmax + gmax2 < solver.eps {
        return None;
    }
    let i = gmax_idx?;
    let y_i = f64::from(solver.y[i]);

    let mut obj_diff_min = f64::INFINITY;
    let mut gmin_idx = None;

    for j in 0..solver.l {
        let (grad_diff, quad_coef) = if solver.y[j] == 1 {
            if solver.is_lower_bound(j) {
                continue;
            }
            (
                gmax + solver.gradient[j],
                solver.qd[i] + solver.qd[j] - 2.0 * y_i * solver.q.compute_q(i, j),
            )
        } else {
            if solver.is_upper_bound(j) {
                continue;
            }
            (
                gmax - solver.gradient[j],
                solver.qd[i] + solver.qd[j] + 2.0 * y_i * solver.q.compute_q(i, j),
            )
        };

        if grad_diff > 0.0 {
            let obj_diff = objective_decrease(grad_diff, quad_coef);
            if obj_diff <= obj_diff_min {
                obj_diff_min = obj_diff;
                gmin_idx = Some(j);
            }
        }
    }

    gmin_idx.map(|j| (i, j))
}

fn select_nu<Q: QMatrix>(solver: &mut Solver<Q>) -> Option<(usize, usize)> {
    let mut gmaxp = f64::NEG_INFINITY;
    let mut gmaxp2 = f64::NEG_INFINITY;
    let mut gmaxp_idx = None;

    let mut gmaxn = f64::NEG_INFINITY;
    let mut gmaxn2 = f64::NEG_INFINITY;
    let mut gmaxn_idx = None;

    for t in 0..solver.l {
        let g = solver.gradient[t];
        if solver.y[t] == 1 {
            if !solver.is_upper_bound(t) && -g >= gmaxp {
                gmaxp = -g;
                gmaxp_idx = Some(t);
            }
            if !solver.is_lower_bound(t) && g >= gmaxp2 {
                gmaxp2 = g;
            }
        } else {
            if !solver.is_lower_bound(t) && g >= gmaxn {
                gmaxn = g;
                gmaxn_idx = Some(t);
            }
            if !solver.is_upper_bound(t) && -g >= gmaxn2 {
                gmaxn2 = -g;
            }
        }
    }

    if f64::max(gmaxp + gmaxp2, gmaxn + gmaxn2) < solver.eps {
        return None;
    }

    let Solver {
        l,
        ref mut q,
        ref y,
        ref gradient,
        ref qd,
        ref alpha_status,
        ..
    } = *solver;

    let (q_ip, q_in) = match (gmaxp_idx, gmaxn_idx) {
        (Some(ip), Some(i_n)) => {
            let (col_p, col_n) = q.get_q_pair(ip, i_n, l);
            (Some(col_p), Some(col_n))
        }
        (Some(ip), None) => (Some(q.get_q(ip, l)), None),
        (None, Some(i_n)) => (None, Some(q.get_q(i_n, l))),
        (None, None) => (None, None),
    };

    let mut obj_diff_min = f64::INFINITY;
    let mut gmin_idx = None;

    for j in 0..l {
        let (grad_diff, quad_coef) = if y[j] == 1 {
            if alpha_status[j] == AlphaStatus::LowerBound {
                continue;
            }
            let (Some(ip), Some(q_ip)) = (gmaxp_idx, q_ip) else {
                continue;
            };
            (gmaxp + gradient[j], qd[ip] + qd[j] - 2.0 * q_ip[j])
        } else {
            if alpha_status[j] == AlphaStatus::UpperBound {
                continue;
            }
            let (Some(i_n), Some(q_in)) = (gmaxn_idx, q_in) else {
                continue;
            };
            (gmaxn - gradient[j], qd[i_n] + qd[j] - 2.0 * q_in[j])
        };

        if grad_diff > 0.0 {
            let obj_diff = objective_decrease(grad_diff, quad_coef);
            if obj_diff <= obj_diff_min {
                obj_diff_min = obj_diff;
                gmin_idx = Some(j);
            }
        }
    }

    let j = gmin_idx?;
    let i = if y[j] == 1 { gmaxp_idx? } else { gmaxn_idx? };
    Some((i, j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, Parameter, Problem, SparseVector};
    use crate::qmatrix::SvcQ;

    fn problem() -> Problem {
        let rows = vec![
            SparseVector::from_dense(&[1.0, 1.0]),
            SparseVector::from_dense(&[2.0, 0.5]),
            SparseVector::from_dense(&[-1.0, -1.0]),
            SparseVector::from_dense(&[-0.5, -2.0]),
        ];
        Problem::from_rows(&[1.0, 1.0, -1.0, -1.0], &rows)
    }

    fn solver(problem: &Problem, alpha: Vec<f64>) -> Solver<SvcQ<'_>> {
        let param = Parameter {
            kernel_type: KernelType::Linear,
            ..Parameter::default()
        };
        let y = vec![1, 1, -1, -1];
        let q = SvcQ::new(problem, &param, &y).unwrap();
        let mut solver = Solver::new(q, vec![-1.0; 4], y, alpha, 1.0, 1.0, 1e-3);
        solver.init_gradient();
        solver
    }

    #[test]
    fn test_standard_picks_opposite_labels_from_zero() {
        let problem = problem();
        let mut solver = solver(&problem, vec![0.0; 4]);

        let (i, j) = WorkingSetSelector::Standard.select(&mut solver).unwrap();
        // all gradients tie at -1: the last movable-up index wins
        assert_eq!(i, 1);
        assert_eq!(solver.y[j], -1);
    }

    #[test]
    fn test_nu_pairs_share_a_sign() {
        let problem = problem();
        let mut solver = solver(&problem, vec![0.5, 0.5, 0.5, 0.5])
            .with_selector(WorkingSetSelector::Nu);
        solver.p = vec![0.0; 4];
        solver.init_gradient();

        if let Some((i, j)) = WorkingSetSelector::Nu.select(&mut solver) {
            assert_eq!(solver.y[i], solver.y[j]);
            assert_ne!(i, j);
        }
    }

    #[test]
    fn test_converged_state_selects_nothing() {
        let problem = problem();
        let mut solver = solver(&problem, vec![0.0; 4]);
        solver.gradient = vec![0.0; 4];
        assert_eq!(WorkingSetSelector::Standard.select(&mut solver), None);
        assert_eq!(WorkingSetSelector::Nu.select(&mut solver), None);
    }

    #[test]
    fn test_objective_decrease_floors_curvature() {
        assert_eq!(objective_decrease(2.0, 4.0), -1.0);
        assert_eq!(objective_decrease(1.0, 0.0), -1.0 / TAU);
        assert_eq!(objective_decrease(1.0, -3.0), -1.0 / TAU);
    }
}
