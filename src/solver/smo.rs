//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the dual problem shared by every formulation:
//!
//! ```text
//! min  0.5 * alpha^T Q alpha + p^T alpha
//! s.t. y^T alpha = delta,  0 <= alpha_i <= C_i
//! ```
//!
//! where `y_i` is +1 or -1 and `C_i` is `Cp` for positive and `Cn` for
//! negative variables. Each iteration optimizes the pair returned by the
//! working-set selector in closed form and updates the gradient with the
//! two Q columns involved.

use crate::qmatrix::QMatrix;
use crate::solver::WorkingSetSelector;
use log::{debug, warn};

/// Floor for non-positive curvature in the two-variable subproblem
pub const TAU: f64 = 1e-12;

/// Position of a variable inside its box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaStatus {
    LowerBound,
    UpperBound,
    Free,
}

/// Result of one solver run
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Dual objective value
    pub obj: f64,
    pub rho: f64,
    /// Box bound used for positive variables
    pub upper_bound_p: f64,
    /// Box bound used for negative variables
    pub upper_bound_n: f64,
    pub alpha: Vec<f64>,
    /// Normalization scalar of the nu formulations, 0 otherwise
    pub r: f64,
    pub iterations: usize,
}

/// Default iteration cap for a problem with `l` variables
pub fn default_max_iter(l: usize) -> usize {
    let scaled = if l > i32::MAX as usize / 100 {
        i32::MAX as usize
    } else {
        100 * l
    };
    scaled.max(10_000_000)
}

/// Live optimization state for one dual problem
///
/// The solver owns its Q matrix for the duration of a run and is consumed
/// by [`Solver::solve`].
#[derive(Debug)]
pub struct Solver<Q: QMatrix> {
    pub(super) l: usize,
    pub(super) q: Q,
    pub(super) p: Vec<f64>,
    pub(super) y: Vec<i8>,
    pub(super) alpha: Vec<f64>,
    pub(super) alpha_status: Vec<AlphaStatus>,
    pub(super) gradient: Vec<f64>,
    pub(super) qd: Vec<f64>,
    pub(super) cp: f64,
    pub(super) cn: f64,
    pub(super) eps: f64,
    max_iter: usize,
    selector: WorkingSetSelector,
}

impl<Q: QMatrix> Solver<Q> {
    /// Create a solver with the standard selector and the default iteration cap
    ///
    /// `p`, `y` and `alpha` must all have one entry per variable, and
    /// `alpha` must be feasible.
    pub fn new(q: Q, p: Vec<f64>, y: Vec<i8>, alpha: Vec<f64>, cp: f64, cn: f64, eps: f64) -> Self {
        let l = y.len();
        debug_assert_eq!(p.len(), l);
        debug_assert_eq!(alpha.len(), l);
        let qd = q.get_qd()[..l].to_vec();

        Self {
            l,
            q,
            p,
            y,
            alpha,
            alpha_status: vec![AlphaStatus::LowerBound; l],
            gradient: Vec::new(),
            qd,
            cp,
            cn,
            eps,
            max_iter: default_max_iter(l),
            selector: WorkingSetSelector::Standard,
        }
    }

    pub fn with_selector(mut self, selector: WorkingSetSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Override the iteration cap
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub(super) fn get_c(&self, i: usize) -> f64 {
        if self.y[i] > 0 {
            self.cp
        } else {
            self.cn
        }
    }

    pub(super) fn is_upper_bound(&self, i: usize) -> bool {
        self.alpha_status[i] == AlphaStatus::UpperBound
    }

    pub(super) fn is_lower_bound(&self, i: usize) -> bool {
        self.alpha_status[i] == AlphaStatus::LowerBound
    }

    fn update_alpha_status(&mut self, i: usize) {
        self.alpha_status[i] = if self.alpha[i] >= self.get_c(i) {
            AlphaStatus::UpperBound
        } else if self.alpha[i] <= 0.0 {
            AlphaStatus::LowerBound
        } else {
            AlphaStatus::Free
        };
    }

    /// Set bound status from alpha and the gradient to `p + Q^T alpha`
    pub(super) fn init_gradient(&mut self) {
        for i in 0..self.l {
            self.update_alpha_status(i);
        }

        self.gradient = self.p.clone();
        let l = self.l;
        for i in 0..l {
            let alpha_i = self.alpha[i];
            if alpha_i == 0.0 {
                continue;
            }
            let q_i = self.q.get_q(i, l);
            for (g, &q) in self.gradient.iter_mut().zip(q_i) {
                *g += alpha_i * q;
            }
        }
    }

    /// Run SMO until the selector reports convergence or the cap is reached
    pub fn solve(mut self) -> Solution {
        self.init_gradient();

        let selector = self.selector;
        let mut iter = 0;
        let mut converged = false;
        while iter < self.max_iter {
            let Some((i, j)) = selector.select(&mut self) else {
                converged = true;
                break;
            };
            iter += 1;
            self.take_step(i, j);
        }

        if !converged {
            warn!("Reached max number of iterations ({})", self.max_iter);
        }
        debug!("optimization finished, #iter = {iter}");

        let (rho, r) = match selector {
            WorkingSetSelector::Standard => (self.calculate_rho(), 0.0),
            WorkingSetSelector::Nu => self.calculate_rho_nu(),
        };

        Solution {
            obj: self.objective(),
            rho,
            upper_bound_p: self.cp,
            upper_bound_n: self.cn,
            alpha: self.alpha,
            r,
            iterations: iter,
        }
    }

    /// Solve the two-variable subproblem on `(i, j)` and update the gradient
    fn take_step(&mut self, i: usize, j: usize) {
        let (c_i, c_j) = (self.get_c(i), self.get_c(j));
        let (old_alpha_i, old_alpha_j) = (self.alpha[i], self.alpha[j]);
        let l = self.l;

        let (q_i, q_j) = self.q.get_q_pair(i, j, l);
        let alpha = &mut self.alpha;

        if self.y[i] != self.y[j] {
            let mut quad_coef = self.qd[i] + self.qd[j] + 2.0 * q_i[j];
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (-self.gradient[i] - self.gradient[j]) / quad_coef;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;

            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }

            if diff > c_i - c_j {
                if alpha[i] > c_i {
                    alpha[i] = c_i;
                    alpha[j] = c_i - diff;
                }
            } else if alpha[j] > c_j {
                alpha[j] = c_j;
                alpha[i] = c_j + diff;
            }
        } else {
            let mut quad_coef = self.qd[i] + self.qd[j] - 2.0 * q_i[j];
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (self.gradient[i] - self.gradient[j]) / quad_coef;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;

            if sum > c_i {
                if alpha[i] > c_i {
                    alpha[i] = c_i;
                    alpha[j] = sum - c_i;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }

            if sum > c_j {
                if alpha[j] > c_j {
                    alpha[j] = c_j;
                    alpha[i] = sum - c_j;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let delta_alpha_i = alpha[i] - old_alpha_i;
        let delta_alpha_j = alpha[j] - old_alpha_j;
        for ((g, &qi), &qj) in self.gradient.iter_mut().zip(q_i).zip(q_j) {
            *g += qi * delta_alpha_i + qj * delta_alpha_j;
        }

        self.update_alpha_status(i);
        self.update_alpha_status(j);
    }

    /// `0.5 * sum(alpha_i * (G_i + p_i))`
    pub(super) fn objective(&self) -> f64 {
        let v: f64 = self
            .alpha
            .iter()
            .zip(&self.gradient)
            .zip(&self.p)
            .map(|((a, g), p)| a * (g + p))
            .sum();
        v / 2.0
    }

    /// Mean of `y * G` over free variables, else the midpoint of the bounds
    fn calculate_rho(&self) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut sum_free = 0.0;
        let mut nr_free = 0usize;

        for i in 0..self.l {
            let y_g = f64::from(self.y[i]) * self.gradient[i];
            match self.alpha_status[i] {
                AlphaStatus::UpperBound => {
                    if self.y[i] == -1 {
                        ub = ub.min(y_g);
                    } else {
                        lb = lb.max(y_g);
                    }
                }
                AlphaStatus::LowerBound => {
                    if self.y[i] == 1 {
                        ub = ub.min(y_g);
                    } else {
                        lb = lb.max(y_g);
                    }
                }
                AlphaStatus::Free => {
                    nr_free += 1;
                    sum_free += y_g;
                }
            }
        }

        if nr_free > 0 {
            sum_free / nr_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }

    /// Offsets of the positive and negative sides; returns `(rho, r)`
    fn calculate_rho_nu(&self) -> (f64, f64) {
        let side = |sign: i8| {
            let mut ub = f64::INFINITY;
            let mut lb = f64::NEG_INFINITY;
            let mut sum_free = 0.0;
            let mut nr_free = 0usize;

            for i in (0..self.l).filter(|&i| self.y[i] == sign) {
                let g = self.gradient[i];
                match self.alpha_status[i] {
                    AlphaStatus::UpperBound => lb = lb.max(g),
                    AlphaStatus::LowerBound => ub = ub.min(g),
                    AlphaStatus::Free => {
                        nr_free += 1;
                        sum_free += g;
                    }
                }
            }

            if nr_free > 0 {
                sum_free / nr_free as f64
            } else {
                (ub + lb) / 2.0
            }
        };

        let r1 = side(1);
        let r2 = side(-1);
        ((r1 - r2) / 2.0, (r1 + r2) / 2.0)
    }
}
