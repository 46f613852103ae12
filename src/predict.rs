//! Decision function evaluation
//!
//! Classification models evaluate every pairwise machine and vote; the
//! class with most votes wins, the lowest class index breaking ties.
//! Regression returns the function value and one-class detection its sign.

use crate::core::{SvmNode, SvmType};
use crate::kernel::k_function;
use crate::model::Model;
use crate::probability::{multiclass_probability, pairwise_probability};

impl Model {
    /// Predicted value plus the raw decision values
    ///
    /// Classification yields one decision value per class pair, in pair
    /// order; regression and one-class models yield a single value.
    /// `x` ends at its first terminator or at the end of the slice.
    pub fn predict_values(&self, x: &[SvmNode]) -> (f64, Vec<f64>) {
        match self.param.svm_type {
            SvmType::OneClass | SvmType::EpsilonSvr | SvmType::NuSvr => {
                let coef = self.sv_coef.first().map_or(&[][..], |c| c.as_slice());
                let sum: f64 = coef
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| c * k_function(x, self.support_vector(i), &self.param))
                    .sum::<f64>()
                    - self.rho.first().copied().unwrap_or(0.0);

                let value = if self.param.svm_type == SvmType::OneClass {
                    if sum > 0.0 {
                        1.0
                    } else {
                        -1.0
                    }
                } else {
                    sum
                };
                (value, vec![sum])
            }
            SvmType::CSvc | SvmType::NuSvc => {
                let decision_values = self.pairwise_decision_values(x);

                let mut votes = vec![0usize; self.nr_class];
                let mut p = 0;
                for i in 0..self.nr_class {
                    for j in i + 1..self.nr_class {
                        if decision_values[p] > 0.0 {
                            votes[i] += 1;
                        } else {
                            votes[j] += 1;
                        }
                        p += 1;
                    }
                }

                (self.label_at(argmax(&votes)), decision_values)
            }
        }
    }

    fn pairwise_decision_values(&self, x: &[SvmNode]) -> Vec<f64> {
        let kvalue: Vec<f64> = (0..self.total_sv())
            .map(|i| k_function(x, self.support_vector(i), &self.param))
            .collect();

        let mut start = vec![0; self.nr_class];
        for i in 1..self.nr_class {
            start[i] = start[i - 1] + self.n_sv[i - 1];
        }

        let mut decision_values = Vec::with_capacity(self.nr_pairs());
        let mut p = 0;
        for i in 0..self.nr_class {
            for j in i + 1..self.nr_class {
                let (si, sj) = (start[i], start[j]);
                let (ci, cj) = (self.n_sv[i], self.n_sv[j]);

                let coef1 = &self.sv_coef[j - 1];
                let coef2 = &self.sv_coef[i];
                let sum: f64 = (si..si + ci).map(|k| coef1[k] * kvalue[k]).sum::<f64>()
                    + (sj..sj + cj).map(|k| coef2[k] * kvalue[k]).sum::<f64>();
                decision_values.push(sum - self.rho[p]);
                p += 1;
            }
        }
        decision_values
    }

    fn label_at(&self, class: usize) -> f64 {
        self.label.get(class).map_or(0.0, |&l| f64::from(l))
    }

    /// Predicted label (classification), function value (regression) or
    /// +1/-1 (one-class)
    pub fn predict(&self, x: &[SvmNode]) -> f64 {
        self.predict_values(x).0
    }

    /// Predicted label plus one probability per class
    ///
    /// Models without sigmoid parameters fall back to [`Model::predict`]
    /// and return no estimates.
    pub fn predict_probability(&self, x: &[SvmNode]) -> (f64, Option<Vec<f64>>) {
        let (Some(prob_a), Some(prob_b)) = (&self.prob_a, &self.prob_b) else {
            return (self.predict(x), None);
        };
        if !self.param.svm_type.is_classification() {
            return (self.predict(x), None);
        }

        let k = self.nr_class;
        let decision_values = self.pairwise_decision_values(x);
        let mut pairwise = vec![vec![0.0; k]; k];
        let mut p = 0;
        for i in 0..k {
            for j in i + 1..k {
                let r = pairwise_probability(decision_values[p], prob_a[p], prob_b[p]);
                pairwise[i][j] = r;
                pairwise[j][i] = 1.0 - r;
                p += 1;
            }
        }

        let estimates = if k == 1 {
            vec![1.0]
        } else {
            multiclass_probability(&pairwise)
        };
        (self.label_at(argmax(&estimates)), Some(estimates))
    }
}

/// Index of the first maximal element
fn argmax<T: PartialOrd>(values: &[T]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
