// ============================================================
// Layer 5 — RBF Support Vector Classifier
// ============================================================
// Binary soft-margin SVC used as the membership attack model.
//
//   K(x, z) = exp(−γ ‖x − z‖²)
//   f(x)    = Σ αᵢ yᵢ K(xᵢ, x) + b,   predict member ⇔ f(x) > 0
//
// Trained with simplified SMO (Platt 1998; CS229 variant): sweep the
// samples that violate the KKT conditions beyond `tol`, pair each with
// a random partner, optimise the two multipliers analytically. The
// error cache Eᵢ = f(xᵢ) − yᵢ is updated in O(n) kernel evaluations
// after every accepted step, so memory stays O(n).

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SvcConfig {
    pub c:          f64,
    /// Kernel width; `None` means 1 / n_features
    pub gamma:      Option<f64>,
    pub tol:        f64,
    /// Consecutive sweeps without change before stopping
    pub max_passes: usize,
    /// Hard cap on sweeps
    pub max_iter:   usize,
    pub seed:       u64,
}

impl Default for SvcConfig {
    fn default() -> Self {
        Self { c: 3.0, gamma: None, tol: 1e-3, max_passes: 5, max_iter: 200, seed: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct Svc {
    support: Vec<Vec<f64>>,
    /// αᵢ·yᵢ per support vector
    coef:    Vec<f64>,
    bias:    f64,
    gamma:   f64,
    /// Set when training saw a single class
    constant: Option<bool>,
}

fn rbf(gamma: f64, a: &[f64], b: &[f64]) -> f64 {
    let d2: f64 = a.iter().zip(b).map(|(x, z)| (x - z) * (x - z)).sum();
    (-gamma * d2).exp()
}

impl Svc {
    /// Fit on rows `x` with membership labels `y`. Fails on empty input
    /// or rows of inconsistent width.
    pub fn fit(x: &[Vec<f64>], y: &[bool], config: &SvcConfig) -> Result<Self> {
        ensure!(!x.is_empty(), "cannot fit an SVC on zero samples");
        ensure!(x.len() == y.len(), "{} rows but {} labels", x.len(), y.len());
        let dim = x[0].len();
        ensure!(x.iter().all(|row| row.len() == dim), "feature rows have inconsistent width");

        let gamma = config.gamma.unwrap_or(1.0 / dim.max(1) as f64);

        if y.iter().all(|&v| v == y[0]) {
            return Ok(Self { support: vec![], coef: vec![], bias: 0.0, gamma, constant: Some(y[0]) });
        }

        let n = x.len();
        let c = config.c;
        let ys: Vec<f64> = y.iter().map(|&v| if v { 1.0 } else { -1.0 }).collect();
        let mut alpha = vec![0.0f64; n];
        let mut b = 0.0f64;
        let mut err: Vec<f64> = ys.iter().map(|&v| -v).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut passes = 0;
        let mut iter = 0;
        while passes < config.max_passes && iter < config.max_iter {
            let mut changed = 0;
            for i in 0..n {
                let (yi, ei) = (ys[i], err[i]);
                let violates = (yi * ei < -config.tol && alpha[i] < c) || (yi * ei > config.tol && alpha[i] > 0.0);
                if !violates {
                    continue;
                }

                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let (yj, ej) = (ys[j], err[j]);
                let (ai_old, aj_old) = (alpha[i], alpha[j]);

                let (lo, hi) = if yi != yj {
                    ((aj_old - ai_old).max(0.0), (c + aj_old - ai_old).min(c))
                } else {
                    ((ai_old + aj_old - c).max(0.0), (ai_old + aj_old).min(c))
                };
                if lo >= hi {
                    continue;
                }

                let kij = rbf(gamma, &x[i], &x[j]);
                // K(x, x) = 1 for RBF
                let eta = 2.0 * kij - 2.0;
                if eta >= 0.0 {
                    continue;
                }

                let aj = (aj_old - yj * (ei - ej) / eta).clamp(lo, hi);
                if (aj - aj_old).abs() < 1e-5 {
                    continue;
                }
                let ai = ai_old + yi * yj * (aj_old - aj);

                let (di, dj) = (yi * (ai - ai_old), yj * (aj - aj_old));
                let b1 = b - ei - di - dj * kij;
                let b2 = b - ej - di * kij - dj;
                let b_new = if ai > 0.0 && ai < c {
                    b1
                } else if aj > 0.0 && aj < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                for k in 0..n {
                    err[k] += di * rbf(gamma, &x[i], &x[k]) + dj * rbf(gamma, &x[j], &x[k]) + (b_new - b);
                }
                alpha[i] = ai;
                alpha[j] = aj;
                b = b_new;
                changed += 1;
            }

            iter += 1;
            passes = if changed == 0 { passes + 1 } else { 0 };
        }

        let (support, coef): (Vec<_>, Vec<_>) = alpha
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 0.0)
            .map(|(i, &a)| (x[i].clone(), a * ys[i]))
            .unzip();
        tracing::debug!(samples = n, support = support.len(), sweeps = iter, "SVC fitted");

        Ok(Self { support, coef, bias: b, gamma, constant: None })
    }

    pub fn decision(&self, row: &[f64]) -> f64 {
        if let Some(member) = self.constant {
            return if member { 1.0 } else { -1.0 };
        }
        self.support
            .iter()
            .zip(&self.coef)
            .map(|(sv, w)| w * rbf(self.gamma, sv, row))
            .sum::<f64>()
            + self.bias
    }

    pub fn predict(&self, row: &[f64]) -> bool {
        self.decision(row) > 0.0
    }

    #[cfg(test)]
    pub fn support_count(&self) -> usize {
        self.support.len()
    }
}
