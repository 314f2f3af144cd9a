//! Statistical tests and descriptive helpers.
//!
//! Fisher's exact test is computed in log space with the hypergeometric
//! PMF so ultra-small tail probabilities on genome-scale tables stay
//! finite. FDR correction is Benjamini-Hochberg over the whole run.

use statrs::function::factorial::ln_factorial;

/// A 2x2 contingency table:
///
/// ```text
///             in window   outside
/// gene set        a          b
/// background      c          d
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ContingencyTable {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

impl ContingencyTable {
    pub fn n(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    /// Enrichment odds ratio, infinite when the off-diagonal is empty.
    pub fn odds_ratio(&self) -> f64 {
        let num = self.a as f64 * self.d as f64;
        let den = self.b as f64 * self.c as f64;
        if den == 0.0 {
            if num == 0.0 {
                f64::NAN
            } else {
                f64::INFINITY
            }
        } else {
            num / den
        }
    }
}

/// Two-sided Fisher's exact test.
///
/// Sums P(k) over all tables with the observed margins whose probability
/// does not exceed the observed table's (with a small tolerance for
/// floating-point ties, as the reference implementations do).
pub fn fisher_exact(table: &ContingencyTable) -> f64 {
    let row1 = table.a + table.b; // gene set size
    let col1 = table.a + table.c; // total in windows
    let n = table.n();

    if n == 0 || row1 == 0 || col1 == n || col1 == 0 || row1 == n {
        // Degenerate margins: only one table is possible.
        return 1.0;
    }

    let p_observed = hypergeom_pmf(table.a, n, row1, col1);

    let min_k = col1.saturating_sub(n - row1);
    let max_k = row1.min(col1);

    let mut pvalue = 0.0;
    for k in min_k..=max_k {
        let p_k = hypergeom_pmf(k, n, row1, col1);
        if p_k <= p_observed + 1e-12 {
            pvalue += p_k;
        }
    }

    pvalue.min(1.0)
}

/// Hypergeometric PMF: P(X = k | N, K, n).
fn hypergeom_pmf(k: u64, n_total: u64, n_success: u64, n_draws: u64) -> f64 {
    let log_p = ln_choose(n_success, k)
        + ln_choose(n_total - n_success, n_draws - k)
        - ln_choose(n_total, n_draws);
    log_p.exp()
}

/// Log of the binomial coefficient ln(C(n, k)).
fn ln_choose(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

/// Benjamini-Hochberg FDR correction.
///
/// Returns adjusted p-values in the input order:
/// `q_(i) = min_{j >= i} ( p_(j) * m / j )` over the sorted p-values,
/// clamped to 1.
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let m = pvalues.len();
    if m == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&i, &j| pvalues[i].total_cmp(&pvalues[j]));

    let mut adjusted = vec![0.0; m];
    let mut running_min = f64::INFINITY;
    for rank in (0..m).rev() {
        let idx = order[rank];
        let q = pvalues[idx] * m as f64 / (rank + 1) as f64;
        running_min = running_min.min(q);
        adjusted[idx] = running_min.min(1.0);
    }

    adjusted
}

/// Arithmetic mean; NaN on empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance; NaN with fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}
