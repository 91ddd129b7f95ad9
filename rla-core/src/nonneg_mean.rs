// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! Sequentially-valid p-value tests for the mean of a bounded nonnegative
//! population: Kaplan-Markov, Kaplan-Wald, Kaplan-Kolmogorov, the binary
//! Wald SPRT (with and without replacement), and Kaplan's martingale
//! (KMart), plus a simulation-based sample-size estimator.
//!
//! When `random_order` is true the sample is assumed to be in the order it
//! was drawn, and the test returns the minimum over prefixes of `1/M_k`
//! (optional stopping); otherwise it returns `1/M_n`. Every test here must
//! compute the maximum over *all* prefixes, not merely the final one, to
//! preserve sequential validity — see spec.md §5.

use crate::error::RlaError;
use rand::SeedableRng;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

/// The size of the population being sampled from: finite (without
/// replacement) or infinite (with replacement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationSize {
    Finite(usize),
    Infinite,
}

impl PopulationSize {
    fn as_f64(self) -> f64 {
        match self {
            PopulationSize::Finite(n) => n as f64,
            PopulationSize::Infinite => f64::INFINITY,
        }
    }
}

fn check_nonnegative(x: &[f64]) -> Result<(), RlaError> {
    if x.iter().any(|&v| v < 0.0) {
        Err(RlaError::NegativeSample)
    } else {
        Ok(())
    }
}

/// Kaplan-Markov p-value. `g >= 0` pads against zero-valued samples.
pub fn kaplan_markov(x: &[f64], t: f64, g: f64, random_order: bool) -> Result<f64, RlaError> {
    check_nonnegative(x)?;
    let factors: Vec<f64> = x.iter().map(|&xi| (t + g) / (xi + g)).collect();
    let p = if random_order {
        let mut running = 1.0;
        let mut min_so_far = f64::INFINITY;
        for f in factors {
            running *= f;
            min_so_far = min_so_far.min(running);
        }
        min_so_far
    } else {
        factors.iter().product()
    };
    Ok(p.min(1.0))
}

/// Kaplan-Wald p-value. `g` in `[0, 1)` pads against zero-valued samples.
pub fn kaplan_wald(x: &[f64], t: f64, g: f64, random_order: bool) -> Result<f64, RlaError> {
    if g < 0.0 {
        return Err(RlaError::InvalidPadding);
    }
    check_nonnegative(x)?;
    let factors: Vec<f64> = x.iter().map(|&xi| (1.0 - g) * xi / t + g).collect();
    let mart_extreme = if random_order {
        let mut running = 1.0;
        let mut max_so_far = f64::NEG_INFINITY;
        for f in factors {
            running *= f;
            max_so_far = max_so_far.max(running);
        }
        max_so_far
    } else {
        factors.iter().product()
    };
    Ok((1.0 / mart_extreme).min(1.0))
}

/// Kaplan-Kolmogorov p-value for a finite population of size `n_pop`
/// sampled without replacement.
pub fn kaplan_kolmogorov(x: &[f64], n_pop: usize, t: f64, random_order: bool) -> Result<f64, RlaError> {
    check_nonnegative(x)?;
    if n_pop == 0 || x.len() > n_pop {
        return Err(RlaError::PopulationOverrun { n: x.len(), population: n_pop.to_string() });
    }
    if x.is_empty() {
        return Ok(1.0);
    }
    let n = n_pop as f64;
    let mut mart = if t > 0.0 { x[0] / t } else { 1.0 };
    let mut mart_max = mart;
    let mut sample_total = 0.0_f64;
    for (j, &xj) in x.iter().enumerate().skip(1) {
        let denom = t - sample_total / n;
        if denom <= 0.0 {
            mart = f64::INFINITY;
            mart_max = mart_max.max(mart);
            break;
        }
        mart *= xj * (1.0 - j as f64 / n) / denom;
        if mart < 0.0 {
            mart = f64::INFINITY;
            mart_max = mart_max.max(mart);
            break;
        }
        sample_total += xj;
        mart_max = mart_max.max(mart);
    }
    let p = if random_order { 1.0 / mart_max } else { 1.0 / mart };
    Ok(p.min(1.0))
}

/// Binary Wald SPRT for the hypothesis that the population mean is `<= t`
/// against the alternative `p1 > t`. `n_pop` finite assumes sampling
/// without replacement; `PopulationSize::Infinite` assumes with replacement.
pub fn wald_sprt(x: &[f64], n_pop: PopulationSize, t: f64, p1: f64, random_order: bool) -> Result<f64, RlaError> {
    if x.iter().any(|&v| v != 0.0 && v != 1.0) {
        return Err(RlaError::NonBinarySample);
    }
    let mut terms = vec![1.0; x.len()];
    match n_pop {
        PopulationSize::Finite(n_usize) => {
            let n = n_usize as f64;
            let mut a = 0.0_f64;
            for (idx, &xi) in x.iter().enumerate() {
                if xi == 1.0 {
                    let denom = n * t - a;
                    terms[idx] = if denom > 0.0 { (n * p1 - a).max(0.0) / denom } else { f64::INFINITY };
                } else {
                    let denom = n * (1.0 - t) - idx as f64 + 1.0 + a;
                    terms[idx] = if denom > 0.0 {
                        (n * (1.0 - p1) - idx as f64 + 1.0 + a).max(0.0) / denom
                    } else {
                        f64::INFINITY
                    };
                }
                a += xi;
            }
        }
        PopulationSize::Infinite => {
            for (idx, &xi) in x.iter().enumerate() {
                terms[idx] = if xi == 1.0 { p1 / t } else { (1.0 - p1) / (1.0 - t) };
            }
        }
    }
    let extreme = if random_order {
        let mut running = 1.0;
        let mut max_so_far = f64::NEG_INFINITY;
        for term in terms {
            running *= term;
            max_so_far = max_so_far.max(running);
        }
        max_so_far
    } else {
        terms.iter().product()
    };
    Ok((1.0 / extreme).min(1.0))
}

/// Integrates `prod_{j<=n} (x - c_j)` from 0 to 1 via the recursive
/// coefficient-table algorithm. Returns `(I, I_vec)` where `I` is
/// `max(I_vec[1:])` if `maximal`, else `I_vec[n-1]` (the full-degree
/// integral). Coefficients can grow large for long samples; callers that
/// see a non-finite value in the returned vector should stop early rather
/// than trust further entries.
pub fn integral_from_roots(c: &[f64], maximal: bool) -> (f64, Vec<f64>) {
    let n = c.len();
    let mut a = vec![vec![0.0_f64; n + 1]; n + 1];
    a[0][0] = 1.0;
    for k in 0..n {
        for j in 0..=n {
            let mut val = -c[k] * ((k + 1 - j) as f64 / (k + 1) as f64) * a[k][j];
            if j > 0 {
                val += (1.0 - c[k]) * (j as f64 / (k + 1) as f64) * a[k][j - 1];
            }
            a[k + 1][j] = val;
        }
    }
    let mut integrals = vec![0.0_f64; n];
    for k in 1..=n {
        let row_sum: f64 = a[k].iter().sum();
        integrals[k - 1] = row_sum / (k + 1) as f64;
    }
    let integral = if maximal {
        integrals[1..].iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    } else {
        integrals.last().copied().unwrap_or(0.0)
    };
    (integral, integrals)
}

/// Kaplan's martingale p-value for the null that the mean of a nonnegative
/// population with `n_pop` elements equals `t`, against the alternative
/// that it is larger. Returns the p-value and the martingale trajectory.
pub fn kaplan_martingale(
    x: &[f64],
    n_pop: PopulationSize,
    t: f64,
    random_order: bool,
) -> Result<(f64, Vec<f64>), RlaError> {
    check_nonnegative(x)?;
    if let PopulationSize::Finite(n) = n_pop {
        if x.len() > n {
            return Err(RlaError::PopulationOverrun { n: x.len(), population: n.to_string() });
        }
    }
    if x.is_empty() {
        return Ok((1.0, vec![]));
    }
    let n = n_pop.as_f64();
    let mut s_tilde_prev = Vec::with_capacity(x.len());
    let mut cum = 0.0_f64;
    for &xi in x {
        s_tilde_prev.push(cum / n);
        cum += xi;
    }
    let tau: Vec<f64> = s_tilde_prev.iter().map(|&s| t - s).collect();
    if tau.iter().any(|&v| v <= 0.0) {
        // sample total has already reached or exceeded the hypothesized population total.
        return Ok((0.0, vec![f64::INFINITY; x.len()]));
    }
    let c: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, &xi)| {
            let jtilde = 1.0 - (i as f64) / n;
            xi * jtilde / tau[i] - 1.0
        })
        .collect();
    let nonzero: Vec<usize> = (0..c.len()).filter(|&i| c[i] != 0.0).collect();
    if nonzero.is_empty() {
        return Ok((1.0, vec![1.0; x.len()]));
    }
    let roots: Vec<f64> = nonzero.iter().map(|&i| -1.0 / c[i]).collect();
    let mut y = Vec::with_capacity(roots.len());
    let mut running = 1.0_f64;
    for &i in &nonzero {
        running *= c[i];
        y.push(running);
    }
    let (_, integrals) = integral_from_roots(&roots, false);
    let mart_vec: Vec<f64> = y.iter().zip(integrals.iter()).map(|(&yy, &ii)| yy * ii).collect();
    let mart_extreme = if random_order {
        mart_vec.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    } else {
        *mart_vec.last().unwrap()
    };
    Ok(((1.0 / mart_extreme).min(1.0), mart_vec))
}

fn quantile_linear(sorted: &[usize], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    if n == 1 {
        return sorted[0] as f64;
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo] as f64
    } else {
        let frac = pos - lo as f64;
        sorted[lo] as f64 * (1.0 - frac) + sorted[hi] as f64 * frac
    }
}

/// Estimates the `q`-th quantile of the sample size needed to reject
/// `H0: mean <= t` at level `alpha`, by simulation: builds a pseudo-population
/// of size `n_pop` with mean `alt_mean`, then `reps` times permutes it
/// uniformly and runs [`kaplan_martingale`] incrementally, recording the
/// first draw count at which `p <= alpha`. The PRNG is a `ChaCha20` stream
/// seeded from `seed` — a deterministic, cryptographically-strong stand-in
/// for the SHA256 counter stream of the original.
pub fn kaplan_martingale_sample_size_sim(
    n_pop: usize,
    alt_mean: f64,
    alpha: f64,
    t: f64,
    q: f64,
    reps: usize,
    seed: u64,
) -> Result<f64, RlaError> {
    if !(alpha > 0.0 && alpha < 0.5) {
        return Err(RlaError::InvalidContest { contest: "sample_size_sim".into(), reason: "alpha must be in (0, 1/2)".into() });
    }
    if !(alt_mean > t) {
        return Err(RlaError::InvalidContest { contest: "sample_size_sim".into(), reason: "alt_mean must exceed t".into() });
    }
    if !(q > 0.0 && q < 1.0) {
        return Err(RlaError::InvalidContest { contest: "sample_size_sim".into(), reason: "q must be in (0, 1)".into() });
    }
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut hyp_pop: Vec<f64> = (0..n_pop).map(|_| rng.gen::<f64>()).collect();
    let raw_mean: f64 = hyp_pop.iter().sum::<f64>() / n_pop as f64;
    for v in hyp_pop.iter_mut() {
        *v = alt_mean * *v / raw_mean;
    }
    let mut stopping_times = Vec::with_capacity(reps);
    for _ in 0..reps {
        hyp_pop.shuffle(&mut rng);
        let mut j = 0usize;
        let mut p = 1.0;
        while p > alpha && j < n_pop {
            j += 1;
            p = kaplan_martingale(&hyp_pop[..j], PopulationSize::Finite(n_pop), t, false)?.0;
        }
        stopping_times.push(j);
    }
    stopping_times.sort_unstable();
    Ok(quantile_linear(&stopping_times, q))
}
