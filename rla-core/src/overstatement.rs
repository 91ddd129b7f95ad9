// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! The overstatement reducer: the canonical transformation of an assorter
//! plus an (MVR, CVR) pair into a bounded nonnegative sample whose mean
//! exceeds 1/2 iff the assertion holds and no net overstatement occurred.

use crate::assertion::Assertion;
use crate::cvr::Cvr;
use crate::error::RlaError;

/// `B(mvr, cvr) = 1 - (A(cvr) - A(mvr)) / (2*mean - 1)`.
///
/// `reported_mean` is the assertion's assorter mean over the full set of
/// reported CVRs; `2*reported_mean - 1` is the reported margin. A
/// non-positive margin means the assertion is not auditable by a sample —
/// rather than dividing by (near) zero, this refuses construction. See the
/// open question in spec.md §9.
pub fn overstatement_assorter(
    assertion: &Assertion,
    mvr: &Cvr,
    cvr: &Cvr,
    reported_mean: f64,
) -> Result<f64, RlaError> {
    let margin = 2.0 * reported_mean - 1.0;
    if margin <= 0.0 {
        return Err(RlaError::AssertionNotAuditable(assertion.contest_id.clone()));
    }
    let overstatement = assertion.assorter.assort(cvr) - assertion.assorter.assort(mvr);
    Ok(1.0 - overstatement / margin)
}

/// Applies [`overstatement_assorter`] pairwise across batches of MVRs and
/// CVRs, failing if the batches differ in length.
pub fn overstatement_batch(
    assertion: &Assertion,
    mvrs: &[Cvr],
    cvrs: &[Cvr],
    reported_mean: f64,
) -> Result<Vec<f64>, RlaError> {
    if mvrs.len() != cvrs.len() {
        return Err(RlaError::SizeMismatch { mvrs: mvrs.len(), cvrs: cvrs.len() });
    }
    mvrs.iter()
        .zip(cvrs.iter())
        .map(|(mvr, cvr)| overstatement_assorter(assertion, mvr, cvr, reported_mean))
        .collect()
}

/// Upper bound of `B` under an assort-range `[0, u]`: `1 + u/(2*mean - 1)`.
/// Downstream mean tests need this as the nonnegative population's bound.
pub fn overstatement_upper_bound(upper_bound: f64, reported_mean: f64) -> Result<f64, RlaError> {
    let margin = 2.0 * reported_mean - 1.0;
    if margin <= 0.0 {
        return Err(RlaError::AssertionNotAuditable(String::new()));
    }
    Ok(1.0 + upper_bound / margin)
}
