// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).
//! Error kinds raised synchronously by the audit core, per the detecting call site.

use serde::Deserialize;
use serde::Serialize;

#[derive(thiserror::Error, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum RlaError {
    /// A sample value was negative, where the population is assumed nonnegative.
    #[error("negative value in sample from a nonnegative population")]
    NegativeSample,
    /// A Wald SPRT sample contained a value other than 0 or 1.
    #[error("sample must be binary for the Wald SPRT")]
    NonBinarySample,
    /// Kaplan-Wald padding `g` was negative.
    #[error("g cannot be negative")]
    InvalidPadding,
    /// Supermajority `share_to_win` was not in `(1/2, 1)`.
    #[error("share_to_win must be strictly between 1/2 and 1")]
    InvalidShare,
    /// `choice_function` named an unsupported social choice function.
    #[error("social choice function {0} is not supported")]
    UnsupportedChoiceFunction(String),
    /// A RAIRE assertion descriptor named an unknown `assertion_type`.
    #[error("assertion type {0} is not recognised")]
    InvalidAssertionType(String),
    /// A contest descriptor failed preflight validation.
    #[error("invalid contest {contest}: {reason}")]
    InvalidContest { contest: String, reason: String },
    /// MVR and CVR batches differed in length.
    #[error("number of mvrs ({mvrs}) differs from number of cvrs ({cvrs})")]
    SizeMismatch { mvrs: usize, cvrs: usize },
    /// Sample size exceeded the declared population size, or `N` was non-integral.
    #[error("sample size {n} exceeds population size {population}")]
    PopulationOverrun { n: usize, population: String },
    /// The reported margin for an assertion was non-positive, so no overstatement-assorter
    /// can be constructed: the assertion cannot be proven by a sample.
    #[error("assertion on contest {0} is not auditable: reported margin is non-positive")]
    AssertionNotAuditable(String),
    /// Audit-wide (not per-contest) preflight parameters failed validation.
    #[error("invalid audit parameters: {0}")]
    InvalidAuditParameters(String),
    /// The audit-log writer could not read or write its target file.
    #[error("audit log I/O error: {0}")]
    Io(String),
}
