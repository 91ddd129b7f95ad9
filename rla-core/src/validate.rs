// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! Pre-flight validation of audit parameters (spec.md §6). All checks here
//! must run, and pass, before any nonneg-mean test or assertion factory call
//! is made against the same data — per spec.md §7, "Validation errors must
//! be raised before any test is run".

use crate::assertion::{ChoiceFunction, ContestDescriptor};
use crate::cvr::ContestId;
use crate::error::RlaError;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// The risk function named by an audit-parameter log; only `KaplanMarkov`
/// and `KaplanWald` take a padding constant `g`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFunction {
    KaplanMarkov,
    KaplanWald,
    KaplanKolmogorov,
    WaldSprt,
    KaplanMartingale,
}

impl RiskFunction {
    fn requires_padding(self) -> bool {
        matches!(self, RiskFunction::KaplanMarkov | RiskFunction::KaplanWald)
    }
}

/// The four discrepancy rates tracked by a comparison audit: one- and
/// two-vote over- and understatements. All must be nonnegative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ErrorRates {
    pub o1_rate: f64,
    pub o2_rate: f64,
    pub u1_rate: f64,
    pub u2_rate: f64,
}

impl ErrorRates {
    fn all_nonnegative(&self) -> bool {
        self.o1_rate >= 0.0 && self.o2_rate >= 0.0 && self.u1_rate >= 0.0 && self.u2_rate >= 0.0
    }
}

/// Validates the audit-wide parameters and every contest descriptor in
/// `contests`, in the order spec.md §6 lists them. Returns the first
/// violation found.
pub fn check_audit_parameters(
    risk_function: RiskFunction,
    g: f64,
    error_rates: &ErrorRates,
    contests: &BTreeMap<ContestId, ContestDescriptor>,
) -> Result<(), RlaError> {
    if risk_function.requires_padding() && !(0.0..1.0).contains(&g) {
        return Err(RlaError::InvalidAuditParameters(format!(
            "g must be in [0,1) for risk function {risk_function:?}, got {g}"
        )));
    }
    if !error_rates.all_nonnegative() {
        return Err(RlaError::InvalidAuditParameters("error rates must all be nonnegative".to_string()));
    }
    for (id, contest) in contests {
        check_contest(id, contest)?;
    }
    Ok(())
}

fn check_contest(id: &str, contest: &ContestDescriptor) -> Result<(), RlaError> {
    if !(contest.risk_limit > 0.0 && contest.risk_limit < 1.0) {
        return Err(RlaError::InvalidContest { contest: id.to_string(), reason: "risk_limit must be in (0,1)".to_string() });
    }
    if contest.n_winners > contest.candidates.len() {
        return Err(RlaError::InvalidContest {
            contest: id.to_string(),
            reason: "n_winners exceeds the number of candidates".to_string(),
        });
    }
    if contest.reported_winners.len() != contest.n_winners {
        return Err(RlaError::InvalidContest {
            contest: id.to_string(),
            reason: "reported_winners length does not match n_winners".to_string(),
        });
    }
    for w in &contest.reported_winners {
        if !contest.candidates.contains(w) {
            return Err(RlaError::InvalidContest {
                contest: id.to_string(),
                reason: format!("reported winner {w} is not among the contest's candidates"),
            });
        }
    }
    match contest.choice_function {
        ChoiceFunction::Irv | ChoiceFunction::Supermajority if contest.n_winners != 1 => {
            return Err(RlaError::InvalidContest {
                contest: id.to_string(),
                reason: "IRV and supermajority contests must have exactly one winner".to_string(),
            });
        }
        _ => {}
    }
    match contest.choice_function {
        ChoiceFunction::Irv => {
            if contest.assertion_json.is_none() {
                return Err(RlaError::InvalidContest {
                    contest: id.to_string(),
                    reason: "IRV contest is missing its RAIRE assertion file".to_string(),
                });
            }
        }
        ChoiceFunction::Supermajority => match contest.share_to_win {
            Some(s) if s >= 0.5 => {}
            _ => {
                return Err(RlaError::InvalidContest {
                    contest: id.to_string(),
                    reason: "supermajority contest requires share_to_win >= 1/2".to_string(),
                });
            }
        },
        ChoiceFunction::Plurality => {}
    }
    Ok(())
}
