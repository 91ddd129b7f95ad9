// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! Reduces a contest's reported outcome to a set of [`Assertion`]s whose
//! simultaneous "mean > 1/2" truth implies the reported outcome is correct.
//!
//! One factory function per supported social choice function, dispatched by
//! [`make_all_assertions`] — mirrors the one-struct-per-assertion-shape,
//! enum-tagged style of the teacher's `assertions.rs`.

use crate::assorter::{Assorter, AssorterKind};
use crate::cvr::{CandidateId, ContestId, Cvr};
use crate::error::RlaError;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceFunction {
    Plurality,
    Supermajority,
    #[serde(rename = "IRV")]
    Irv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaireAssertionType {
    #[serde(rename = "WINNER_ONLY")]
    WinnerOnly,
    #[serde(rename = "IRV_ELIMINATION")]
    IrvElimination,
}

/// One assertion as emitted by an external RAIRE run, per spec.md §3/§6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaireAssertionDescriptor {
    pub assertion_type: RaireAssertionType,
    pub winner: CandidateId,
    pub loser: CandidateId,
    #[serde(default)]
    pub already_eliminated: Vec<CandidateId>,
}

/// Contest-level metadata needed to construct its assertions and to validate
/// audit parameters (spec.md §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestDescriptor {
    pub choice_function: ChoiceFunction,
    pub candidates: Vec<CandidateId>,
    pub reported_winners: Vec<CandidateId>,
    pub n_winners: usize,
    pub risk_limit: f64,
    #[serde(default)]
    pub share_to_win: Option<f64>,
    #[serde(default)]
    pub assertion_json: Option<Vec<RaireAssertionDescriptor>>,
}

/// A claim that the mean of `assorter` over all ballots exceeds 1/2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    pub contest_id: ContestId,
    pub key: String,
    pub assorter: Assorter,
}

impl Assertion {
    pub fn mean(&self, cvrs: &[Cvr]) -> f64 {
        let sum: f64 = cvrs.iter().map(|c| self.assorter.assort(c)).sum();
        sum / cvrs.len() as f64
    }

    pub fn sum(&self, cvrs: &[Cvr]) -> f64 {
        cvrs.iter().map(|c| self.assorter.assort(c)).sum()
    }

    pub fn margin(&self, cvrs: &[Cvr]) -> f64 {
        2.0 * self.mean(cvrs) - 1.0
    }
}

/// One assertion per `(winner, loser)` pair: `|winners| x |losers|`
/// assertions in all, keyed `"w v l"`.
pub fn make_plurality_assertions(
    contest: &str,
    winners: &[CandidateId],
    losers: &[CandidateId],
) -> BTreeMap<String, Assertion> {
    let mut out = BTreeMap::new();
    for w in winners {
        for l in losers {
            let key = format!("{w} v {l}");
            out.insert(
                key.clone(),
                Assertion {
                    contest_id: contest.to_string(),
                    key,
                    assorter: Assorter {
                        contest_id: contest.to_string(),
                        kind: AssorterKind::Plurality { winner: w.clone(), loser: l.clone() },
                        upper_bound: 1.0,
                    },
                },
            );
        }
    }
    out
}

/// A single assertion keyed `"w v all"`, asserting `winner` received at
/// least `share_to_win` of the valid vote.
pub fn make_supermajority_assertion(
    contest: &str,
    winner: &str,
    losers: &[CandidateId],
    share_to_win: f64,
) -> Result<BTreeMap<String, Assertion>, RlaError> {
    if !(share_to_win > 0.5 && share_to_win < 1.0) {
        return Err(RlaError::InvalidShare);
    }
    let mut candidates = losers.to_vec();
    candidates.push(winner.to_string());
    let key = format!("{winner} v all");
    let mut out = BTreeMap::new();
    out.insert(
        key.clone(),
        Assertion {
            contest_id: contest.to_string(),
            key,
            assorter: Assorter {
                contest_id: contest.to_string(),
                kind: AssorterKind::Supermajority { winner: winner.to_string(), candidates, share_to_win },
                upper_bound: 1.0 / (2.0 * share_to_win),
            },
        },
    );
    Ok(out)
}

/// Builds assertions from a RAIRE-style JSON assertion list for one contest.
pub fn make_assertions_from_json(
    contest: &str,
    candidates: &[CandidateId],
    descriptors: &[RaireAssertionDescriptor],
) -> Result<BTreeMap<String, Assertion>, RlaError> {
    let mut out = BTreeMap::new();
    for d in descriptors {
        match d.assertion_type {
            RaireAssertionType::WinnerOnly => {
                let key = format!("{} v {}", d.winner, d.loser);
                out.insert(
                    key.clone(),
                    Assertion {
                        contest_id: contest.to_string(),
                        key,
                        assorter: Assorter {
                            contest_id: contest.to_string(),
                            kind: AssorterKind::IrvWinnerOnly { winner: d.winner.clone(), loser: d.loser.clone() },
                            upper_bound: 1.0,
                        },
                    },
                );
            }
            RaireAssertionType::IrvElimination => {
                let elim = &d.already_eliminated;
                let remaining: Vec<CandidateId> =
                    candidates.iter().filter(|c| !elim.contains(c)).cloned().collect();
                let key = format!("{} v {} elim {}", d.winner, d.loser, elim.join(" "));
                out.insert(
                    key.clone(),
                    Assertion {
                        contest_id: contest.to_string(),
                        key,
                        assorter: Assorter {
                            contest_id: contest.to_string(),
                            kind: AssorterKind::IrvElimination {
                                winner: d.winner.clone(),
                                loser: d.loser.clone(),
                                remaining,
                            },
                            upper_bound: 1.0,
                        },
                    },
                );
            }
        }
    }
    Ok(out)
}

/// Routes each contest to the matching factory by `choice_function`.
pub fn make_all_assertions(
    contests: &BTreeMap<ContestId, ContestDescriptor>,
) -> Result<BTreeMap<ContestId, BTreeMap<String, Assertion>>, RlaError> {
    let mut all = BTreeMap::new();
    for (id, contest) in contests {
        let losers: Vec<CandidateId> = contest
            .candidates
            .iter()
            .filter(|c| !contest.reported_winners.contains(c))
            .cloned()
            .collect();
        let assertions = match contest.choice_function {
            ChoiceFunction::Plurality => make_plurality_assertions(id, &contest.reported_winners, &losers),
            ChoiceFunction::Supermajority => {
                let winner = contest.reported_winners.first().ok_or_else(|| RlaError::InvalidContest {
                    contest: id.clone(),
                    reason: "supermajority contest has no reported winner".to_string(),
                })?;
                let share_to_win = contest.share_to_win.ok_or_else(|| RlaError::InvalidContest {
                    contest: id.clone(),
                    reason: "supermajority contest missing share_to_win".to_string(),
                })?;
                make_supermajority_assertion(id, winner, &losers, share_to_win)?
            }
            ChoiceFunction::Irv => {
                let descriptors = contest.assertion_json.as_deref().ok_or_else(|| RlaError::InvalidContest {
                    contest: id.clone(),
                    reason: "IRV contest missing assertion_json".to_string(),
                })?;
                make_assertions_from_json(id, &contest.candidates, descriptors)?
            }
        };
        all.insert(id.clone(), assertions);
    }
    Ok(all)
}
