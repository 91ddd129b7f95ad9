// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! The assorter: a bounded, nonnegative function of a CVR.
//!
//! Rather than a boxed `winner`/`loser` closure pair (as in the Python
//! original), each assorter shape is materialised as a variant of
//! [`AssorterKind`] with a single dispatching `assort`, the same pattern the
//! teacher repo uses for [`crate::error::RlaError`]'s sibling concept,
//! `AuditType`. This keeps an `Assorter` cheaply `Clone` and serializable.

use crate::cvr::{CandidateId, ContestId, Cvr};
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssorterKind {
    /// `(winner − loser + 1)/2`, one-hot on a vote for either.
    Plurality { winner: CandidateId, loser: CandidateId },
    /// `vote(winner)/(2·share_to_win)` when exactly one of `candidates` is
    /// marked, else `1/2`.
    Supermajority { winner: CandidateId, candidates: Vec<CandidateId>, share_to_win: f64 },
    /// RAIRE `WINNER_ONLY`: `winner` is first preference vs. the
    /// winner-only loser indicator.
    IrvWinnerOnly { winner: CandidateId, loser: CandidateId },
    /// RAIRE `IRV_ELIMINATION`: head-to-head among `remaining` candidates.
    IrvElimination { winner: CandidateId, loser: CandidateId, remaining: Vec<CandidateId> },
}

/// A bounded, nonnegative, deterministic function of a CVR, fixed to one
/// contest. `0 <= assort(cvr) <= upper_bound` for every CVR, by construction
/// of each [`AssorterKind`] variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assorter {
    pub contest_id: ContestId,
    pub kind: AssorterKind,
    pub upper_bound: f64,
}

impl Assorter {
    pub fn assort(&self, cvr: &Cvr) -> f64 {
        match &self.kind {
            AssorterKind::Plurality { winner, loser } => {
                let w = cvr.get_vote(&self.contest_id, winner).as_vote() as f64;
                let l = cvr.get_vote(&self.contest_id, loser).as_vote() as f64;
                (w - l + 1.0) / 2.0
            }
            AssorterKind::Supermajority { winner, candidates, share_to_win } => {
                if cvr.has_one_vote(&self.contest_id, candidates) {
                    cvr.get_vote(&self.contest_id, winner).as_vote() as f64 / (2.0 * share_to_win)
                } else {
                    0.5
                }
            }
            AssorterKind::IrvWinnerOnly { winner, loser } => {
                let sel = cvr.get_vote(&self.contest_id, winner);
                let w = (sel.is_voted() && sel.rank() == 1) as u8 as f64;
                let l = cvr.rcv_lfunc_wo(&self.contest_id, winner, loser) as f64;
                (w - l + 1.0) / 2.0
            }
            AssorterKind::IrvElimination { winner, loser, remaining } => {
                let w = cvr.rcv_votefor_cand(&self.contest_id, winner, remaining) as f64;
                let l = cvr.rcv_votefor_cand(&self.contest_id, loser, remaining) as f64;
                (w - l + 1.0) / 2.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cvr::Selection;
    use std::collections::BTreeMap;

    fn vote(pairs: &[(&str, Selection)]) -> BTreeMap<CandidateId, Selection> {
        pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn plurality_assort_values() {
        let a = Assorter {
            contest_id: "AvB".into(),
            kind: AssorterKind::Plurality { winner: "Alice".into(), loser: "Candy".into() },
            upper_bound: 1.0,
        };
        assert_eq!(a.assort(&Cvr::from_vote("AvB", "1", vote(&[("Alice", Selection::Rank(1))]))), 1.0);
        assert_eq!(a.assort(&Cvr::from_vote("AvB", "1", vote(&[("Bob", Selection::Rank(1))]))), 0.5);
        assert_eq!(a.assort(&Cvr::from_vote("AvB", "1", vote(&[("Candy", Selection::Rank(1))]))), 0.0);
        assert_eq!(a.assort(&Cvr::from_vote("AvB", "1", vote(&[("Dan", Selection::Rank(1))]))), 0.5);
    }

    #[test]
    fn supermajority_assort_values() {
        let share_to_win = 2.0 / 3.0;
        let a = Assorter {
            contest_id: "AvB".into(),
            kind: AssorterKind::Supermajority {
                winner: "Alice".into(),
                candidates: vec!["Bob".into(), "Candy".into(), "Alice".into()],
                share_to_win,
            },
            upper_bound: 1.0 / (2.0 * share_to_win),
        };
        assert_eq!(a.assort(&Cvr::from_vote("AvB", "1", vote(&[("Alice", Selection::Rank(1))]))), 0.75);
        assert_eq!(a.assort(&Cvr::from_vote("AvB", "1", vote(&[("Bob", Selection::Bool(true))]))), 0.0);
        assert_eq!(a.assort(&Cvr::from_vote("AvB", "1", vote(&[("Dan", Selection::Bool(true))]))), 0.5);
        assert_eq!(
            a.assort(&Cvr::from_vote(
                "AvB",
                "1",
                vote(&[("Alice", Selection::Bool(true)), ("Bob", Selection::Bool(true))])
            )),
            0.5
        );
    }
}
