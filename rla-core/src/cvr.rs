// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! The ballot model: cast-vote records (CVRs) and the pure IRV helper
//! functions defined over them.
//!
//! A CVR does not impose voting rules; it reflects what the ballot shows,
//! even if that is not a valid vote for the relevant contest. `Selection` is
//! the tagged variant used instead of a dynamically-typed value, matching
//! [`crate::assorter::AssorterKind`]'s enum-dispatch style.

use crate::error::RlaError;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashMap;

pub type ContestId = String;
pub type CandidateId = String;

/// A single recorded mark: boolean, an integer rank (1 = most preferred), or
/// a stringly-typed value tolerated for ingest from heterogeneous sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Bool(bool),
    Rank(i64),
    Str(String),
}

impl Selection {
    /// A selection absent from a CVR is represented by this falsy sentinel,
    /// rather than `Option::None`, so callers can treat "no selection" and
    /// "selection recorded as blank" identically.
    pub fn absent() -> Selection {
        Selection::Bool(false)
    }

    /// `true` iff the selection is truthy: nonempty, non-zero, not the
    /// strings `"0"` / `"false"` (case-insensitive).
    pub fn is_voted(&self) -> bool {
        match self {
            Selection::Bool(b) => *b,
            Selection::Rank(n) => *n != 0,
            Selection::Str(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
        }
    }

    /// `as_vote`: 1 iff truthy, else 0.
    pub fn as_vote(&self) -> u8 {
        self.is_voted() as u8
    }

    /// `as_rank`: the selection interpreted as an integer rank.
    pub fn rank(&self) -> i64 {
        match self {
            Selection::Bool(b) => *b as i64,
            Selection::Rank(n) => *n,
            Selection::Str(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

/// An identified ballot: an opaque id plus `contest -> candidate -> selection`.
///
/// `BTreeMap` (not `HashMap`) is used for both levels so iteration and
/// merging are deterministic, matching the "locally-owned ordered map" in
/// the concurrency model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cvr {
    pub id: String,
    pub votes: BTreeMap<ContestId, BTreeMap<CandidateId, Selection>>,
}

/// Ingest shape for [`Cvr::from_dict`]: `{"id": <string|int>, "votes": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CvrRecord {
    pub id: IdValue,
    pub votes: BTreeMap<ContestId, BTreeMap<CandidateId, Selection>>,
}

/// A ballot id may arrive as a JSON string or a JSON integer; both normalize
/// to `String` so CVRs from mixed sources compare equal.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Str(String),
    Int(i64),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            IdValue::Str(s) => s,
            IdValue::Int(n) => n.to_string(),
        }
    }
}

impl Cvr {
    /// Wraps a single contest's votes, for unit tests — mirrors the
    /// Python original's `CVR.from_vote`.
    pub fn from_vote(contest: &str, id: &str, votes: BTreeMap<CandidateId, Selection>) -> Cvr {
        let mut map = BTreeMap::new();
        map.insert(contest.to_string(), votes);
        Cvr { id: id.to_string(), votes: map }
    }

    /// Returns the stored selection if present, else the falsy sentinel.
    /// Absent contest is treated identically to absent candidate ("zero
    /// marks"), rather than raising: see the open question in spec.md §9.
    pub fn get_vote(&self, contest: &str, candidate: &str) -> Selection {
        self.votes
            .get(contest)
            .and_then(|c| c.get(candidate))
            .cloned()
            .unwrap_or_else(Selection::absent)
    }

    /// True iff exactly one candidate among `candidates` has a truthy
    /// selection in `contest` for this CVR.
    pub fn has_one_vote(&self, contest: &str, candidates: &[CandidateId]) -> bool {
        candidates
            .iter()
            .filter(|c| self.get_vote(contest, c).is_voted())
            .count()
            == 1
    }

    /// Builds a list of CVRs from dict-style ingest records.
    pub fn from_dict(records: Vec<CvrRecord>) -> Vec<Cvr> {
        records
            .into_iter()
            .map(|r| Cvr { id: r.id.into_string(), votes: r.votes })
            .collect()
    }

    /// Parses RAIRE-format CSV rows (already split into fields by the
    /// caller, e.g. with the `csv` crate). `rows[0][0]` is the count of
    /// header rows to discard after row 0; the remaining rows have the form
    /// `contest_id, ballot_id, C1, C2, ...` where `Cj` received rank `j`
    /// (1-based). The result is merged so duplicated ballot ids collapse.
    pub fn from_raire(rows: &[Vec<String>]) -> Result<Vec<Cvr>, RlaError> {
        let skip: usize = rows
            .first()
            .and_then(|r| r.first())
            .ok_or_else(|| RlaError::InvalidContest {
                contest: "raire".to_string(),
                reason: "empty RAIRE input".to_string(),
            })?
            .parse()
            .map_err(|_| RlaError::InvalidContest {
                contest: "raire".to_string(),
                reason: "header row count is not an integer".to_string(),
            })?;
        let mut cvr_list = Vec::new();
        for row in rows.iter().skip(skip + 1) {
            if row.len() < 2 {
                continue;
            }
            let contest = row[0].clone();
            let id = row[1].clone();
            let mut votes = BTreeMap::new();
            for (j, candidate) in row.iter().enumerate().skip(2) {
                votes.insert(candidate.clone(), Selection::Rank((j - 1) as i64));
            }
            cvr_list.push(Cvr::from_vote(&contest, &id, votes));
        }
        Ok(Cvr::merge(cvr_list))
    }

    /// Folds a list of CVRs that may contain duplicated ballot ids,
    /// preserving first-seen order. A later mention of a ballot id updates
    /// (replaces wholesale) any contest entries it shares a key with;
    /// contests only present in the earlier mention are left untouched.
    pub fn merge(cvr_list: Vec<Cvr>) -> Vec<Cvr> {
        let mut order: Vec<String> = Vec::new();
        let mut by_id: HashMap<String, Cvr> = HashMap::new();
        for c in cvr_list {
            match by_id.get_mut(&c.id) {
                Some(existing) => {
                    for (contest, candidate_votes) in c.votes {
                        existing.votes.insert(contest, candidate_votes);
                    }
                }
                None => {
                    order.push(c.id.clone());
                    by_id.insert(c.id.clone(), c);
                }
            }
        }
        order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
    }

    /// 1 iff this CVR counts as a vote for `loser` in the "winner only"
    /// head-to-head sense: `loser` is ranked and either `winner` is unranked
    /// or ranked after `loser`.
    pub fn rcv_lfunc_wo(&self, contest: &str, winner: &str, loser: &str) -> u8 {
        let rank_winner = self.get_vote(contest, winner);
        let rank_loser = self.get_vote(contest, loser);
        if !rank_winner.is_voted() && rank_loser.is_voted() {
            1
        } else if rank_winner.is_voted() && rank_loser.is_voted() && rank_loser.rank() < rank_winner.rank() {
            1
        } else {
            0
        }
    }

    /// 1 iff, restricting to `remaining`, `cand`'s rank is defined and no
    /// other candidate in `remaining` has a defined rank at or ahead of it.
    pub fn rcv_votefor_cand(&self, contest: &str, cand: &str, remaining: &[CandidateId]) -> u8 {
        if !remaining.iter().any(|c| c == cand) {
            return 0;
        }
        let rank_cand = self.get_vote(contest, cand);
        if !rank_cand.is_voted() {
            return 0;
        }
        for altc in remaining {
            if altc == cand {
                continue;
            }
            let rank_altc = self.get_vote(contest, altc);
            if rank_altc.is_voted() && rank_altc.rank() <= rank_cand.rank() {
                return 0;
            }
        }
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(pairs: &[(&str, Selection)]) -> BTreeMap<CandidateId, Selection> {
        pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn rcv_lfunc_wo_examples() {
        let c = Cvr::from_vote(
            "AvB",
            "1",
            vote(&[
                ("Alice", Selection::Rank(1)),
                ("Bob", Selection::Rank(2)),
                ("Candy", Selection::Rank(3)),
                ("Dan", Selection::Str(String::new())),
            ]),
        );
        assert_eq!(c.rcv_lfunc_wo("AvB", "Bob", "Alice"), 1);
        assert_eq!(c.rcv_lfunc_wo("AvB", "Alice", "Candy"), 0);
        assert_eq!(c.rcv_lfunc_wo("AvB", "Dan", "Candy"), 1);
    }

    #[test]
    fn rcv_votefor_cand_examples() {
        let c = Cvr::from_vote(
            "AvB",
            "1",
            vote(&[
                ("Alice", Selection::Rank(1)),
                ("Bob", Selection::Rank(2)),
                ("Candy", Selection::Rank(3)),
                ("Dan", Selection::Str(String::new())),
                ("Ross", Selection::Rank(4)),
                ("Aaron", Selection::Rank(5)),
            ]),
        );
        let remaining = vec!["Bob".to_string(), "Dan".to_string(), "Aaron".to_string(), "Candy".to_string()];
        assert_eq!(c.rcv_votefor_cand("AvB", "Candy", &remaining), 0);
        assert_eq!(c.rcv_votefor_cand("AvB", "Alice", &remaining), 0);
        assert_eq!(c.rcv_votefor_cand("AvB", "Bob", &remaining), 1);
        assert_eq!(c.rcv_votefor_cand("AvB", "Aaron", &remaining), 0);

        let remaining = vec!["Dan".to_string(), "Aaron".to_string(), "Candy".to_string()];
        assert_eq!(c.rcv_votefor_cand("AvB", "Candy", &remaining), 1);
        assert_eq!(c.rcv_votefor_cand("AvB", "Alice", &remaining), 0);
        assert_eq!(c.rcv_votefor_cand("AvB", "Bob", &remaining), 0);
        assert_eq!(c.rcv_votefor_cand("AvB", "Aaron", &remaining), 0);
    }

    #[test]
    fn from_raire_merges_duplicate_ballot_ids() {
        let rows: Vec<Vec<String>> = vec![
            vec!["1".to_string()],
            vec!["Contest", "339", "5", "15", "16", "17", "18", "45"]
                .into_iter()
                .map(String::from)
                .collect(),
            vec!["339", "99813_1_1", "17"].into_iter().map(String::from).collect(),
            vec!["339", "99813_1_3", "16"].into_iter().map(String::from).collect(),
            vec!["339", "99813_1_6", "18", "17", "15", "16"]
                .into_iter()
                .map(String::from)
                .collect(),
            vec!["3", "99813_1_6", "2"].into_iter().map(String::from).collect(),
        ];
        let cvrs = Cvr::from_raire(&rows).unwrap();
        assert_eq!(cvrs.len(), 3);
        assert_eq!(cvrs[0].id, "99813_1_1");
        assert_eq!(cvrs[0].votes["339"]["17"], Selection::Rank(1));
        assert_eq!(cvrs[2].id, "99813_1_6");
        assert_eq!(cvrs[2].votes["339"]["18"], Selection::Rank(1));
        assert_eq!(cvrs[2].votes["339"]["17"], Selection::Rank(2));
        assert_eq!(cvrs[2].votes["339"]["15"], Selection::Rank(3));
        assert_eq!(cvrs[2].votes["339"]["16"], Selection::Rank(4));
        assert_eq!(cvrs[2].votes["3"]["2"], Selection::Rank(1));
    }

    #[test]
    fn from_dict_preserves_order_and_ids() {
        let json = r#"[
            {"id": 1, "votes": {"AvB": {"Alice": true}, "CvD": {"Candy": true}}},
            {"id": 2, "votes": {"AvB": {"Bob": true}, "CvD": {"Elvis": true, "Candy": false}}},
            {"id": 3, "votes": {"EvF": {"Bob": 1, "Edie": 2}, "CvD": {"Elvis": false, "Candy": true}}}
        ]"#;
        let records: Vec<CvrRecord> = serde_json::from_str(json).unwrap();
        let cvrs = Cvr::from_dict(records);
        assert_eq!(cvrs.len(), 3);
        assert_eq!(cvrs[0].id, "1");
        assert_eq!(cvrs[1].id, "2");
        assert_eq!(cvrs[2].id, "3");
        assert!(cvrs[0].get_vote("AvB", "Alice").is_voted());
        assert!(cvrs[0].get_vote("CvD", "Candy").is_voted());
        assert!(!cvrs[0].get_vote("AvB", "Bob").is_voted());
        assert!(!cvrs[0].get_vote("EvF", "Bob").is_voted());
        assert!(cvrs[1].get_vote("CvD", "Elvis").is_voted());
        assert!(!cvrs[1].get_vote("CvD", "Candy").is_voted());
    }

    #[test]
    fn absent_contest_is_zero_marks_not_a_panic() {
        let c = Cvr::from_vote("AvB", "1", vote(&[("Alice", Selection::Bool(true))]));
        assert!(!c.has_one_vote("NoSuchContest", &["Alice".to_string()]));
        assert!(!c.get_vote("NoSuchContest", "Alice").is_voted());
    }
}
