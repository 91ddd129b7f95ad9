//! Cross-module scenarios exercising the full assertion -> overstatement ->
//! p-value pipeline, and the invariants that don't fit naturally in a single
//! module's unit tests.

use rla_core::assertion::{
    make_all_assertions, ChoiceFunction, ContestDescriptor, RaireAssertionDescriptor, RaireAssertionType,
};
use rla_core::cvr::{Cvr, Selection};
use rla_core::nonneg_mean::{kaplan_martingale, PopulationSize};
use rla_core::overstatement::overstatement_batch;
use std::collections::BTreeMap;

fn vote(contest: &str, id: &str, candidate: &str, sel: Selection) -> Cvr {
    Cvr::from_vote(contest, id, [(candidate.to_string(), sel)].into())
}

#[test]
/// A plurality contest carried end to end: assertions are built from the
/// descriptor, overstatement-reduced against a perfect (no-discrepancy)
/// manual interpretation, and the resulting sample clears p <= risk_limit
/// under Kaplan's martingale.
fn plurality_end_to_end_no_discrepancy_yields_small_p() {
    let mut contests = BTreeMap::new();
    contests.insert(
        "AvB".to_string(),
        ContestDescriptor {
            choice_function: ChoiceFunction::Plurality,
            candidates: vec!["Alice".to_string(), "Bob".to_string()],
            reported_winners: vec!["Alice".to_string()],
            n_winners: 1,
            risk_limit: 0.05,
            share_to_win: None,
            assertion_json: None,
        },
    );
    let all = make_all_assertions(&contests).unwrap();
    let assertion = &all["AvB"]["Alice v Bob"];

    let mut cvrs = Vec::new();
    for i in 0..80 {
        cvrs.push(vote("AvB", &i.to_string(), "Alice", Selection::Bool(true)));
    }
    for i in 80..100 {
        cvrs.push(vote("AvB", &i.to_string(), "Bob", Selection::Bool(true)));
    }
    let mvrs = cvrs.clone();

    let reported_mean = assertion.mean(&cvrs);
    assert!(reported_mean > 0.5);
    let samples = overstatement_batch(assertion, &mvrs, &cvrs, reported_mean).unwrap();
    let (p, _) = kaplan_martingale(&samples, PopulationSize::Finite(cvrs.len()), 0.5, true).unwrap();
    assert!(p <= 0.05, "expected a small p-value for a clean 80/20 sample, got {p}");
}

#[test]
/// A full swing (the manual interpretation shows a vote for the loser where
/// the machine recorded a vote for the winner) is a two-vote overstatement:
/// its overstatement-assorter value is `1 - 1/margin`, which goes negative
/// whenever the margin is below 1. `kaplan_martingale` must refuse such a
/// sample rather than silently reporting a (meaningless) p-value — the
/// caller is expected to treat this as grounds to escalate to a full hand
/// count, not to paper over it.
fn plurality_end_to_end_two_vote_overstatement_yields_negative_sample_error() {
    let mut contests = BTreeMap::new();
    contests.insert(
        "AvB".to_string(),
        ContestDescriptor {
            choice_function: ChoiceFunction::Plurality,
            candidates: vec!["Alice".to_string(), "Bob".to_string()],
            reported_winners: vec!["Alice".to_string()],
            n_winners: 1,
            risk_limit: 0.05,
            share_to_win: None,
            assertion_json: None,
        },
    );
    let all = make_all_assertions(&contests).unwrap();
    let assertion = &all["AvB"]["Alice v Bob"];

    let mut cvrs = Vec::new();
    for i in 0..90 {
        cvrs.push(vote("AvB", &i.to_string(), "Alice", Selection::Bool(true)));
    }
    for i in 90..100 {
        cvrs.push(vote("AvB", &i.to_string(), "Bob", Selection::Bool(true)));
    }
    let reported_mean = assertion.mean(&cvrs);
    assert!((reported_mean - 0.9).abs() < 1e-12);

    // One ballot the CVR says went to Alice actually went to Bob.
    let mut mvrs = cvrs.clone();
    mvrs[0].votes.get_mut("AvB").unwrap().clear();
    mvrs[0].votes.get_mut("AvB").unwrap().insert("Bob".to_string(), Selection::Bool(true));

    let samples = overstatement_batch(assertion, &mvrs, &cvrs, reported_mean).unwrap();
    assert!(samples[0] < 0.0, "a full swing should overstate past zero, got {}", samples[0]);
    assert_eq!(
        kaplan_martingale(&samples, PopulationSize::Finite(cvrs.len()), 0.5, true),
        Err(rla_core::error::RlaError::NegativeSample)
    );
}

#[test]
/// `merge` preserves first-seen order and, on an id collision, takes the
/// union of contest maps with later entries overriding earlier ones for the
/// same contest key — spec.md §8's merge invariant, stated directly rather
/// than only indirectly via `from_raire`.
fn merge_overrides_same_contest_key_and_unions_others() {
    let a = vote("AvB", "1", "Alice", Selection::Bool(true));
    let mut b = Cvr::from_vote("AvB", "1", [("Bob".to_string(), Selection::Bool(true))].into());
    b.votes.insert("CvD".to_string(), [("Candy".to_string(), Selection::Bool(true))].into());

    let merged = Cvr::merge(vec![a, b]);
    assert_eq!(merged.len(), 1);
    let m = &merged[0];
    // "AvB" came from both; the later record (b) wins outright for that key.
    assert!(!m.get_vote("AvB", "Alice").is_voted());
    assert!(m.get_vote("AvB", "Bob").is_voted());
    // "CvD" only appeared in b, and survives the union.
    assert!(m.get_vote("CvD", "Candy").is_voted());
}

#[test]
/// Every assorter shape stays within `[0, upper_bound]` across a spread of
/// CVRs, including ones that mark nothing relevant to the assorter at all.
fn assort_values_stay_within_bounds_for_every_kind() {
    let mut contests = BTreeMap::new();
    contests.insert(
        "Plur".to_string(),
        ContestDescriptor {
            choice_function: ChoiceFunction::Plurality,
            candidates: vec!["Alice".to_string(), "Bob".to_string(), "Candy".to_string()],
            reported_winners: vec!["Alice".to_string()],
            n_winners: 1,
            risk_limit: 0.05,
            share_to_win: None,
            assertion_json: None,
        },
    );
    contests.insert(
        "Super".to_string(),
        ContestDescriptor {
            choice_function: ChoiceFunction::Supermajority,
            candidates: vec!["Alice".to_string(), "Bob".to_string()],
            reported_winners: vec!["Alice".to_string()],
            n_winners: 1,
            risk_limit: 0.05,
            share_to_win: Some(2.0 / 3.0),
            assertion_json: None,
        },
    );
    contests.insert(
        "Irv".to_string(),
        ContestDescriptor {
            choice_function: ChoiceFunction::Irv,
            candidates: vec!["Alice".to_string(), "Bob".to_string(), "Candy".to_string()],
            reported_winners: vec!["Alice".to_string()],
            n_winners: 1,
            risk_limit: 0.05,
            share_to_win: None,
            assertion_json: Some(vec![
                RaireAssertionDescriptor {
                    assertion_type: RaireAssertionType::WinnerOnly,
                    winner: "Alice".to_string(),
                    loser: "Bob".to_string(),
                    already_eliminated: vec![],
                },
                RaireAssertionDescriptor {
                    assertion_type: RaireAssertionType::IrvElimination,
                    winner: "Alice".to_string(),
                    loser: "Candy".to_string(),
                    already_eliminated: vec!["Bob".to_string()],
                },
            ]),
        },
    );
    let all = make_all_assertions(&contests).unwrap();

    let probe_cvrs = vec![
        Cvr::default(),
        vote("Plur", "1", "Alice", Selection::Bool(true)),
        vote("Super", "1", "Bob", Selection::Bool(true)),
        vote("Irv", "1", "Candy", Selection::Rank(1)),
    ];
    for (_, assertions) in &all {
        for assertion in assertions.values() {
            for c in &probe_cvrs {
                let v = assertion.assorter.assort(c);
                assert!(
                    (0.0..=assertion.assorter.upper_bound + 1e-12).contains(&v),
                    "{} produced {v} outside [0, {}]",
                    assertion.key,
                    assertion.assorter.upper_bound
                );
            }
        }
    }
}
