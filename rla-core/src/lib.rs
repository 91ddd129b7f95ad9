// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! Statistical and combinatorial core of a risk-limiting audit (RLA)
//! toolkit: reduces a contest's reported outcome to assertions over
//! ballot-level assorters, reduces `(mvr, cvr)` pairs to overstatement
//! samples, and runs sequentially-valid p-value tests over those samples.
//!
//! Audit workflow orchestration, ballot sampling, and report rendering are
//! out of scope; see `rla-cli` for a thin driver built on top of this crate.

pub mod assertion;
pub mod assorter;
pub mod audit_log;
pub mod cvr;
pub mod error;
pub mod nonneg_mean;
pub mod overstatement;
pub mod validate;

pub use assertion::{make_all_assertions, Assertion, ChoiceFunction, ContestDescriptor};
pub use assorter::{Assorter, AssorterKind};
pub use cvr::{Cvr, Selection};
pub use error::RlaError;
pub use overstatement::{overstatement_assorter, overstatement_batch};
