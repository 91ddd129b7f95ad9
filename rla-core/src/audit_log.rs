// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! The audit-parameter log writer (spec.md §6 egress format).
//!
//! `write_audit_parameters` holds its file resource only for the scope of
//! the write; `File`'s `Drop` releases it on every exit path, including a
//! serialisation error, which is what spec.md §5 requires without needing
//! an explicit `close()`.

use crate::assertion::ContestDescriptor;
use crate::cvr::ContestId;
use crate::error::RlaError;
use crate::validate::{ErrorRates, RiskFunction};
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// The audit-parameter log: everything an outer driver or a later re-audit
/// needs to reproduce this audit's statistical setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditParameterLog {
    pub seed: u64,
    pub replacement: bool,
    pub risk_function: RiskFunction,
    pub g: f64,
    #[serde(rename = "N_ballots")]
    pub n_ballots: usize,
    pub error_rates: ErrorRates,
    pub contests: BTreeMap<ContestId, ContestDescriptor>,
}

/// Serialises `log` as pretty JSON to `path`, creating or truncating it.
pub fn write_audit_parameters(path: &Path, log: &AuditParameterLog) -> Result<(), RlaError> {
    let file = File::create(path).map_err(|e| RlaError::Io(e.to_string()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log).map_err(|e| RlaError::Io(e.to_string()))
}
