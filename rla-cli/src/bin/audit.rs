// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! Thin demonstration driver: ingest contest descriptors and CVR/MVR JSON,
//! build assertions, overstatement-reduce, run one nonneg-mean test per
//! assertion, and write the audit-parameter log. Does not implement ballot
//! sampling or risk-limit-driven escalation — those are orchestration
//! concerns outside this crate.

use anyhow::{anyhow, Context};
use clap::Parser;
use rla_core::assertion::{make_all_assertions, ContestDescriptor};
use rla_core::audit_log::{write_audit_parameters, AuditParameterLog};
use rla_core::cvr::{Cvr, CvrRecord};
use rla_core::nonneg_mean::{kaplan_martingale, PopulationSize};
use rla_core::overstatement::overstatement_batch;
use rla_core::validate::{check_audit_parameters, ErrorRates, RiskFunction};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Runs a single round of overstatement-based risk computation over a set
/// of contests, given reported CVRs and their audited (manual) counterparts.
struct CliOptions {
    /// JSON map of contest_id -> contest descriptor.
    contests_json_file: PathBuf,
    /// JSON array of CVR records (dict ingest format).
    cvrs_json_file: PathBuf,
    /// JSON array of MVR records, in the same order as the CVRs.
    mvrs_json_file: PathBuf,
    /// Padding constant for Kaplan-Markov/Kaplan-Wald.
    #[arg(long, default_value_t = 0.1)]
    g: f64,
    /// Where to write the audit-parameter log. Default: no log is written.
    #[arg(long)]
    audit_log_out: Option<PathBuf>,
    /// Seed recorded in the audit-parameter log.
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env().format_timestamp_millis().filter_level(log::LevelFilter::Info).init();
    let args = CliOptions::parse();

    let contests: BTreeMap<String, ContestDescriptor> =
        serde_json::from_reader(File::open(&args.contests_json_file).context("opening contests file")?)?;
    let cvr_records: Vec<CvrRecord> =
        serde_json::from_reader(File::open(&args.cvrs_json_file).context("opening cvrs file")?)?;
    let mvr_records: Vec<CvrRecord> =
        serde_json::from_reader(File::open(&args.mvrs_json_file).context("opening mvrs file")?)?;
    let cvrs = Cvr::from_dict(cvr_records);
    let mvrs = Cvr::from_dict(mvr_records);

    let error_rates = ErrorRates { o1_rate: 0.0, o2_rate: 0.0, u1_rate: 0.0, u2_rate: 0.0 };
    check_audit_parameters(RiskFunction::KaplanMartingale, args.g, &error_rates, &contests)
        .map_err(|e| anyhow!("invalid audit parameters: {e}"))?;
    log::info!("{} contests validated", contests.len());

    let all_assertions = make_all_assertions(&contests).map_err(|e| anyhow!("building assertions: {e}"))?;

    for (contest_id, assertions) in &all_assertions {
        for (key, assertion) in assertions {
            let reported_mean = assertion.mean(&cvrs);
            let samples = overstatement_batch(assertion, &mvrs, &cvrs, reported_mean)
                .map_err(|e| anyhow!("overstatement reduction for {contest_id}/{key}: {e}"))?;
            let (p, _trajectory) = kaplan_martingale(&samples, PopulationSize::Finite(cvrs.len()), 0.5, true)
                .map_err(|e| anyhow!("p-value computation for {contest_id}/{key}: {e}"))?;
            println!("{contest_id}\t{key}\tmean={reported_mean:.6}\tp={p:.6}");
        }
    }

    if let Some(out) = args.audit_log_out {
        let log = AuditParameterLog {
            seed: args.seed,
            replacement: false,
            risk_function: RiskFunction::KaplanMartingale,
            g: args.g,
            n_ballots: cvrs.len(),
            error_rates,
            contests,
        };
        write_audit_parameters(&out, &log).map_err(|e| anyhow!("writing audit log: {e}"))?;
        log::info!("wrote audit parameters to {}", out.display());
    }

    Ok(())
}
