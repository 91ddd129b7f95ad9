// Based on software (c) Philip B. Stark and collaborators, assertion_audit_utils.py (SHANGRLA).

//! Converts a RAIRE-format CSV file (spec.md §6 ingest format) into the
//! CVR JSON array this crate's other tools consume.

use anyhow::{anyhow, Context};
use clap::Parser;
use rla_core::cvr::Cvr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Reads a RAIRE CSV ballot file and writes the equivalent merged CVR list as JSON.
struct CliOptions {
    /// The RAIRE CSV file to parse.
    input_raire_file: PathBuf,
    /// Where to write the CVR JSON array. Default: the input's file stem with `.json`.
    output_json_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env().format_timestamp_millis().filter_level(log::LevelFilter::Info).init();
    let args = CliOptions::parse();

    let rows = read_rows(&args.input_raire_file)?;
    let cvrs = Cvr::from_raire(&rows).map_err(|e| anyhow!("parsing RAIRE csv: {e}"))?;
    log::info!("parsed {} ballots into {} merged CVRs", rows.len(), cvrs.len());

    let output_file = args.output_json_file.unwrap_or_else(|| {
        let mut stem = args.input_raire_file.file_stem().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("output"));
        stem.as_mut_os_string().push(".json");
        stem
    });
    serde_json::to_writer(File::create(&output_file)?, &cvrs)?;
    Ok(())
}

fn read_rows(path: &PathBuf) -> anyhow::Result<Vec<Vec<String>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        rows.push(line.split(',').map(|s| s.trim().to_string()).collect());
    }
    Ok(rows)
}
