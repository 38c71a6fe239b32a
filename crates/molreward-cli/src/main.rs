//! molreward — reward scoring for generated molecules.
//! Entry point for the command-line binary.

use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use molreward_chem::AlertCatalog;
use molreward_common::telemetry::{init_tracing, DEFAULT_FILTER};
use molreward_common::ScoringConfig;
use molreward_molecules::{MoleculesPipeline, PredictorSet, ProgressSink, PropertyEvaluator};

#[derive(Parser, Debug)]
#[command(name = "molreward")]
#[command(about = "Multi-objective reward scoring for candidate molecules")]
struct Args {
    /// Scoring configuration (toml, yaml or json). Defaults to
    /// $MOLREWARD_CONFIG or ./molreward.toml when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ignore configured potency predictors
    #[arg(long, global = true)]
    no_predictors: bool,

    /// Disable the structural alert filter
    #[arg(long, global = true)]
    no_alerts: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score molecules and print one JSON line per input
    Score {
        /// SMILES strings; read from --input or stdin when omitted
        smiles: Vec<String>,

        /// File with one SMILES per line
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Sort output by reward, best first
        #[arg(long)]
        rank: bool,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// Run the drug-likeness candidate screen
    Screen {
        smiles: Vec<String>,

        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print only passing candidates
        #[arg(long)]
        passing: bool,
    },
}

/// indicatif progress bar as a pipeline progress sink.
struct BarProgress(ProgressBar);

impl ProgressSink for BarProgress {
    fn advance(&self, n: u64) {
        self.0.inc(n);
    }

    fn finish(&self) {
        self.0.finish_and_clear();
    }
}

#[derive(Serialize)]
struct ScreenLine<'a> {
    smiles: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<molreward_molecules::CandidateReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    init_tracing(DEFAULT_FILTER);
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ScoringConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScoringConfig::load()?,
    };

    let alerts = if args.no_alerts {
        AlertCatalog::empty()
    } else {
        AlertCatalog::pains()
    };
    let evaluator = PropertyEvaluator::from_config(&config, Arc::new(alerts));

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match args.command {
        Command::Score { smiles, input, rank, quiet } => {
            let smiles = collect_smiles(smiles, input.as_deref())?;
            let predictors = load_predictors(&config, args.no_predictors)?;

            let mut pipeline = MoleculesPipeline::from_config(&config, evaluator);
            if !quiet {
                let bar = ProgressBar::new(smiles.len() as u64);
                bar.set_style(ProgressStyle::with_template(
                    "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} molecules",
                )?);
                pipeline = pipeline.with_progress(Box::new(BarProgress(bar)));
            }

            info!(molecules = smiles.len(), potency = predictors.is_full(), "Scoring batch");
            let scored = if rank {
                pipeline.run(&smiles, &predictors)
            } else {
                pipeline.score_batch(&smiles, &predictors)
            };
            for molecule in &scored {
                writeln!(out, "{}", serde_json::to_string(molecule)?)?;
            }
        }
        Command::Screen { smiles, input, passing } => {
            let smiles = collect_smiles(smiles, input.as_deref())?;
            let mut passed = 0usize;
            for smi in &smiles {
                let line = match evaluator.assess_candidate(smi) {
                    Ok(report) => {
                        if report.passes() {
                            passed += 1;
                        } else if passing {
                            continue;
                        }
                        ScreenLine { smiles: smi, report: Some(report), error: None }
                    }
                    Err(_) if passing => continue,
                    Err(e) => ScreenLine { smiles: smi, report: None, error: Some(e.to_string()) },
                };
                writeln!(out, "{}", serde_json::to_string(&line)?)?;
            }
            info!(screened = smiles.len(), passed, "Candidate screen complete");
        }
    }

    out.flush()?;
    Ok(())
}

fn load_predictors(config: &ScoringConfig, disabled: bool) -> anyhow::Result<PredictorSet> {
    match (&config.predictors, disabled) {
        (Some(files), false) => PredictorSet::from_files(files),
        (Some(_), true) => {
            warn!("Predictors configured but disabled with --no-predictors");
            Ok(PredictorSet::None)
        }
        (None, _) => Ok(PredictorSet::None),
    }
}

/// Positional SMILES win; otherwise read the input file, then stdin.
fn collect_smiles(positional: Vec<String>, input: Option<&Path>) -> anyhow::Result<Vec<String>> {
    if !positional.is_empty() {
        return Ok(positional);
    }
    match input {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            read_smiles(io::BufReader::new(file))
        }
        None => read_smiles(io::stdin().lock()),
    }
}

/// One SMILES per line. The first whitespace-separated token is used, so
/// "SMILES name" files work. Blank lines and `#` comments are skipped.
fn read_smiles<R: BufRead>(reader: R) -> anyhow::Result<Vec<String>> {
    let mut smiles = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(token) = line.split_whitespace().next() {
            smiles.push(token.to_string());
        }
    }
    Ok(smiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_smiles_skips_comments_and_names() {
        let text = "# header\nCCO ethanol\n\n  c1ccccc1  \nCC(=O)O\tacetic\n";
        let smiles = read_smiles(text.as_bytes()).unwrap();
        assert_eq!(smiles, ["CCO", "c1ccccc1", "CC(=O)O"]);
    }

    #[test]
    fn test_positional_smiles_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.smi");
        std::fs::write(&path, "CCN\n").unwrap();

        let got = collect_smiles(vec!["CCO".into()], Some(path.as_path())).unwrap();
        assert_eq!(got, ["CCO"]);
        let got = collect_smiles(Vec::new(), Some(path.as_path())).unwrap();
        assert_eq!(got, ["CCN"]);
        let missing = dir.path().join("missing.smi");
        assert!(collect_smiles(Vec::new(), Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["molreward", "--no-alerts", "score", "--rank", "CCO", "CCN"]).unwrap();
        assert!(args.no_alerts);
        match args.command {
            Command::Score { smiles, rank, .. } => {
                assert_eq!(smiles, ["CCO", "CCN"]);
                assert!(rank);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_no_configured_predictors() {
        let config = ScoringConfig::default();
        assert!(!load_predictors(&config, false).unwrap().is_full());
    }
}
