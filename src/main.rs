use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cxr_triage::error::TriageError;
use cxr_triage::input::load_samples;
use cxr_triage::model::labels::GroupingRule;
use cxr_triage::model::policy::DecisionPolicyConfig;
use cxr_triage::model::scores::ScoreVector;
use cxr_triage::pipeline::calibrate::{CalibrationParams, CalibrationRun, calibrate};
use cxr_triage::pipeline::evaluate::run_evaluation;
use cxr_triage::report::{build_summary, format_metric, write_reports};
use cxr_triage::service::{AuditSink, InferenceService, JsonlAuditSink, NullAuditSink};

#[derive(Parser)]
#[command(
    name = "cxr-triage",
    version,
    about = "Decision and evaluation core for chest X-ray pneumonia triage"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the decision policy over a scored validation set and write the
    /// metric reports.
    Evaluate {
        /// Scored samples TSV (optionally .gz)
        #[arg(long)]
        scores: PathBuf,
        /// Policy JSON; the uncalibrated v1 baseline when omitted
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Output directory for report.txt, report.json, predictions.tsv
        #[arg(long)]
        out: PathBuf,
    },
    /// Grid-search class weights until the pneumonia sensitivity target is
    /// met, then write the winning policy.
    Calibrate {
        /// Scored validation samples TSV (optionally .gz)
        #[arg(long)]
        scores: PathBuf,
        /// Target pneumonia sensitivity; defaults to the v1 baseline's 0.95
        #[arg(long)]
        target: Option<f64>,
        /// Where to write the calibrated policy JSON
        #[arg(long)]
        out: PathBuf,
    },
    /// Classify a single score vector through the inference service.
    Classify {
        /// Policy JSON
        #[arg(long)]
        policy: PathBuf,
        #[arg(long, default_value = "adhoc")]
        id: String,
        #[arg(long)]
        normal: f64,
        #[arg(long)]
        viral: f64,
        #[arg(long)]
        bacterial: f64,
        /// Append-only audit trail (JSON lines); disabled when omitted
        #[arg(long)]
        audit_log: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), TriageError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate {
            scores,
            policy,
            out,
        } => run_evaluate(&scores, policy.as_deref(), &out),
        Command::Calibrate {
            scores,
            target,
            out,
        } => run_calibrate(&scores, target, &out),
        Command::Classify {
            policy,
            id,
            normal,
            viral,
            bacterial,
            audit_log,
        } => run_classify(&policy, &id, normal, viral, bacterial, audit_log.as_deref()),
    }
}

fn load_policy_or_default(path: Option<&Path>) -> Result<DecisionPolicyConfig, TriageError> {
    match path {
        Some(p) => DecisionPolicyConfig::load(p),
        None => {
            info!("no policy file given; using uncalibrated v1 baseline");
            Ok(DecisionPolicyConfig::default_v1())
        }
    }
}

fn run_evaluate(scores: &Path, policy: Option<&Path>, out: &Path) -> Result<(), TriageError> {
    let samples = load_samples(scores)?;
    let config = load_policy_or_default(policy)?;
    config.validate()?;

    let output = run_evaluation(&samples, &config, Some(GroupingRule::PneumoniaVsNormal));
    let summary = build_summary(
        output.report,
        config.version(),
        config.target_sensitivity,
        scores.display().to_string(),
        samples.len(),
    );
    write_reports(&summary, &output.predictions, out)?;

    if summary.target_met == Some(false) {
        info!(
            "pneumonia sensitivity below target {}; consider `calibrate`",
            config.target_sensitivity
        );
    }
    Ok(())
}

fn run_calibrate(scores: &Path, target: Option<f64>, out: &Path) -> Result<(), TriageError> {
    let samples = load_samples(scores)?;
    let mut base = DecisionPolicyConfig::default_v1();
    if let Some(t) = target {
        base.target_sensitivity = t;
    }

    let cancel = AtomicBool::new(false);
    match calibrate(&samples, &base, &CalibrationParams::default(), &cancel)? {
        CalibrationRun::Calibrated(result) => {
            result.config.save(out)?;
            let grouped = result
                .report
                .grouped
                .as_ref()
                .expect("calibration evaluates with grouping");
            info!(
                "wrote {} (sensitivity {}, specificity {}, {} candidates)",
                out.display(),
                format_metric(grouped.sensitivity),
                format_metric(grouped.specificity),
                result.candidates_tried
            );
            Ok(())
        }
        CalibrationRun::Cancelled { candidates_tried } => {
            info!(
                "calibration cancelled after {} candidates; no policy written",
                candidates_tried
            );
            Ok(())
        }
    }
}

fn run_classify(
    policy: &Path,
    id: &str,
    normal: f64,
    viral: f64,
    bacterial: f64,
    audit_log: Option<&Path>,
) -> Result<(), TriageError> {
    let config = DecisionPolicyConfig::load(policy)?;
    let audit: Box<dyn AuditSink> = match audit_log {
        Some(path) => Box::new(JsonlAuditSink::open(path)?),
        None => Box::new(NullAuditSink),
    };
    let service = InferenceService::with_policy(config, audit)?;

    let scores = ScoreVector::new(normal, viral, bacterial)?;
    let decision = service.classify(id, scores)?;
    let json = serde_json::to_string_pretty(&decision)
        .map_err(|e| TriageError::InvalidInput(e.to_string()))?;
    println!("{json}");
    Ok(())
}
