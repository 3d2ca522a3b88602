use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::TriageError;
use crate::pipeline::evaluate::Prediction;
use crate::pipeline::metrics::{MetricReport, MetricValue};
use crate::report::text::render_report_text;

pub mod text;

/// Everything one evaluation run reports: the metric suite plus the
/// provenance needed to reproduce it.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool_name: String,
    pub tool_version: String,
    pub policy_version: String,
    pub target_sensitivity: f64,
    /// Whether grouped pneumonia sensitivity reached the target; absent
    /// when the run was computed without the clinical grouping.
    pub target_met: Option<bool>,
    pub dataset: String,
    pub n_samples: usize,
    pub report: MetricReport,
}

pub fn format_metric(value: MetricValue) -> String {
    match value.value() {
        Some(v) => format!("{:.4}", v),
        None => "n/a".to_string(),
    }
}

pub fn format_prob(v: f64) -> String {
    format!("{:.6}", v)
}

/// Writes `report.txt`, `report.json`, and `predictions.tsv` into the
/// output directory.
pub fn write_reports(
    summary: &RunSummary,
    predictions: &[Prediction],
    out_dir: &Path,
) -> Result<(), TriageError> {
    fs::create_dir_all(out_dir)?;

    let json_path = out_dir.join("report.json");
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| TriageError::InvalidInput(format!("report serialization: {}", e)))?;
    fs::write(&json_path, json + "\n")?;

    let text_path = out_dir.join("report.txt");
    fs::write(&text_path, render_report_text(summary))?;

    let predictions_path = out_dir.join("predictions.tsv");
    write_predictions_tsv(predictions, &predictions_path)?;

    info!(
        "wrote {}, {}, {}",
        json_path.display(),
        text_path.display(),
        predictions_path.display()
    );
    Ok(())
}

fn write_predictions_tsv(predictions: &[Prediction], path: &Path) -> Result<(), TriageError> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(
        w,
        "sample_id\tp_normal\tp_viral\tp_bacterial\tactual\tpredicted\tconfidence"
    )?;
    for p in predictions {
        let [normal, viral, bacterial] = p.scores.as_array();
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            p.id,
            format_prob(normal),
            format_prob(viral),
            format_prob(bacterial),
            p.actual.name(),
            p.predicted.name(),
            format_prob(p.confidence)
        )?;
    }
    w.flush()?;
    Ok(())
}

/// Assembles a summary from an evaluation run.
pub fn build_summary(
    report: MetricReport,
    policy_version: String,
    target_sensitivity: f64,
    dataset: String,
    n_samples: usize,
) -> RunSummary {
    let target_met = report
        .grouped
        .as_ref()
        .map(|g| g.sensitivity.meets(target_sensitivity));
    RunSummary {
        tool_name: env!("CARGO_PKG_NAME").to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        policy_version,
        target_sensitivity,
        target_met,
        dataset,
        n_samples,
        report,
    }
}
