use std::fmt::Write as _;

use crate::report::{RunSummary, format_metric};

/// Renders the operator-facing evaluation report.
pub fn render_report_text(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("Chest X-ray Triage Evaluation Report\n");
    out.push_str("====================================\n\n");

    out.push_str("1. Run\n");
    let _ = writeln!(out, "Tool: {} {}", summary.tool_name, summary.tool_version);
    let _ = writeln!(out, "Policy: {}", summary.policy_version);
    let _ = writeln!(out, "Dataset: {}", summary.dataset);
    let _ = writeln!(out, "Samples: {}\n", summary.n_samples);

    out.push_str("2. Metrics for each class\n");
    let _ = writeln!(
        out,
        "{:<10} {:>8} {:>10} {:>8} {:>12} {:>8} {:>8}",
        "class", "support", "precision", "recall", "specificity", "f1", "mcc"
    );
    for class in &summary.report.per_class {
        let _ = writeln!(
            out,
            "{:<10} {:>8} {:>10} {:>8} {:>12} {:>8} {:>8}",
            class.label.name(),
            class.support,
            format_metric(class.precision),
            format_metric(class.recall),
            format_metric(class.specificity),
            format_metric(class.f1),
            format_metric(class.mcc)
        );
    }
    if !summary.report.excluded_from_macro.is_empty() {
        let names: Vec<&str> = summary
            .report
            .excluded_from_macro
            .iter()
            .map(|l| l.name())
            .collect();
        let _ = writeln!(
            out,
            "Excluded from macro average (zero support): {}",
            names.join(", ")
        );
    }
    out.push('\n');

    out.push_str("3. Global metrics\n");
    let _ = writeln!(out, "Accuracy: {}", format_metric(summary.report.accuracy));
    let _ = writeln!(out, "Macro F1: {}", format_metric(summary.report.macro_f1));
    let _ = writeln!(
        out,
        "Cohen's kappa: {}",
        format_metric(summary.report.kappa)
    );
    let _ = writeln!(out, "MCC: {}", format_metric(summary.report.mcc));

    if let Some(grouped) = &summary.report.grouped {
        out.push('\n');
        out.push_str("4. Pneumonia vs normal\n");
        let _ = writeln!(out, "Sensitivity: {}", format_metric(grouped.sensitivity));
        let _ = writeln!(out, "Specificity: {}", format_metric(grouped.specificity));
        let _ = writeln!(out, "Precision: {}", format_metric(grouped.precision));
        let _ = writeln!(
            out,
            "Missed pneumonia rate: {}",
            format_metric(grouped.normal_miss_rate)
        );
        if let Some(met) = summary.target_met {
            let _ = writeln!(
                out,
                "Target sensitivity {:.2}: {}",
                summary.target_sensitivity,
                if met { "MET" } else { "NOT MET" }
            );
        }
    }

    out
}
