use super::*;

use crate::pipeline::accumulate::matrix_from_counts;

fn close(value: MetricValue, expected: f64) -> bool {
    value.value().is_some_and(|v| (v - expected).abs() < 1e-12)
}

/// Validation matrix from the clinical worked example: rows are actual
/// (normal, viral, bacterial), columns predicted.
fn scenario_matrix() -> ConfusionMatrix {
    matrix_from_counts([[9, 0, 1], [2, 3, 0], [0, 1, 19]])
}

#[test]
fn test_per_class_recall_on_scenario() {
    let report = compute(&scenario_matrix(), None);
    let normal = &report.per_class[Label::Normal.index()];
    let viral = &report.per_class[Label::Viral.index()];
    let bacterial = &report.per_class[Label::Bacterial.index()];

    assert!(close(normal.recall, 0.9));
    assert!(close(viral.recall, 0.6));
    assert!(close(bacterial.recall, 0.95));
    assert_eq!(normal.support, 10);
    assert_eq!(viral.support, 5);
    assert_eq!(bacterial.support, 20);
}

#[test]
fn test_per_class_precision_and_specificity_on_scenario() {
    let report = compute(&scenario_matrix(), None);
    let normal = &report.per_class[Label::Normal.index()];
    // 11 normal predictions, 9 correct.
    assert!(close(normal.precision, 9.0 / 11.0));
    // 25 actual non-normal, 2 predicted normal.
    assert!(close(normal.specificity, 23.0 / 25.0));

    let bacterial = &report.per_class[Label::Bacterial.index()];
    assert!(close(bacterial.precision, 19.0 / 20.0));
    assert!(close(bacterial.specificity, 14.0 / 15.0));
}

#[test]
fn test_aggregates_on_scenario() {
    let report = compute(&scenario_matrix(), None);
    assert_eq!(report.total, 35);
    assert!(close(report.accuracy, 31.0 / 35.0));

    // Chance agreement: (10*11 + 5*4 + 20*20) / 35^2.
    let expected = 530.0 / 1225.0;
    let kappa = (31.0 / 35.0 - expected) / (1.0 - expected);
    assert!(close(report.kappa, kappa));

    assert!(report.excluded_from_macro.is_empty());
    assert!(report.macro_f1.is_applicable());
}

#[test]
fn test_grouped_metrics_on_scenario() {
    let report = compute(&scenario_matrix(), Some(GroupingRule::PneumoniaVsNormal));
    let grouped = report.grouped.expect("grouping requested");

    assert!(close(grouped.sensitivity, 0.88));
    assert!(close(grouped.specificity, 0.9));
    assert!(close(grouped.precision, 22.0 / 24.0));
    assert!(close(grouped.normal_miss_rate, 2.0 / 25.0));
}

#[test]
fn test_grouping_off_leaves_grouped_absent() {
    let report = compute(&scenario_matrix(), None);
    assert!(report.grouped.is_none());
}

#[test]
fn test_compute_is_pure() {
    let matrix = scenario_matrix();
    let a = compute(&matrix, Some(GroupingRule::PneumoniaVsNormal));
    let b = compute(&matrix, Some(GroupingRule::PneumoniaVsNormal));
    assert_eq!(a, b);
}

#[test]
fn test_zero_support_class_is_sentinel_not_zero() {
    let matrix = matrix_from_counts([[10, 0, 0], [0, 0, 0], [0, 0, 20]]);
    let report = compute(&matrix, None);

    let viral = &report.per_class[Label::Viral.index()];
    assert_eq!(viral.support, 0);
    assert_eq!(viral.recall, MetricValue::NotApplicable);
    assert_eq!(viral.precision, MetricValue::NotApplicable);
    assert_eq!(viral.f1, MetricValue::NotApplicable);

    assert_eq!(report.excluded_from_macro, vec![Label::Viral]);
    // Macro average over the two supported classes, both perfect here.
    assert!(close(report.macro_f1, 1.0));
}

#[test]
fn test_perfect_matrix_aggregates() {
    let matrix = matrix_from_counts([[10, 0, 0], [0, 5, 0], [0, 0, 20]]);
    let report = compute(&matrix, Some(GroupingRule::PneumoniaVsNormal));

    assert!(close(report.accuracy, 1.0));
    assert!(close(report.macro_f1, 1.0));
    assert!(close(report.kappa, 1.0));
    assert!(close(report.mcc, 1.0));
    let grouped = report.grouped.unwrap();
    assert!(close(grouped.sensitivity, 1.0));
    assert!(close(grouped.normal_miss_rate, 0.0));
}

#[test]
fn test_empty_matrix_is_all_sentinels() {
    let matrix = matrix_from_counts([[0; 3]; 3]);
    let report = compute(&matrix, Some(GroupingRule::PneumoniaVsNormal));

    assert_eq!(report.total, 0);
    assert_eq!(report.accuracy, MetricValue::NotApplicable);
    assert_eq!(report.macro_f1, MetricValue::NotApplicable);
    assert_eq!(report.kappa, MetricValue::NotApplicable);
    assert_eq!(report.mcc, MetricValue::NotApplicable);
    assert_eq!(report.excluded_from_macro.len(), 3);
}

#[test]
fn test_grouped_without_pneumonia_support() {
    let matrix = matrix_from_counts([[10, 0, 0], [0, 0, 0], [0, 0, 0]]);
    let report = compute(&matrix, Some(GroupingRule::PneumoniaVsNormal));
    let grouped = report.grouped.unwrap();

    assert_eq!(grouped.sensitivity, MetricValue::NotApplicable);
    assert_eq!(grouped.normal_miss_rate, MetricValue::NotApplicable);
    assert!(close(grouped.specificity, 1.0));
}

#[test]
fn test_binary_mcc_one_vs_rest() {
    // Bacterial one-vs-rest on the scenario: tp=19, fp=1, fn=1, tn=14.
    let report = compute(&scenario_matrix(), None);
    let bacterial = &report.per_class[Label::Bacterial.index()];
    let expected = (19.0 * 14.0 - 1.0 * 1.0) / (20.0_f64 * 20.0 * 15.0 * 15.0).sqrt();
    assert!(close(bacterial.mcc, expected));
}

#[test]
fn test_metric_value_meets() {
    assert!(MetricValue::Value(0.95).meets(0.95));
    assert!(!MetricValue::Value(0.9499).meets(0.95));
    assert!(!MetricValue::NotApplicable.meets(0.0));
}
