use serde::{Serialize, Serializer};

use crate::model::labels::{ClinicalGroup, GroupingRule, Label, label_order};
use crate::pipeline::accumulate::ConfusionMatrix;

/// Metric value, or an explicit sentinel when the figure is undefined for
/// this matrix (e.g. recall of a class with zero actual occurrences).
/// Undefined figures are never reported as 0 and never enter averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    NotApplicable,
}

impl MetricValue {
    fn ratio(numer: f64, denom: f64) -> MetricValue {
        if denom == 0.0 {
            MetricValue::NotApplicable
        } else {
            MetricValue::Value(numer / denom)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(v),
            MetricValue::NotApplicable => None,
        }
    }

    pub fn is_applicable(self) -> bool {
        matches!(self, MetricValue::Value(_))
    }

    /// True when the value is defined and at least `threshold`.
    pub fn meets(self, threshold: f64) -> bool {
        self.value().is_some_and(|v| v >= threshold)
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(v) => serializer.serialize_f64(*v),
            MetricValue::NotApplicable => serializer.serialize_none(),
        }
    }
}

/// One-vs-rest figures for a single class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: Label,
    /// Actual occurrences of the class in the matrix.
    pub support: u64,
    pub precision: MetricValue,
    pub recall: MetricValue,
    pub specificity: MetricValue,
    pub f1: MetricValue,
    pub mcc: MetricValue,
}

/// Pneumonia-vs-normal figures under the clinical grouping rule.
///
/// `sensitivity` counts a pneumonia case as caught only when its subtype is
/// also right: a bacterial infection read as viral still routes to the
/// wrong treatment. `normal_miss_rate` separately tracks the worst outcome,
/// pneumonia cases sent home as normal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedMetrics {
    pub sensitivity: MetricValue,
    pub specificity: MetricValue,
    pub precision: MetricValue,
    pub normal_miss_rate: MetricValue,
}

/// Full metric suite for one evaluation run. Derived deterministically from
/// the matrix; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    pub matrix: ConfusionMatrix,
    pub total: u64,
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: MetricValue,
    /// Unweighted mean F1 over classes with non-zero support. Macro over
    /// micro so the majority class cannot mask poor minority-class
    /// performance.
    pub macro_f1: MetricValue,
    /// Cohen's kappa: accuracy corrected for the imbalance-driven chance
    /// agreement.
    pub kappa: MetricValue,
    /// Multiclass Matthews correlation coefficient.
    pub mcc: MetricValue,
    /// Classes with zero actual support, excluded from the macro average.
    pub excluded_from_macro: Vec<Label>,
    pub grouped: Option<GroupedMetrics>,
}

/// Computes the full metric suite from a finalized matrix. Pure and
/// deterministic: the same matrix always yields a bit-identical report.
pub fn compute(matrix: &ConfusionMatrix, grouping: Option<GroupingRule>) -> MetricReport {
    let total = matrix.total();
    let mut per_class = Vec::with_capacity(label_order().len());
    let mut excluded = Vec::new();
    let mut f1_sum = 0.0;
    let mut f1_classes = 0usize;

    for &label in label_order() {
        let class = class_metrics(matrix, label, total);
        if class.support == 0 {
            excluded.push(label);
        } else if let Some(f1) = class.f1.value() {
            f1_sum += f1;
            f1_classes += 1;
        }
        per_class.push(class);
    }

    let macro_f1 = if f1_classes == 0 {
        MetricValue::NotApplicable
    } else {
        MetricValue::Value(f1_sum / f1_classes as f64)
    };

    let accuracy = MetricValue::ratio(matrix.correct() as f64, total as f64);

    MetricReport {
        matrix: *matrix,
        total,
        per_class,
        accuracy,
        macro_f1,
        kappa: cohen_kappa(matrix, total),
        mcc: multiclass_mcc(matrix, total),
        excluded_from_macro: excluded,
        grouped: grouping.map(|rule| match rule {
            GroupingRule::PneumoniaVsNormal => grouped_metrics(matrix),
        }),
    }
}

fn class_metrics(matrix: &ConfusionMatrix, label: Label, total: u64) -> ClassMetrics {
    let tp = matrix.count(label, label) as f64;
    let support = matrix.actual_total(label);
    let fn_ = support as f64 - tp;
    let fp = matrix.predicted_total(label) as f64 - tp;
    let tn = total as f64 - tp - fn_ - fp;

    ClassMetrics {
        label,
        support,
        precision: MetricValue::ratio(tp, tp + fp),
        recall: MetricValue::ratio(tp, tp + fn_),
        specificity: MetricValue::ratio(tn, tn + fp),
        f1: MetricValue::ratio(2.0 * tp, 2.0 * tp + fp + fn_),
        mcc: binary_mcc(tp, fp, fn_, tn),
    }
}

fn binary_mcc(tp: f64, fp: f64, fn_: f64, tn: f64) -> MetricValue {
    let denom = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
    if denom == 0.0 {
        MetricValue::NotApplicable
    } else {
        MetricValue::Value((tp * tn - fp * fn_) / denom)
    }
}

fn cohen_kappa(matrix: &ConfusionMatrix, total: u64) -> MetricValue {
    if total == 0 {
        return MetricValue::NotApplicable;
    }
    let n = total as f64;
    let observed = matrix.correct() as f64 / n;
    let mut expected = 0.0;
    for &label in label_order() {
        expected += matrix.actual_total(label) as f64 * matrix.predicted_total(label) as f64;
    }
    expected /= n * n;
    MetricValue::ratio(observed - expected, 1.0 - expected)
}

fn multiclass_mcc(matrix: &ConfusionMatrix, total: u64) -> MetricValue {
    if total == 0 {
        return MetricValue::NotApplicable;
    }
    let n = total as f64;
    let c = matrix.correct() as f64;
    let mut cross = 0.0;
    let mut pred_sq = 0.0;
    let mut actual_sq = 0.0;
    for &label in label_order() {
        let p = matrix.predicted_total(label) as f64;
        let t = matrix.actual_total(label) as f64;
        cross += p * t;
        pred_sq += p * p;
        actual_sq += t * t;
    }
    let denom = ((n * n - pred_sq) * (n * n - actual_sq)).sqrt();
    if denom == 0.0 {
        MetricValue::NotApplicable
    } else {
        MetricValue::Value((c * n - cross) / denom)
    }
}

fn grouped_metrics(matrix: &ConfusionMatrix) -> GroupedMetrics {
    let mut actual_pneumonia = 0.0;
    let mut caught = 0.0;
    let mut sent_home = 0.0;
    let mut predicted_pneumonia = 0.0;

    for &label in label_order() {
        if label.clinical_group() != ClinicalGroup::Pneumonia {
            continue;
        }
        actual_pneumonia += matrix.actual_total(label) as f64;
        // A pneumonia case counts as caught only with the right subtype.
        caught += matrix.count(label, label) as f64;
        // Called normal: the clinically worst miss.
        sent_home += matrix.count(label, Label::Normal) as f64;
        predicted_pneumonia += matrix.predicted_total(label) as f64;
    }

    let actual_normal = matrix.actual_total(Label::Normal) as f64;
    let tn = matrix.count(Label::Normal, Label::Normal) as f64;

    GroupedMetrics {
        sensitivity: MetricValue::ratio(caught, actual_pneumonia),
        specificity: MetricValue::ratio(tn, actual_normal),
        precision: MetricValue::ratio(caught, predicted_pneumonia),
        normal_miss_rate: MetricValue::ratio(sent_home, actual_pneumonia),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/metrics.rs"]
mod tests;
