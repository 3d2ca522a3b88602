use crate::model::labels::{Label, N_CLASSES, tie_priority};
use crate::model::policy::DecisionPolicyConfig;
use crate::model::scores::ScoreVector;

/// Cost-weighted scores for one sample, in `label_order()` order.
///
/// Naive argmax under class imbalance under-predicts the minority classes
/// and risks missing pneumonia; weighting the raw scores first lets the
/// calibrated policy trade false alarms for recall.
pub fn adjusted_scores(scores: &ScoreVector, config: &DecisionPolicyConfig) -> [f64; N_CLASSES] {
    let mut adjusted = scores.as_array();
    for (v, w) in adjusted.iter_mut().zip(config.class_weight.iter()) {
        *v *= w;
    }
    adjusted
}

/// Maps a score vector to a final class label: argmax over the adjusted
/// scores, ties broken by the fixed disease-first priority order.
///
/// Pure function of its inputs; the same vector and config always produce
/// the same label.
pub fn decide(scores: &ScoreVector, config: &DecisionPolicyConfig) -> Label {
    let adjusted = adjusted_scores(scores, config);

    let mut best = tie_priority()[0];
    let mut best_value = adjusted[best.index()];
    for &label in &tie_priority()[1..] {
        let v = adjusted[label.index()];
        if v > best_value {
            best = label;
            best_value = v;
        }
    }
    best
}

/// Confidence the service reports for a decision: the winning adjusted
/// score renormalized over all adjusted scores, so the number reflects the
/// decision rule actually applied rather than the raw model probability.
///
/// The denominator is strictly positive: a valid vector sums to 1 and a
/// validated config has only positive weights.
pub fn decision_confidence(adjusted: &[f64; N_CLASSES], winner: Label) -> f64 {
    let sum: f64 = adjusted.iter().sum();
    adjusted[winner.index()] / sum
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/decide.rs"]
mod tests;
