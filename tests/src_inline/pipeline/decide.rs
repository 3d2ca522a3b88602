use super::*;

use crate::error::TriageError;
use crate::model::labels::label_order;

fn vector(normal: f64, viral: f64, bacterial: f64) -> ScoreVector {
    ScoreVector::new(normal, viral, bacterial).unwrap()
}

fn weighted(weights: [f64; N_CLASSES]) -> DecisionPolicyConfig {
    DecisionPolicyConfig::default_v1().with_weights(weights)
}

#[test]
fn test_argmax_on_uniform_weights() {
    let config = DecisionPolicyConfig::default_v1();
    assert_eq!(decide(&vector(0.7, 0.2, 0.1), &config), Label::Normal);
    assert_eq!(decide(&vector(0.2, 0.5, 0.3), &config), Label::Viral);
    assert_eq!(decide(&vector(0.1, 0.2, 0.7), &config), Label::Bacterial);
}

#[test]
fn test_decide_is_deterministic() {
    let config = weighted([1.0, 1.4, 1.2]);
    let v = vector(0.4, 0.35, 0.25);
    let first = decide(&v, &config);
    for _ in 0..10 {
        assert_eq!(decide(&v, &config), first);
    }
    let adjusted = adjusted_scores(&v, &config);
    let a = decision_confidence(&adjusted, first);
    let b = decision_confidence(&adjusted, first);
    assert_eq!(a.to_bits(), b.to_bits());
}

#[test]
fn test_decide_always_returns_a_defined_label() {
    let config = weighted([1.0, 2.0, 0.5]);
    for v in [
        vector(1.0, 0.0, 0.0),
        vector(0.0, 1.0, 0.0),
        vector(0.0, 0.0, 1.0),
        vector(0.25, 0.25, 0.5),
    ] {
        assert!(label_order().contains(&decide(&v, &config)));
    }
}

#[test]
fn test_three_way_tie_is_bacterial() {
    let config = DecisionPolicyConfig::default_v1();
    let third = 1.0 / 3.0;
    let v = vector(third, third, third);
    assert_eq!(decide(&v, &config), Label::Bacterial);
}

#[test]
fn test_two_way_ties_favor_disease() {
    let config = DecisionPolicyConfig::default_v1();
    assert_eq!(decide(&vector(0.0, 0.5, 0.5), &config), Label::Bacterial);
    assert_eq!(decide(&vector(0.5, 0.5, 0.0), &config), Label::Viral);
    assert_eq!(decide(&vector(0.5, 0.0, 0.5), &config), Label::Bacterial);
}

#[test]
fn test_weighting_flips_a_borderline_normal_call() {
    let v = vector(0.5, 0.1, 0.4);
    assert_eq!(decide(&v, &DecisionPolicyConfig::default_v1()), Label::Normal);
    assert_eq!(decide(&v, &weighted([1.0, 1.0, 1.5])), Label::Bacterial);
}

#[test]
fn test_confidence_reflects_the_weighted_rule() {
    let config = weighted([1.0, 1.0, 1.5]);
    let v = vector(0.5, 0.1, 0.4);
    let winner = decide(&v, &config);
    assert_eq!(winner, Label::Bacterial);
    let adjusted = adjusted_scores(&v, &config);
    // adjusted = [0.5, 0.1, 0.6], renormalized winner share = 0.6 / 1.2
    let confidence = decision_confidence(&adjusted, winner);
    assert!((confidence - 0.5).abs() < 1e-12);
}

#[test]
fn test_confidence_sums_to_one_across_classes() {
    let config = weighted([1.0, 1.3, 1.7]);
    let v = vector(0.3, 0.3, 0.4);
    let adjusted = adjusted_scores(&v, &config);
    let total: f64 = label_order()
        .iter()
        .map(|&l| decision_confidence(&adjusted, l))
        .sum();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn test_malformed_vector_is_rejected_at_the_boundary() {
    // Sums to 0.9; the invariant is enforced where the vector is built, so
    // no decision is ever taken on malformed model output.
    let err = ScoreVector::new(0.5, 0.3, 0.1).unwrap_err();
    assert!(matches!(err, TriageError::InvalidScoreVector(_)));
}
