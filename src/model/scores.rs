use serde::{Deserialize, Serialize};

use crate::error::TriageError;
use crate::model::labels::{Label, N_CLASSES, label_order};

/// Tolerance for the sum-to-one invariant of a score vector.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Per-class probabilities produced by the upstream classifier for one
/// image, in `label_order()` order. Validated on construction and immutable
/// afterwards; an invalid vector cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; N_CLASSES]", into = "[f64; N_CLASSES]")]
pub struct ScoreVector([f64; N_CLASSES]);

impl ScoreVector {
    pub fn new(normal: f64, viral: f64, bacterial: f64) -> Result<Self, TriageError> {
        let values = [normal, viral, bacterial];
        for (&label, &v) in label_order().iter().zip(values.iter()) {
            if !v.is_finite() || v < 0.0 {
                return Err(TriageError::InvalidScoreVector(format!(
                    "{} score {} is not a finite non-negative number",
                    label.name(),
                    v
                )));
            }
        }
        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(TriageError::InvalidScoreVector(format!(
                "scores sum to {} (expected 1.0 within {:e})",
                sum, SUM_TOLERANCE
            )));
        }
        Ok(Self(values))
    }

    pub fn get(&self, label: Label) -> f64 {
        self.0[label.index()]
    }

    pub fn as_array(&self) -> [f64; N_CLASSES] {
        self.0
    }
}

impl TryFrom<[f64; N_CLASSES]> for ScoreVector {
    type Error = TriageError;

    fn try_from(values: [f64; N_CLASSES]) -> Result<Self, Self::Error> {
        Self::new(values[0], values[1], values[2])
    }
}

impl From<ScoreVector> for [f64; N_CLASSES] {
    fn from(v: ScoreVector) -> Self {
        v.0
    }
}
