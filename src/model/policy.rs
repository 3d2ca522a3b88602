use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TriageError;
use crate::model::labels::{Label, N_CLASSES, label_order};

/// Per-class decision weights plus the calibration target. Process-wide and
/// read-only during inference; a new config takes effect only through an
/// atomic swap after re-validation on a held-out set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicyConfig {
    /// Multiplier applied to each class score before the argmax, in
    /// `label_order()` order.
    pub class_weight: [f64; N_CLASSES],
    /// Required recall for the aggregated PNEUMONIA group on the
    /// validation matrix.
    pub target_sensitivity: f64,
}

impl DecisionPolicyConfig {
    /// Uncalibrated baseline: plain argmax, conservative 0.95 target
    /// pending clinical sign-off.
    pub fn default_v1() -> Self {
        Self {
            class_weight: [1.0; N_CLASSES],
            target_sensitivity: 0.95,
        }
    }

    pub fn with_weights(mut self, weights: [f64; N_CLASSES]) -> Self {
        self.class_weight = weights;
        self
    }

    pub fn weight(&self, label: Label) -> f64 {
        self.class_weight[label.index()]
    }

    pub fn validate(&self) -> Result<(), TriageError> {
        for (&label, &w) in label_order().iter().zip(self.class_weight.iter()) {
            if !w.is_finite() || w <= 0.0 {
                return Err(TriageError::InvalidPolicyConfig(format!(
                    "class weight for {} must be a finite positive number, got {}",
                    label.name(),
                    w
                )));
            }
        }
        if !self.target_sensitivity.is_finite()
            || self.target_sensitivity <= 0.0
            || self.target_sensitivity > 1.0
        {
            return Err(TriageError::InvalidPolicyConfig(format!(
                "target sensitivity must be in (0, 1], got {}",
                self.target_sensitivity
            )));
        }
        Ok(())
    }

    /// Version identifier derived from the weight values, so two
    /// structurally equal configs always share an identifier.
    pub fn version(&self) -> String {
        let mut out = String::from("cw");
        for (i, w) in self.class_weight.iter().enumerate() {
            if i > 0 {
                out.push(':');
            }
            let _ = write!(out, "{:.3}", w);
        }
        let _ = write!(out, "/s{:.2}", self.target_sensitivity);
        out
    }

    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TriageError::MissingInput(format!("policy file {}", path.display()))
            } else {
                TriageError::Io(e)
            }
        })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| TriageError::Parse(format!("policy file {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), TriageError> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TriageError::InvalidPolicyConfig(e.to_string()))?;
        std::fs::write(path, json + "\n")?;
        Ok(())
    }
}
