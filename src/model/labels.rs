use serde::{Deserialize, Serialize};

use crate::error::TriageError;

/// Number of diagnostic classes. Fixed; the label set is closed.
pub const N_CLASSES: usize = 3;

/// Diagnostic class, in score-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Viral,
    Bacterial,
}

impl Label {
    pub fn index(self) -> usize {
        match self {
            Label::Normal => 0,
            Label::Viral => 1,
            Label::Bacterial => 2,
        }
    }

    pub fn from_index(idx: usize) -> Result<Self, TriageError> {
        match idx {
            0 => Ok(Label::Normal),
            1 => Ok(Label::Viral),
            2 => Ok(Label::Bacterial),
            other => Err(TriageError::InvalidLabel(format!(
                "class index {} out of range 0..{}",
                other, N_CLASSES
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Label::Normal => "normal",
            Label::Viral => "viral",
            Label::Bacterial => "bacterial",
        }
    }

    /// Parses a label from dataset text. The raw chest X-ray folder names
    /// ("virus", "bacteria") are accepted alongside the canonical names.
    pub fn parse(s: &str) -> Result<Self, TriageError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Label::Normal),
            "viral" | "virus" => Ok(Label::Viral),
            "bacterial" | "bacteria" => Ok(Label::Bacterial),
            other => Err(TriageError::InvalidLabel(format!(
                "unknown label: {:?} (use normal|viral|bacterial)",
                other
            ))),
        }
    }

    pub fn clinical_group(self) -> ClinicalGroup {
        match self {
            Label::Normal => ClinicalGroup::Normal,
            Label::Viral | Label::Bacterial => ClinicalGroup::Pneumonia,
        }
    }
}

/// All labels in score-vector order.
pub fn label_order() -> &'static [Label] {
    &[Label::Normal, Label::Viral, Label::Bacterial]
}

/// Tie-break priority for the decision rule. Ties favor predicting disease
/// over missing it: a false negative pneumonia call is clinically worse
/// than a false positive.
pub fn tie_priority() -> &'static [Label] {
    &[Label::Bacterial, Label::Viral, Label::Normal]
}

/// Coarsened label set for clinical reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalGroup {
    Normal,
    Pneumonia,
}

/// Optional coarsening applied by the metric engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingRule {
    /// VIRAL and BACTERIAL both map to PNEUMONIA.
    PneumoniaVsNormal,
}
