pub mod labels;
pub mod policy;
pub mod scores;

pub use labels::{ClinicalGroup, GroupingRule, Label, N_CLASSES, label_order, tie_priority};
pub use policy::DecisionPolicyConfig;
pub use scores::{SUM_TOLERANCE, ScoreVector};
