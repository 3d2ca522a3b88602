//! Decision and evaluation core for chest X-ray pneumonia triage.
//!
//! Given a trained classifier's per-class scores for an image, this crate
//! derives a calibrated, cost-weighted decision rule tuned for high
//! pneumonia sensitivity under class imbalance, and computes the metric
//! suite that proves the rule meets the clinical requirement. Model
//! training and serving, dataset tooling, and the web front-end are
//! external collaborators.

pub mod error;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod service;

pub use error::TriageError;
pub use model::{DecisionPolicyConfig, GroupingRule, Label, ScoreVector};
pub use service::{Decision, InferenceService};
