use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::error::TriageError;
use crate::input::samples::ScoredSample;
use crate::model::labels::GroupingRule;
use crate::model::policy::DecisionPolicyConfig;
use crate::pipeline::evaluate::confusion_for;
use crate::pipeline::metrics::{MetricReport, MetricValue, compute};

/// Weight grid for the calibration search. The NORMAL weight stays fixed at
/// 1.0; VIRAL and BACTERIAL are swept independently over `weight_grid` in
/// ascending order.
#[derive(Debug, Clone)]
pub struct CalibrationParams {
    pub weight_grid: Vec<f64>,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            weight_grid: (10..=40).map(|i| f64::from(i) / 10.0).collect(),
        }
    }
}

/// Outcome of a calibration run. Cancellation is not a failure: the
/// previously active config simply stays in force.
#[derive(Debug)]
pub enum CalibrationRun {
    Calibrated(CalibrationResult),
    Cancelled { candidates_tried: usize },
}

#[derive(Debug)]
pub struct CalibrationResult {
    pub config: DecisionPolicyConfig,
    /// Validation report at the winning weights.
    pub report: MetricReport,
    pub candidates_tried: usize,
}

/// Grid-searches class weights until the grouped pneumonia sensitivity on
/// the validation set reaches the config's target.
///
/// Among candidates meeting the target, the one with the highest normal
/// specificity wins (the target bounds misses; specificity bounds false
/// alarms); ties prefer the smaller total weight mass, then grid order.
/// Exhausting the grid without meeting the target is
/// `PolicyCalibrationFailed` — never a silent fallback to an uncalibrated
/// policy.
///
/// The search is a long-running offline job: it polls `cancel` between
/// candidates and stops early with `CalibrationRun::Cancelled`.
pub fn calibrate(
    samples: &[ScoredSample],
    base: &DecisionPolicyConfig,
    params: &CalibrationParams,
    cancel: &AtomicBool,
) -> Result<CalibrationRun, TriageError> {
    base.validate()?;
    if samples.is_empty() {
        return Err(TriageError::InvalidInput(
            "calibration requires a non-empty validation set".to_string(),
        ));
    }
    if params.weight_grid.is_empty() {
        return Err(TriageError::InvalidInput(
            "calibration weight grid is empty".to_string(),
        ));
    }

    let target = base.target_sensitivity;
    let mut tried = 0usize;
    let mut best: Option<Candidate> = None;

    for &viral_w in &params.weight_grid {
        for &bacterial_w in &params.weight_grid {
            if cancel.load(Ordering::Relaxed) {
                info!("calibration cancelled after {} candidates", tried);
                return Ok(CalibrationRun::Cancelled {
                    candidates_tried: tried,
                });
            }
            tried += 1;

            let config = base.clone().with_weights([1.0, viral_w, bacterial_w]);
            let matrix = confusion_for(samples, &config);
            let report = compute(&matrix, Some(GroupingRule::PneumoniaVsNormal));
            let (sensitivity, specificity) = {
                let grouped = report.grouped.as_ref().expect("grouping requested");
                (grouped.sensitivity, grouped.specificity)
            };

            if !sensitivity.meets(target) {
                continue;
            }

            let candidate = Candidate {
                specificity: applicable_or_neg_inf(specificity),
                weight_mass: viral_w + bacterial_w,
                config,
                report,
            };
            if best.as_ref().is_none_or(|b| candidate.beats(b)) {
                best = Some(candidate);
            }
        }
    }

    match best {
        Some(winner) => {
            info!(
                "calibration met target {} with weights {:?} ({} candidates)",
                target, winner.config.class_weight, tried
            );
            Ok(CalibrationRun::Calibrated(CalibrationResult {
                config: winner.config,
                report: winner.report,
                candidates_tried: tried,
            }))
        }
        None => Err(TriageError::PolicyCalibrationFailed(format!(
            "no weight setting reached pneumonia sensitivity {} over {} candidates",
            target, tried
        ))),
    }
}

struct Candidate {
    specificity: f64,
    weight_mass: f64,
    config: DecisionPolicyConfig,
    report: MetricReport,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        if self.specificity != other.specificity {
            return self.specificity > other.specificity;
        }
        // Strict: equal candidates keep the earlier grid position.
        self.weight_mass < other.weight_mass
    }
}

fn applicable_or_neg_inf(value: MetricValue) -> f64 {
    value.value().unwrap_or(f64::NEG_INFINITY)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/calibrate.rs"]
mod tests;
