use crate::input::samples::ScoredSample;
use crate::model::labels::{GroupingRule, Label};
use crate::model::policy::DecisionPolicyConfig;
use crate::model::scores::ScoreVector;
use crate::pipeline::accumulate::{ConfusionAccumulator, ConfusionMatrix};
use crate::pipeline::decide::{adjusted_scores, decide, decision_confidence};
use crate::pipeline::metrics::{MetricReport, compute};

/// One decided sample in an evaluation run.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub id: String,
    pub scores: ScoreVector,
    pub actual: Label,
    pub predicted: Label,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct EvaluationOutput {
    pub matrix: ConfusionMatrix,
    pub report: MetricReport,
    pub predictions: Vec<Prediction>,
}

/// Runs the decision policy over a labeled validation set and derives the
/// metric suite from the resulting confusion matrix.
pub fn run_evaluation(
    samples: &[ScoredSample],
    config: &DecisionPolicyConfig,
    grouping: Option<GroupingRule>,
) -> EvaluationOutput {
    let mut accumulator = ConfusionAccumulator::new();
    let mut predictions = Vec::with_capacity(samples.len());

    for sample in samples {
        let predicted = decide(&sample.scores, config);
        let adjusted = adjusted_scores(&sample.scores, config);
        accumulator.record(sample.actual, predicted);
        predictions.push(Prediction {
            id: sample.id.clone(),
            scores: sample.scores,
            actual: sample.actual,
            predicted,
            confidence: decision_confidence(&adjusted, predicted),
        });
    }

    let matrix = accumulator.finalize();
    let report = compute(&matrix, grouping);
    EvaluationOutput {
        matrix,
        report,
        predictions,
    }
}

/// Confusion matrix only, for the calibration inner loop where prediction
/// rows are not needed.
pub fn confusion_for(samples: &[ScoredSample], config: &DecisionPolicyConfig) -> ConfusionMatrix {
    let mut accumulator = ConfusionAccumulator::new();
    for sample in samples {
        accumulator.record(sample.actual, decide(&sample.scores, config));
    }
    accumulator.finalize()
}
