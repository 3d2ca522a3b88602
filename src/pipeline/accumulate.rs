use serde::Serialize;

use crate::model::labels::{Label, N_CLASSES, label_order};

/// Immutable 3x3 tabulation of (actual, predicted) counts for one
/// evaluation run. Snapshots never change after `finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: [[u64; N_CLASSES]; N_CLASSES],
}

impl ConfusionMatrix {
    pub fn count(&self, actual: Label, predicted: Label) -> u64 {
        self.counts[actual.index()][predicted.index()]
    }

    /// Total number of evaluated samples.
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Number of actual occurrences of a class (row sum); the class support.
    pub fn actual_total(&self, label: Label) -> u64 {
        self.counts[label.index()].iter().sum()
    }

    /// Number of predictions of a class (column sum).
    pub fn predicted_total(&self, label: Label) -> u64 {
        self.counts.iter().map(|row| row[label.index()]).sum()
    }

    /// Diagonal sum: samples whose predicted label matches the actual one.
    pub fn correct(&self) -> u64 {
        label_order().iter().map(|&l| self.count(l, l)).sum()
    }

    /// Element-wise sum. Merging is commutative and associative, so
    /// per-worker matrices from a parallel batch evaluation can be combined
    /// in any order.
    pub fn merge(&self, other: &ConfusionMatrix) -> ConfusionMatrix {
        let mut counts = self.counts;
        for (row, other_row) in counts.iter_mut().zip(other.counts.iter()) {
            for (v, o) in row.iter_mut().zip(other_row.iter()) {
                *v += o;
            }
        }
        ConfusionMatrix { counts }
    }
}

/// Collects predicted-vs-actual pairs across streamed batches. One
/// accumulator per worker; records may arrive in any order.
#[derive(Debug, Clone, Default)]
pub struct ConfusionAccumulator {
    counts: [[u64; N_CLASSES]; N_CLASSES],
}

impl ConfusionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, actual: Label, predicted: Label) {
        self.counts[actual.index()][predicted.index()] += 1;
    }

    /// Produces an immutable snapshot. Idempotent: re-invocation without
    /// further `record` calls returns a structurally equal matrix.
    pub fn finalize(&self) -> ConfusionMatrix {
        ConfusionMatrix {
            counts: self.counts,
        }
    }

    /// Clears the accumulator for a new matrix. Previously finalized
    /// snapshots are unaffected.
    pub fn reset(&mut self) {
        self.counts = [[0; N_CLASSES]; N_CLASSES];
    }
}

/// Builds a matrix directly from per-cell counts, rows in actual-label
/// order, columns in predicted-label order.
pub fn matrix_from_counts(counts: [[u64; N_CLASSES]; N_CLASSES]) -> ConfusionMatrix {
    ConfusionMatrix { counts }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/accumulate.rs"]
mod tests;
