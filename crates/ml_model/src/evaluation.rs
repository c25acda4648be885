//! Hold-out evaluation of the classifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Decision threshold used when evaluating a freshly trained model.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Turns a default probability into a binary decision: 1 iff `p >= threshold`.
#[must_use]
pub fn decide(probability: f64, threshold: f64) -> u8 {
    u8::from(probability >= threshold)
}

/// Counts of predicted versus actual labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Tallies predictions against labels.
    #[must_use]
    pub fn from_predictions(labels: &[u8], predictions: &[u8]) -> Self {
        let mut matrix = Self::default();
        for (&actual, &predicted) in labels.iter().zip(predictions) {
            match (actual, predicted) {
                (0, 0) => matrix.true_negative += 1,
                (0, _) => matrix.false_positive += 1,
                (_, 0) => matrix.false_negative += 1,
                _ => matrix.true_positive += 1,
            }
        }
        matrix
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn new(true_hits: usize, predicted: usize, support: usize) -> Self {
        let precision = ratio(true_hits, predicted);
        let recall = ratio(true_hits, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Classification report for the binary default label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub threshold: f64,
    /// Metrics for the non-default class (label 0).
    pub negative: ClassMetrics,
    /// Metrics for the default class (label 1).
    pub positive: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    /// Evaluates probabilities against labels at a decision threshold.
    #[must_use]
    pub fn from_probabilities(labels: &[u8], probabilities: &[f32], threshold: f64) -> Self {
        let predictions: Vec<u8> = probabilities
            .iter()
            .map(|&p| decide(f64::from(p), threshold))
            .collect();
        Self::from_predictions(labels, &predictions, threshold)
    }

    /// Evaluates hard predictions against labels.
    #[must_use]
    pub fn from_predictions(labels: &[u8], predictions: &[u8], threshold: f64) -> Self {
        let confusion = ConfusionMatrix::from_predictions(labels, predictions);
        let c = &confusion;

        let negative = ClassMetrics::new(
            c.true_negative,
            c.true_negative + c.false_negative,
            c.true_negative + c.false_positive,
        );
        let positive = ClassMetrics::new(
            c.true_positive,
            c.true_positive + c.false_positive,
            c.true_positive + c.false_negative,
        );

        let total = c.total();
        let macro_avg = ClassMetrics {
            precision: (negative.precision + positive.precision) / 2.0,
            recall: (negative.recall + positive.recall) / 2.0,
            f1: (negative.f1 + positive.f1) / 2.0,
            support: total,
        };

        let weight = |metric: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                (metric(&negative) * negative.support as f64 + metric(&positive) * positive.support as f64)
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|m| m.precision),
            recall: weight(|m| m.recall),
            f1: weight(|m| m.f1),
            support: total,
        };

        Self {
            threshold,
            negative,
            positive,
            accuracy: ratio(c.true_negative + c.true_positive, total),
            macro_avg,
            weighted_avg,
            confusion,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = |f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{name:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )
        };

        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        row(f, "0", &self.negative)?;
        row(f, "1", &self.positive)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
