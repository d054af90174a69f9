//! Validation of rule labels against human review.
//!
//! Only records carrying both `label` (the prediction) and `reviewed_label`
//! (ground truth) are evaluated; the rest are skipped without complaint.
//! Metrics always cover both classes, `0` then `1`, and a class with no
//! predictions or no support scores 0 instead of dividing by zero.

use crate::models::{Dataset, Label};
use serde::Serialize;
use tracing::{debug, info};

/// Per-class precision, recall, F1 and support.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// Correct predictions of the class over all predictions of it.
    pub precision: f64,
    /// Correct predictions of the class over its true occurrences.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// True occurrences of the class (for averages: all evaluated records).
    pub support: usize,
}

/// 2×2 confusion matrix; `counts[actual][predicted]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    /// Count (actual, predicted) pairs.
    ///
    /// # Arguments
    ///
    /// * `y_true` - Reviewed labels
    /// * `y_pred` - Rule labels, aligned with `y_true`
    ///
    /// # Returns
    ///
    /// The matrix over the zipped pairs; extra items in the longer slice are
    /// ignored.
    pub fn from_pairs(y_true: &[Label], y_pred: &[Label]) -> Self {
        let mut m = Self::default();
        for (t, p) in y_true.iter().zip(y_pred) {
            m.counts[t.as_u8() as usize][p.as_u8() as usize] += 1;
        }
        m
    }

    /// Number of evaluated pairs.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// What a classification report holds for binary labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn harmonic(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    /// Derive per-class, macro and support-weighted metrics from a matrix.
    ///
    /// An empty matrix gives all-zero metrics.
    pub fn from_confusion(m: &ConfusionMatrix) -> Self {
        let total = m.total();
        let classes = [0usize, 1].map(|c| {
            let tp = m.counts[c][c];
            let predicted = m.counts[0][c] + m.counts[1][c];
            let support = m.counts[c][0] + m.counts[c][1];
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            ClassMetrics {
                precision,
                recall,
                f1: harmonic(precision, recall),
                support,
            }
        });

        let mean = |f: fn(&ClassMetrics) -> f64| classes.iter().map(f).sum::<f64>() / 2.0;
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
            }
        };

        Self {
            classes,
            accuracy: ratio(m.counts[0][0] + m.counts[1][1], total),
            macro_avg: ClassMetrics {
                precision: mean(|c| c.precision),
                recall: mean(|c| c.recall),
                f1: mean(|c| c.f1),
                support: total,
            },
            weighted_avg: ClassMetrics {
                precision: weighted(|c| c.precision),
                recall: weighted(|c| c.recall),
                f1: weighted(|c| c.f1),
                support: total,
            },
        }
    }

    /// Metrics of one class.
    pub fn class(&self, label: Label) -> &ClassMetrics {
        &self.classes[label.as_u8() as usize]
    }

    /// Scalar metrics as logged to the tracking run.
    pub fn scalars(&self) -> Vec<(&'static str, f64)> {
        let c0 = self.class(Label::Outdated);
        let c1 = self.class(Label::Current);
        vec![
            ("precision_0", c0.precision),
            ("recall_0", c0.recall),
            ("f1_0", c0.f1),
            ("support_0", c0.support as f64),
            ("precision_1", c1.precision),
            ("recall_1", c1.recall),
            ("f1_1", c1.f1),
            ("support_1", c1.support as f64),
            ("macro_avg_f1", self.macro_avg.f1),
            ("accuracy", self.accuracy),
        ]
    }
}

/// Ground truth and predictions of the records that have both.
pub fn evaluation_pairs(dataset: &Dataset) -> (Vec<Label>, Vec<Label>) {
    let (y_true, y_pred): (Vec<Label>, Vec<Label>) = dataset
        .values()
        .filter_map(|r| Some((r.reviewed_label()?, r.label()?)))
        .unzip();
    debug!(
        evaluated = y_true.len(),
        skipped = dataset.len() - y_true.len(),
        "Selected reviewed records"
    );
    (y_true, y_pred)
}

/// Everything the validator produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
}

/// Score the rule labels of a reviewed sample.
///
/// # Arguments
///
/// * `dataset` - Records carrying `label` and, where reviewed,
///   `reviewed_label`
///
/// # Returns
///
/// The classification report and confusion matrix over the records that
/// have both labels. Nothing here fails: no evaluable records gives an
/// all-zero report.
pub fn validate(dataset: &Dataset) -> Validation {
    let (y_true, y_pred) = evaluation_pairs(dataset);
    let confusion = ConfusionMatrix::from_pairs(&y_true, &y_pred);
    let report = ClassificationReport::from_confusion(&confusion);
    info!(
        evaluated = confusion.total(),
        accuracy = report.accuracy,
        macro_f1 = report.macro_avg.f1,
        "Computed validation metrics"
    );
    Validation { report, confusion }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use serde_json::json;

    fn labels(v: &[u8]) -> Vec<Label> {
        v.iter().map(|&x| Label::from_u8(x).unwrap()).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_confusion_matrix_and_accuracy() {
        let y_true = labels(&[0, 1, 1, 0]);
        let y_pred = labels(&[0, 1, 0, 0]);
        let m = ConfusionMatrix::from_pairs(&y_true, &y_pred);
        assert_eq!(m.counts, [[2, 0], [1, 1]]);

        let report = ClassificationReport::from_confusion(&m);
        assert!(close(report.accuracy, 0.75));
    }

    #[test]
    fn test_per_class_metrics() {
        let m = ConfusionMatrix::from_pairs(&labels(&[0, 1, 1, 0]), &labels(&[0, 1, 0, 0]));
        let report = ClassificationReport::from_confusion(&m);

        let c0 = report.class(Label::Outdated);
        assert!(close(c0.precision, 2.0 / 3.0));
        assert!(close(c0.recall, 1.0));
        assert!(close(c0.f1, 0.8));
        assert_eq!(c0.support, 2);

        let c1 = report.class(Label::Current);
        assert!(close(c1.precision, 1.0));
        assert!(close(c1.recall, 0.5));
        assert!(close(c1.f1, 2.0 / 3.0));

        assert!(close(report.macro_avg.f1, (0.8 + 2.0 / 3.0) / 2.0));
        assert!(close(report.weighted_avg.recall, 0.75));
        assert_eq!(report.macro_avg.support, 4);
    }

    #[test]
    fn test_zero_division_scores_zero() {
        let m = ConfusionMatrix::from_pairs(&labels(&[0, 0]), &labels(&[0, 0]));
        let report = ClassificationReport::from_confusion(&m);
        let c1 = report.class(Label::Current);
        assert_eq!((c1.precision, c1.recall, c1.f1, c1.support), (0.0, 0.0, 0.0, 0));
        assert!(close(report.accuracy, 1.0));

        let empty = ClassificationReport::from_confusion(&ConfusionMatrix::default());
        assert_eq!(empty.accuracy, 0.0);
        assert_eq!(empty.weighted_avg.f1, 0.0);
    }

    #[test]
    fn test_unreviewed_records_are_skipped() {
        let mut ds = Dataset::new();
        for (id, value) in [
            ("a", json!({"label": 1, "reviewed_label": 1})),
            ("b", json!({"label": 0, "reviewed_label": null})),
            ("c", json!({"label": null, "reviewed_label": 0})),
            ("d", json!({"label": 0, "reviewed_label": 1.0})),
            ("e", json!({"title": "no labels"})),
        ] {
            let record: Record = serde_json::from_value(value).unwrap();
            ds.insert(id.to_string(), record);
        }

        let (y_true, y_pred) = evaluation_pairs(&ds);
        assert_eq!(y_true, labels(&[1, 1]));
        assert_eq!(y_pred, labels(&[1, 0]));

        let v = validate(&ds);
        assert_eq!(v.confusion.counts, [[0, 0], [1, 1]]);
        assert!(close(v.report.accuracy, 0.5));
    }

    #[test]
    fn test_scalar_names() {
        let report = ClassificationReport::from_confusion(&ConfusionMatrix::default());
        let names: Vec<&str> = report.scalars().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "precision_0",
                "recall_0",
                "f1_0",
                "support_0",
                "precision_1",
                "recall_1",
                "f1_1",
                "support_1",
                "macro_avg_f1",
                "accuracy"
            ]
        );
    }
}
