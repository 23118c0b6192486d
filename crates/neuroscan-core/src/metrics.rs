//! Model performance figures derived from [`ModelInfo`]

use serde::Serialize;

use crate::models::ModelInfo;

/// Qualitative rating of a model's F1 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl PerformanceStatus {
    pub fn from_f1(f1: f64) -> Self {
        if f1 >= 0.9 {
            Self::Excellent
        } else if f1 >= 0.8 {
            Self::Good
        } else if f1 >= 0.7 {
            Self::Average
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Average => "average",
            Self::NeedsImprovement => "needs improvement",
        }
    }
}

/// Each confusion-matrix cell as a fraction of all evaluated samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfusionShares {
    pub true_positive: f64,
    pub true_negative: f64,
    pub false_positive: f64,
    pub false_negative: f64,
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl ModelInfo {
    /// Number of evaluated samples.
    pub fn total(&self) -> u64 {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    pub fn confusion_shares(&self) -> ConfusionShares {
        let total = self.total();
        ConfusionShares {
            true_positive: ratio(self.true_positives, total),
            true_negative: ratio(self.true_negatives, total),
            false_positive: ratio(self.false_positives, total),
            false_negative: ratio(self.false_negatives, total),
        }
    }

    pub fn correct_rate(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    pub fn incorrect_rate(&self) -> f64 {
        ratio(self.false_positives + self.false_negatives, self.total())
    }

    pub fn status(&self) -> PerformanceStatus {
        PerformanceStatus::from_f1(self.f1)
    }
}

/// `0.912` -> `"91.2%"`
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(tp: u64, tn: u64, fp: u64, fn_: u64, f1: f64) -> ModelInfo {
        ModelInfo {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1,
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
            history: Vec::new(),
        }
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(PerformanceStatus::from_f1(0.95), PerformanceStatus::Excellent);
        assert_eq!(PerformanceStatus::from_f1(0.9), PerformanceStatus::Excellent);
        assert_eq!(PerformanceStatus::from_f1(0.85), PerformanceStatus::Good);
        assert_eq!(PerformanceStatus::from_f1(0.7), PerformanceStatus::Average);
        assert_eq!(
            PerformanceStatus::from_f1(0.69),
            PerformanceStatus::NeedsImprovement
        );
        assert_eq!(PerformanceStatus::NeedsImprovement.label(), "needs improvement");
    }

    #[test]
    fn rates_from_confusion_matrix() {
        let model = info(450, 380, 35, 25, 0.91);
        assert_eq!(model.total(), 890);
        assert!((model.correct_rate() - 830.0 / 890.0).abs() < 1e-12);
        assert!((model.correct_rate() + model.incorrect_rate() - 1.0).abs() < 1e-12);
        assert_eq!(model.status(), PerformanceStatus::Excellent);

        let shares = model.confusion_shares();
        assert!((shares.true_positive - 450.0 / 890.0).abs() < 1e-12);
    }

    #[test]
    fn empty_matrix_yields_zero_rates() {
        let model = info(0, 0, 0, 0, 0.0);
        assert_eq!(model.correct_rate(), 0.0);
        assert_eq!(model.confusion_shares().false_negative, 0.0);
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(0.912), "91.2%");
        assert_eq!(format_percent(1.0), "100.0%");
    }
}
