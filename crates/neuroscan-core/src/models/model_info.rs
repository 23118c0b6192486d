use serde::{Deserialize, Serialize};

/// One training epoch as reported by the model-info endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingEpoch {
    pub epoch: u32,
    pub accuracy: f64,
    pub loss: f64,
}

/// Published evaluation of the deployed model. Matches GET /model-info/{uid}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    #[serde(rename = "tp")]
    pub true_positives: u64,
    #[serde(rename = "tn")]
    pub true_negatives: u64,
    #[serde(rename = "fp")]
    pub false_positives: u64,
    #[serde(rename = "fn")]
    pub false_negatives: u64,
    #[serde(default)]
    pub history: Vec<TrainingEpoch>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_shape() {
        let json = r#"{
            "accuracy": 0.91, "precision": 0.89, "recall": 0.94, "f1": 0.91,
            "tp": 450, "tn": 380, "fp": 35, "fn": 25,
            "history": [{"epoch": 1, "accuracy": 0.7999, "loss": 0.4541}]
        }"#;
        let info: ModelInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.true_positives, 450);
        assert_eq!(info.false_negatives, 25);
        assert_eq!(info.history.len(), 1);
        assert_eq!(info.history[0].epoch, 1);
    }

    #[test]
    fn history_is_optional() {
        let json = r#"{"accuracy":1.0,"precision":1.0,"recall":1.0,"f1":1.0,"tp":1,"tn":1,"fp":0,"fn":0}"#;
        let info: ModelInfo = serde_json::from_str(json).unwrap();
        assert!(info.history.is_empty());
    }
}
