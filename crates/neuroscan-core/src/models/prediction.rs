use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One file's inference outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub filename: String,
    pub has_tumor: bool,
}

impl PredictionResult {
    /// Human-readable verdict, as shown in history tables and CSV exports.
    pub fn label(&self) -> &'static str {
        if self.has_tumor {
            "Tumor Detected"
        } else {
            "No Tumor Detected"
        }
    }
}

/// Backend-confirmed record of one upload batch.
///
/// The predict endpoint returns one of these per request; the history endpoint
/// returns them already grouped by batch id. Records written before batch ids
/// existed carry `batch_id: None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionBatch {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub predictions: Vec<PredictionResult>,
}

impl PredictionBatch {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn tumor_count(&self) -> usize {
        self.predictions.iter().filter(|p| p.has_tumor).count()
    }
}

/// Parse a backend timestamp.
///
/// The backend writes naive ISO-8601 local times (`2024-05-01T10:00:00.123456`);
/// those are read as UTC. RFC 3339 timestamps with an offset are accepted too.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

mod timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
