//! Detection analytics over prediction history

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::PredictionBatch;

/// Tumor rate above which a batch is flagged.
const HIGH_RATE_PERCENT: u32 = 50;

/// Percentage rounded half-up to a whole number; 0 for an empty total.
pub fn rounded_percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * part + total) / (2 * total)) as u32
}

/// Per-batch detection figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub batch_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub tumor_count: usize,
    pub tumor_percentage: u32,
}

impl BatchSummary {
    pub fn from_batch(batch: &PredictionBatch) -> Self {
        let total = batch.len();
        let tumor_count = batch.tumor_count();
        Self {
            batch_id: batch.batch_id.clone(),
            timestamp: batch.timestamp,
            total,
            tumor_count,
            tumor_percentage: rounded_percentage(tumor_count, total),
        }
    }

    pub fn clear_count(&self) -> usize {
        self.total - self.tumor_count
    }

    pub fn is_high_rate(&self) -> bool {
        self.tumor_percentage > HIGH_RATE_PERCENT
    }
}

/// One point of the detection-rate timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub percentage: u32,
    pub batch_id: Option<String>,
}

/// Detection rate per batch, oldest first.
pub fn detection_timeline(history: &[PredictionBatch]) -> Vec<TimelinePoint> {
    let mut ordered: Vec<&PredictionBatch> = history.iter().collect();
    ordered.sort_by_key(|batch| batch.timestamp);
    ordered
        .into_iter()
        .map(|batch| TimelinePoint {
            date: batch.timestamp.date_naive(),
            percentage: rounded_percentage(batch.tumor_count(), batch.len()),
            batch_id: batch.batch_id.clone(),
        })
        .collect()
}

/// Look up a batch by id; `None` selects the most recent one.
pub fn select_batch<'a>(
    history: &'a [PredictionBatch],
    batch_id: Option<&str>,
) -> Option<&'a PredictionBatch> {
    match batch_id {
        Some(id) => history.iter().find(|b| b.batch_id.as_deref() == Some(id)),
        None => history.iter().max_by_key(|b| b.timestamp),
    }
}
