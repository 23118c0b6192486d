//! Prediction history aggregation
//!
//! The predict endpoint answers once per chunk, so one upload produces several
//! records sharing a batch id. History is always kept grouped by batch id and
//! ordered newest first.

use std::collections::HashMap;

use crate::models::PredictionBatch;

/// Merge records that share a batch id.
///
/// Predictions are concatenated in input order and the merged record keeps the
/// latest timestamp. Records without a batch id are standalone and never
/// merged. Output order follows the first occurrence of each group.
pub fn group_by_batch(records: impl IntoIterator<Item = PredictionBatch>) -> Vec<PredictionBatch> {
    let mut grouped: Vec<PredictionBatch> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(batch_id) = record.batch_id.clone() else {
            grouped.push(record);
            continue;
        };

        match index.get(&batch_id) {
            Some(&pos) => {
                let existing = &mut grouped[pos];
                if record.timestamp > existing.timestamp {
                    existing.timestamp = record.timestamp;
                }
                existing.predictions.extend(record.predictions);
            }
            None => {
                index.insert(batch_id, grouped.len());
                grouped.push(record);
            }
        }
    }

    grouped
}

/// Sort by timestamp, newest first. Stable for equal timestamps.
pub fn sort_newest_first(records: &mut [PredictionBatch]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

pub fn is_newest_first(records: &[PredictionBatch]) -> bool {
    records
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp)
}

/// Normalize a history list fetched from the backend.
pub fn normalize(records: Vec<PredictionBatch>) -> Vec<PredictionBatch> {
    let mut grouped = group_by_batch(records);
    sort_newest_first(&mut grouped);
    grouped
}

/// Merge freshly confirmed records into an existing history.
pub fn merge_into(history: &mut Vec<PredictionBatch>, incoming: Vec<PredictionBatch>) {
    let existing = std::mem::take(history);
    *history = normalize(existing.into_iter().chain(incoming).collect());
}
