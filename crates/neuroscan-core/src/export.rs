//! CSV export of a prediction batch
//!
//! Format: header `Filename,Result`, one row per prediction with the filename
//! quoted and the verdict bare, rows joined by `\n` with no trailing newline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::PredictionBatch;

const CSV_HEADER: &str = "Filename,Result";

/// Render a batch as CSV text.
pub fn to_csv(batch: &PredictionBatch) -> String {
    let mut lines = Vec::with_capacity(batch.predictions.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for prediction in &batch.predictions {
        lines.push(format!(
            "\"{}\",{}",
            prediction.filename.replace('"', "\"\""),
            prediction.label()
        ));
    }
    lines.join("\n")
}

/// `tumor-analysis-<YYYY-MM-DD>.csv`, dated from the batch timestamp (UTC).
pub fn csv_file_name(batch: &PredictionBatch) -> String {
    format!("tumor-analysis-{}.csv", batch.timestamp.format("%Y-%m-%d"))
}

/// Write a batch into `dir` and return the created path.
///
/// Several batches from the same day share a base name; later ones get a
/// numeric suffix instead of overwriting an existing export.
pub fn write_csv(dir: &Path, batch: &PredictionBatch) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let base = csv_file_name(batch);
    let mut path = dir.join(&base);
    let stem = base.trim_end_matches(".csv");
    let mut n = 2;
    while path.exists() {
        path = dir.join(format!("{}-{}.csv", stem, n));
        n += 1;
    }

    fs::write(&path, to_csv(batch))?;
    Ok(path)
}
