use std::path::PathBuf;

use anyhow::Context;
use neuroscan_core::ErrorMetadata;
use neuroscan_upload::has_png_extension;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Expand directories one level deep into the files they contain, sorted by
/// name. Plain file paths pass through unchanged.
pub fn expand_paths(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {}", path.display()))?
        {
            let entry_path = entry?.path();
            if entry_path.is_file() {
                entries.push(entry_path);
            }
        }
        entries.sort();
        files.extend(entries);
    }
    Ok(files)
}

/// Expanded paths that name PNG files. Other files are skipped before they
/// are read, so an unreadable non-PNG never aborts an upload.
pub fn upload_candidates(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    Ok(expand_paths(paths)?
        .into_iter()
        .filter(|path| has_png_extension(path))
        .collect())
}

/// User-facing failure text, with the suggested next step when there is one.
pub fn failure_message(err: &impl ErrorMetadata) -> String {
    match err.suggested_action() {
        Some(action) => format!("{} ({})", err.client_message(), action),
        None => err.client_message(),
    }
}

/// Initialize tracing for the CLI binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
