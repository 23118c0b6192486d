//! NeuroScan CLI: submit MRI scans for tumor detection and inspect the results.
//!
//! Set NEUROSCAN_USER_ID plus NEUROSCAN_ID_TOKEN (or NEUROSCAN_TOKEN_COMMAND),
//! and NEUROSCAN_API_URL (or API_URL).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use neuroscan_api_client::ApiClient;
use neuroscan_cli::{failure_message, init_tracing, truncate_string, upload_candidates};
use neuroscan_core::analytics::{self, BatchSummary};
use neuroscan_core::metrics::format_percent;
use neuroscan_core::models::PredictionBatch;
use neuroscan_core::{export, UploadConfig};
use neuroscan_upload::{
    auth_from_env, format_file_size, BatchOutcome, FileInput, MemoryPreviewStore, StagedEntry,
    SubmitReport, UploadError, UploadPipeline,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "neuroscan", about = "NeuroScan MRI tumor detection CLI")]
struct Cli {
    /// Output format
    #[arg(long, value_enum, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload PNG scans for prediction (directories are expanded one level)
    Upload {
        /// Files or directories to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show prediction history, newest first
    History,
    /// Export one batch's results as CSV
    Export {
        /// Batch id (default: most recent batch)
        #[arg(long)]
        batch: Option<String>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Detection rates per batch and over time
    Analytics {
        /// Batch id (default: all batches)
        #[arg(long)]
        batch: Option<String>,
    },
    /// Show the deployed model's evaluation figures
    Model,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn user_facing(err: UploadError) -> anyhow::Error {
    let message = failure_message(&err);
    anyhow::Error::new(err).context(message)
}

fn outcome_label(outcome: BatchOutcome) -> &'static str {
    match outcome {
        BatchOutcome::Completed => "completed",
        BatchOutcome::PartiallyCompleted => "partially_completed",
    }
}

fn print_batch_table(batch: &PredictionBatch) {
    println!(
        "\nBatch: {}",
        batch.batch_id.as_deref().unwrap_or("(no batch id)")
    );
    println!("Date:  {}", batch.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("\n{:<50} {:<20}", "Filename", "Result");
    println!("{}", "-".repeat(71));
    for prediction in &batch.predictions {
        println!(
            "{:<50} {:<20}",
            truncate_string(&prediction.filename, 50),
            prediction.label()
        );
    }
}

fn print_staged_table(staged: &[StagedEntry]) {
    println!("\n=== Staged Scans ===\n");
    println!("{:<50} {:>12}", "Filename", "Size");
    println!("{}", "-".repeat(63));
    for entry in staged {
        println!(
            "{:<50} {:>12}",
            truncate_string(&entry.filename, 50),
            format_file_size(entry.size)
        );
    }
}

fn print_upload_report(report: &SubmitReport) {
    println!("\n=== Upload Complete ===\n");
    println!("Batch ID:        {}", report.batch_id);
    println!("Outcome:         {}", outcome_label(report.outcome));
    println!("Files submitted: {}", report.files_submitted);
    println!("Files processed: {}", report.files_processed());
    if report.chunks_failed > 0 {
        println!(
            "Warning: {} of {} chunks failed; their files were not processed",
            report.chunks_failed, report.chunks_total
        );
    }
    print_batch_table(&report.batch);
}

fn print_history_table(history: &[PredictionBatch]) {
    println!("\n=== Prediction History ===\n");
    if history.is_empty() {
        println!("No predictions yet.");
        return;
    }

    println!(
        "{:<38} {:<20} {:>6} {:>6}",
        "Batch ID", "Date", "Files", "Tumor"
    );
    println!("{}", "-".repeat(73));
    for batch in history {
        println!(
            "{:<38} {:<20} {:>6} {:>6}",
            truncate_string(batch.batch_id.as_deref().unwrap_or("-"), 38),
            batch.timestamp.format("%Y-%m-%d %H:%M"),
            batch.len(),
            batch.tumor_count()
        );
    }
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "{:<38} {:>6} {:>6} {:>6} {:>5}%{}",
        truncate_string(summary.batch_id.as_deref().unwrap_or("-"), 38),
        summary.total,
        summary.tumor_count,
        summary.clear_count(),
        summary.tumor_percentage,
        if summary.is_high_rate() { "  HIGH" } else { "" }
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let client = ApiClient::from_env()
        .context("Failed to create API client. Set NEUROSCAN_API_URL (or API_URL)")?;
    let upload_config = UploadConfig::from_env().context("Invalid upload configuration")?;
    let auth = auth_from_env()?;
    let pipeline = UploadPipeline::new(
        auth.clone(),
        Arc::new(client.clone()),
        Arc::new(MemoryPreviewStore::new()),
        upload_config,
    );

    match cli.command {
        Commands::Upload { paths } => {
            let files = upload_candidates(&paths)?;
            let mut inputs = Vec::with_capacity(files.len());
            for path in &files {
                inputs.push(FileInput::from_path(path).await?);
            }

            let staged = pipeline.stage(inputs);
            if staged.is_empty() {
                anyhow::bail!("No PNG files to upload");
            }
            tracing::info!(staged = staged.len(), "Files staged");
            if cli.format == OutputFormat::Table {
                print_staged_table(&pipeline.staged());
            }

            let report = pipeline
                .submit()
                .await
                .map_err(user_facing)?
                .context("Nothing was submitted")?;

            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "batchId": report.batch_id,
                    "outcome": outcome_label(report.outcome),
                    "filesSubmitted": report.files_submitted,
                    "filesProcessed": report.files_processed(),
                    "chunksTotal": report.chunks_total,
                    "chunksFailed": report.chunks_failed,
                    "batch": report.batch,
                }))?,
                OutputFormat::Table => print_upload_report(&report),
            }
        }
        Commands::History => {
            pipeline.fetch_history().await.map_err(user_facing)?;
            let history = pipeline.history();
            match cli.format {
                OutputFormat::Json => print_json(&history)?,
                OutputFormat::Table => print_history_table(&history),
            }
        }
        Commands::Export { batch, out } => {
            pipeline.fetch_history().await.map_err(user_facing)?;
            let history = pipeline.history();
            let selected = analytics::select_batch(&history, batch.as_deref())
                .context("No matching prediction batch")?;
            let path = export::write_csv(&out, selected)
                .with_context(|| format!("Failed to write CSV into {}", out.display()))?;
            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({ "path": path }))?,
                OutputFormat::Table => println!("Exported {} results to {}", selected.len(), path.display()),
            }
        }
        Commands::Analytics { batch } => {
            pipeline.fetch_history().await.map_err(user_facing)?;
            let history = pipeline.history();
            let summaries: Vec<BatchSummary> = match batch.as_deref() {
                Some(id) => {
                    let selected = analytics::select_batch(&history, Some(id))
                        .with_context(|| format!("No prediction batch {}", id))?;
                    vec![BatchSummary::from_batch(selected)]
                }
                None => history.iter().map(BatchSummary::from_batch).collect(),
            };
            let timeline = analytics::detection_timeline(&history);

            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "batches": summaries,
                    "timeline": timeline,
                }))?,
                OutputFormat::Table => {
                    println!("\n=== Detection Analytics ===\n");
                    println!(
                        "{:<38} {:>6} {:>6} {:>6} {:>6}",
                        "Batch ID", "Files", "Tumor", "Clear", "Rate"
                    );
                    println!("{}", "-".repeat(72));
                    for summary in &summaries {
                        print_summary(summary);
                    }
                    println!("\n--- Timeline (oldest first) ---");
                    for point in &timeline {
                        println!("{}  {:>3}%", point.date, point.percentage);
                    }
                }
            }
        }
        Commands::Model => {
            let identity = auth
                .current_identity()
                .context("You must be logged in. Set NEUROSCAN_USER_ID")?;
            let token = auth.fresh_token(&identity).await.map_err(user_facing)?;
            let response = client.model_info(&identity.user_id, &token).await?;
            if response.status == 404 {
                println!("No model information published yet.");
                return Ok(());
            }
            let info = response.into_data()?;

            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "model": info,
                    "status": info.status(),
                    "total": info.total(),
                    "confusionShares": info.confusion_shares(),
                }))?,
                OutputFormat::Table => {
                    println!("\n=== Model Performance ===\n");
                    println!("Status:    {}", info.status().label());
                    println!("Accuracy:  {}", format_percent(info.accuracy));
                    println!("Precision: {}", format_percent(info.precision));
                    println!("Recall:    {}", format_percent(info.recall));
                    println!("F1 score:  {}", format_percent(info.f1));

                    let shares = info.confusion_shares();
                    println!("\n--- Confusion Matrix ({} samples) ---", info.total());
                    println!(
                        "True positives:  {:>6} ({})",
                        info.true_positives,
                        format_percent(shares.true_positive)
                    );
                    println!(
                        "True negatives:  {:>6} ({})",
                        info.true_negatives,
                        format_percent(shares.true_negative)
                    );
                    println!(
                        "False positives: {:>6} ({})",
                        info.false_positives,
                        format_percent(shares.false_positive)
                    );
                    println!(
                        "False negatives: {:>6} ({})",
                        info.false_negatives,
                        format_percent(shares.false_negative)
                    );
                    println!(
                        "Correct: {}  Incorrect: {}",
                        format_percent(info.correct_rate()),
                        format_percent(info.incorrect_rate())
                    );

                    if !info.history.is_empty() {
                        println!("\n--- Training History ---");
                        println!("{:>6} {:>10} {:>10}", "Epoch", "Accuracy", "Loss");
                        for epoch in &info.history {
                            println!(
                                "{:>6} {:>10} {:>10.4}",
                                epoch.epoch,
                                format_percent(epoch.accuracy),
                                epoch.loss
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
