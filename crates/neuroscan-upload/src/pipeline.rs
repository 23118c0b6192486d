//! Staging set, submission and prediction history for one user session.
//!
//! `submit` snapshots the staged files, partitions them into chunks and sends
//! every chunk at once, then waits for all of them to settle. Successful
//! chunks are aggregated into one batch record and merged into history;
//! failed chunks are logged and left out. Only when no chunk succeeds does the
//! submission fail, and then the staged files stay in place for a retry.
//!
//! Session state sits behind a mutex that is never held across an `.await`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use neuroscan_api_client::UploadPart;
use neuroscan_core::history;
use neuroscan_core::models::PredictionBatch;
use neuroscan_core::{ErrorMetadata, UploadConfig};
use uuid::Uuid;

use crate::auth::{AuthProvider, Identity};
use crate::backend::{partition, PredictionBackend};
use crate::error::{log_error, UploadError};
use crate::preview::{PreviewStore, PreviewUri};
use crate::staging::{FileInput, StagedFile};

const HISTORY_LOAD_ERROR: &str = "Failed to load existing predictions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Staged,
    Submitting,
    Completed,
    PartiallyCompleted,
    Failed,
}

/// Which pane the consumer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Upload,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every chunk succeeded.
    Completed,
    /// At least one chunk succeeded and at least one failed.
    PartiallyCompleted,
}

/// Result of a submission that produced at least one prediction record.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub batch_id: Uuid,
    pub user_id: String,
    pub submitted_at: DateTime<Utc>,
    pub outcome: BatchOutcome,
    pub chunks_total: usize,
    pub chunks_failed: usize,
    pub files_submitted: usize,
    /// Aggregated record of the successful chunks, as merged into history.
    pub batch: PredictionBatch,
}

impl SubmitReport {
    pub fn files_processed(&self) -> usize {
        self.batch.len()
    }
}

/// Read-only view of a staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    pub id: Uuid,
    pub filename: String,
    pub size: usize,
    pub preview: PreviewUri,
}

struct Session {
    staged: Vec<StagedFile>,
    history: Vec<PredictionBatch>,
    state: PipelineState,
    view: View,
    error: Option<String>,
    loading: bool,
}

fn idle_or_staged(staged: &[StagedFile]) -> PipelineState {
    if staged.is_empty() {
        PipelineState::Idle
    } else {
        PipelineState::Staged
    }
}

pub struct UploadPipeline {
    auth: Arc<dyn AuthProvider>,
    backend: Arc<dyn PredictionBackend>,
    previews: Arc<dyn PreviewStore>,
    config: UploadConfig,
    session: Mutex<Session>,
    submitting: AtomicBool,
}

/// The single submission slot of a pipeline. Freed on every exit path,
/// including a submit future that is dropped mid-flight.
struct SubmitSlot<'a> {
    pipeline: &'a UploadPipeline,
}

impl<'a> SubmitSlot<'a> {
    fn acquire(pipeline: &'a UploadPipeline) -> Option<Self> {
        pipeline
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { pipeline })
    }
}

impl Drop for SubmitSlot<'_> {
    fn drop(&mut self) {
        {
            let mut session = self.pipeline.lock();
            if session.state == PipelineState::Submitting {
                session.state = idle_or_staged(&session.staged);
            }
        }
        self.pipeline.submitting.store(false, Ordering::Release);
    }
}

impl UploadPipeline {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        backend: Arc<dyn PredictionBackend>,
        previews: Arc<dyn PreviewStore>,
        config: UploadConfig,
    ) -> Self {
        Self {
            auth,
            backend,
            previews,
            config,
            session: Mutex::new(Session {
                staged: Vec::new(),
                history: Vec::new(),
                state: PipelineState::Idle,
                view: View::Upload,
                error: None,
                loading: false,
            }),
            submitting: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stage the PNG files among `files` and return their new ids.
    ///
    /// Anything that is not a PNG is dropped without an error or a count.
    pub fn stage(&self, files: impl IntoIterator<Item = FileInput>) -> Vec<Uuid> {
        let accepted: Vec<StagedFile> = files
            .into_iter()
            .filter(FileInput::is_png)
            .map(|input| StagedFile::new(input, self.previews.clone()))
            .collect();

        if accepted.is_empty() {
            return Vec::new();
        }

        let ids = accepted.iter().map(StagedFile::id).collect();
        let mut session = self.lock();
        session.staged.extend(accepted);
        if session.state != PipelineState::Submitting {
            session.state = PipelineState::Staged;
        }
        tracing::debug!(staged = session.staged.len(), "Files staged");
        ids
    }

    /// Remove one staged file and release its preview. Returns false when
    /// `id` is not staged.
    pub fn unstage(&self, id: Uuid) -> bool {
        let removed = {
            let mut session = self.lock();
            let Some(pos) = session.staged.iter().position(|f| f.id() == id) else {
                return false;
            };
            let removed = session.staged.remove(pos);
            if session.state == PipelineState::Staged && session.staged.is_empty() {
                session.state = PipelineState::Idle;
            }
            removed
        };
        drop(removed);
        true
    }

    /// Release every staged preview and clear the staging set.
    pub fn reset(&self) {
        let cleared = {
            let mut session = self.lock();
            if session.state != PipelineState::Submitting {
                session.state = PipelineState::Idle;
                session.error = None;
            }
            std::mem::take(&mut session.staged)
        };
        drop(cleared);
    }

    /// Submit everything currently staged.
    ///
    /// Returns `Ok(None)` without doing anything when nothing is staged or a
    /// submission is already in flight.
    pub async fn submit(&self) -> Result<Option<SubmitReport>, UploadError> {
        let Some(_slot) = SubmitSlot::acquire(self) else {
            tracing::debug!("Submission already in flight; ignoring submit");
            return Ok(None);
        };

        let snapshot: Option<Vec<(Uuid, UploadPart)>> = {
            let mut session = self.lock();
            if session.staged.is_empty() {
                None
            } else {
                session.state = PipelineState::Submitting;
                session.error = None;
                Some(
                    session
                        .staged
                        .iter()
                        .map(|f| (f.id(), f.to_upload_part()))
                        .collect(),
                )
            }
        };
        let Some(files) = snapshot else {
            return Ok(None);
        };

        match self.dispatch(files).await {
            Ok(report) => Ok(Some(report)),
            Err(err) => {
                log_error("Error uploading files", &err);
                let mut session = self.lock();
                session.state = PipelineState::Failed;
                session.error = Some(err.client_message());
                Err(err)
            }
        }
    }

    async fn dispatch(&self, files: Vec<(Uuid, UploadPart)>) -> Result<SubmitReport, UploadError> {
        let identity = self
            .auth
            .current_identity()
            .ok_or_else(|| UploadError::AuthRequired("no authenticated user".to_string()))?;

        let batch_id = Uuid::new_v4();
        let submitted_at = Utc::now();
        let token = self.token_for(&identity).await?;

        let (ids, parts): (Vec<Uuid>, Vec<UploadPart>) = files.into_iter().unzip();
        let submitted: HashSet<Uuid> = ids.into_iter().collect();
        let files_submitted = parts.len();
        let chunks = partition(batch_id, parts, self.config.max_chunk_size);
        let chunks_total = chunks.len();

        tracing::info!(
            %batch_id,
            files = files_submitted,
            chunks = chunks_total,
            "Submitting batch"
        );

        let settled = join_all(
            chunks
                .iter()
                .map(|chunk| self.backend.predict_chunk(&identity.user_id, &token, chunk)),
        )
        .await;

        let mut confirmed = Vec::with_capacity(chunks_total);
        let mut chunks_failed = 0;
        for (chunk, result) in chunks.iter().zip(settled) {
            match result {
                Ok(mut record) => {
                    record.batch_id = Some(batch_id.to_string());
                    confirmed.push(record);
                }
                Err(err) => {
                    chunks_failed += 1;
                    tracing::warn!(
                        %batch_id,
                        chunk = chunk.index + 1,
                        files = chunk.len(),
                        error = %err,
                        "Error processing chunk; continuing with the others"
                    );
                }
            }
        }

        // All records share one batch id, so grouping yields a single record.
        let batch = history::group_by_batch(confirmed)
            .into_iter()
            .next()
            .ok_or(UploadError::NoChunksProcessed {
                chunks: chunks_total,
            })?;

        let outcome = if chunks_failed == 0 {
            BatchOutcome::Completed
        } else {
            BatchOutcome::PartiallyCompleted
        };

        let removed: Vec<StagedFile> = {
            let mut session = self.lock();
            history::merge_into(&mut session.history, vec![batch.clone()]);
            let (removed, kept): (Vec<StagedFile>, Vec<StagedFile>) =
                std::mem::take(&mut session.staged)
                    .into_iter()
                    .partition(|f| submitted.contains(&f.id()));
            session.staged = kept;
            session.view = View::History;
            session.error = None;
            session.state = match outcome {
                BatchOutcome::Completed => PipelineState::Completed,
                BatchOutcome::PartiallyCompleted => PipelineState::PartiallyCompleted,
            };
            removed
        };
        drop(removed);

        tracing::info!(
            %batch_id,
            processed = batch.len(),
            chunks_failed,
            ?outcome,
            "Batch submitted"
        );

        Ok(SubmitReport {
            batch_id,
            user_id: identity.user_id,
            submitted_at,
            outcome,
            chunks_total,
            chunks_failed,
            files_submitted,
            batch,
        })
    }

    async fn token_for(&self, identity: &Identity) -> Result<String, UploadError> {
        self.auth
            .fresh_token(identity)
            .await
            .map_err(|err| match err {
                UploadError::AuthRequired(_) => err,
                other => UploadError::AuthRequired(other.to_string()),
            })
    }

    /// Load the user's stored history, replacing the in-memory list.
    ///
    /// No identity or a 404 yields an empty history without an error. Any
    /// other failure leaves an empty history, records a retryable error
    /// message, switches the view back to upload, and is returned.
    pub async fn fetch_history(&self) -> Result<(), UploadError> {
        {
            let mut session = self.lock();
            session.loading = true;
            session.error = None;
        }

        let result = self.load_history().await;

        let mut session = self.lock();
        session.loading = false;
        match result {
            Ok(records) => {
                session.history = history::normalize(records);
                Ok(())
            }
            Err(err) => {
                log_error("Error fetching predictions", &err);
                session.history = Vec::new();
                session.error = Some(HISTORY_LOAD_ERROR.to_string());
                session.view = View::Upload;
                Err(err)
            }
        }
    }

    async fn load_history(&self) -> Result<Vec<PredictionBatch>, UploadError> {
        let Some(identity) = self.auth.current_identity() else {
            return Ok(Vec::new());
        };
        let token = self.token_for(&identity).await?;

        match self.backend.fetch_history(&identity.user_id, &token).await {
            Err(UploadError::NotFound(_)) => {
                tracing::debug!(user_id = %identity.user_id, "No prediction history yet");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    pub fn staged(&self) -> Vec<StagedEntry> {
        self.lock()
            .staged
            .iter()
            .map(|f| StagedEntry {
                id: f.id(),
                filename: f.filename().to_string(),
                size: f.size(),
                preview: f.preview_uri().clone(),
            })
            .collect()
    }

    pub fn is_staged(&self, id: Uuid) -> bool {
        self.lock().staged.iter().any(|f| f.id() == id)
    }

    /// History, newest first.
    pub fn history(&self) -> Vec<PredictionBatch> {
        self.lock().history.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.lock().state
    }

    pub fn view(&self) -> View {
        self.lock().view
    }

    pub fn set_view(&self, view: View) {
        self.lock().view = view;
    }

    /// User-facing message of the last failed operation.
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }
}
