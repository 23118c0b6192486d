//! Batch upload pipeline for the NeuroScan prediction backend.
//!
//! Files are staged (PNG only), partitioned into chunks of at most
//! [`neuroscan_core::MAX_CHUNK_SIZE`], dispatched concurrently under one batch
//! id and aggregated into the user's prediction history. A failing chunk is
//! logged and excluded; it never aborts its siblings.
//!
//! Collaborators are injected: [`AuthProvider`] for identity and fresh bearer
//! tokens, [`PredictionBackend`] for the HTTP calls (implemented for
//! [`neuroscan_api_client::ApiClient`]) and [`PreviewStore`] for preview
//! handles.

pub mod auth;
pub mod backend;
pub mod error;
pub mod pipeline;
pub mod preview;
pub mod staging;

pub use auth::{auth_from_env, AuthProvider, CommandTokenAuth, Identity, StaticTokenAuth};
pub use backend::{partition, Chunk, PredictionBackend};
pub use error::UploadError;
pub use pipeline::{BatchOutcome, PipelineState, StagedEntry, SubmitReport, UploadPipeline, View};
pub use preview::{MemoryPreviewStore, PreviewHandle, PreviewStore, PreviewUri};
pub use staging::{format_file_size, has_png_extension, FileInput, StagedFile, PNG_CONTENT_TYPE};
