//! NeuroScan Core Library
//!
//! This crate provides the domain models, history aggregation, CSV export,
//! analytics and configuration shared by the NeuroScan client crates.

pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod metrics;
pub mod models;

// Re-export commonly used types
pub use config::{ClientConfig, UploadConfig, MAX_CHUNK_SIZE};
pub use error::{ErrorMetadata, LogLevel};
pub use models::{ModelInfo, PredictionBatch, PredictionResult, TrainingEpoch};
