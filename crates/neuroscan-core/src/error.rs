//! Error metadata shared by the client crates
//!
//! Concrete error enums live next to the code that raises them (`ApiError` in
//! the HTTP client, `UploadError` in the pipeline). They describe themselves to
//! consumers and to the logging layer through [`ErrorMetadata`].

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected conditions like an empty history
    Debug,
    /// Warning level - for recoverable issues like a single failed chunk
    Warn,
    /// Error level - for failures that abort an operation
    Error,
}

/// Metadata for user-facing error reporting
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "AUTH_REQUIRED")
    fn error_code(&self) -> &'static str;

    /// Whether the failed operation can be retried as-is
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Message shown to the user (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}
