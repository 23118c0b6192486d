//! Upload pipeline error taxonomy

use neuroscan_api_client::ApiError;
use neuroscan_core::{ErrorMetadata, LogLevel};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    /// No identity, or the identity provider refused to issue a token.
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Network failure or timeout before a response arrived.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        code: Option<String>,
    },

    /// The backend answered with a non-success status or an unreadable body.
    #[error("Backend error ({status}): {message}")]
    Backend {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Every chunk of a submission failed.
    #[error("No images were successfully processed ({chunks} chunks failed)")]
    NoChunksProcessed { chunks: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<ApiError> for UploadError {
    fn from(err: ApiError) -> Self {
        match err.status {
            None => UploadError::Transport {
                message: err.message,
                code: err.code,
            },
            Some(status) => UploadError::Backend {
                status,
                code: err.code,
                message: err.message,
            },
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Io(err.to_string())
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::AuthRequired(_) => "AUTH_REQUIRED",
            UploadError::Transport { .. } => "TRANSPORT_ERROR",
            UploadError::Backend { .. } => "BACKEND_ERROR",
            UploadError::NoChunksProcessed { .. } => "NO_CHUNKS_PROCESSED",
            UploadError::NotFound(_) => "NOT_FOUND",
            UploadError::Io(_) => "IO_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            UploadError::AuthRequired(_) => false,
            UploadError::Transport { .. } => true,
            UploadError::Backend { status, .. } => *status >= 500,
            UploadError::NoChunksProcessed { .. } => true,
            UploadError::NotFound(_) => true,
            UploadError::Io(_) => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            UploadError::AuthRequired(_) => Some("Log in again"),
            UploadError::Transport { .. } => Some("Check the connection and retry"),
            UploadError::Backend { .. } => None,
            UploadError::NoChunksProcessed { .. } => Some("Retry the upload"),
            UploadError::NotFound(_) => None,
            UploadError::Io(_) => Some("Check the file path and permissions"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::AuthRequired(_) => "You must be logged in to upload files".to_string(),
            UploadError::NoChunksProcessed { .. } => {
                "Failed to process images. Please try again.".to_string()
            }
            UploadError::Transport { .. } => {
                "Could not reach the prediction service. Please try again.".to_string()
            }
            UploadError::Backend { message, .. } => message.clone(),
            UploadError::NotFound(what) => format!("{} not found", what),
            UploadError::Io(message) => message.clone(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::NotFound(_) => LogLevel::Debug,
            UploadError::Transport { .. } | UploadError::Backend { .. } => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Log a failed operation at the level the error asks for.
pub(crate) fn log_error(operation: &str, error: &UploadError) {
    let code = error.error_code();
    let recoverable = error.is_recoverable();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code, recoverable, "{}", operation);
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code, recoverable, "{}", operation);
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code, recoverable, "{}", operation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_api_error_maps_to_transport() {
        let err = UploadError::from(ApiError::new("connection refused", None, Some("CONNECTION_FAILED")));
        assert!(matches!(err, UploadError::Transport { ref code, .. } if code.as_deref() == Some("CONNECTION_FAILED")));
        assert!(err.is_recoverable());
    }

    #[test]
    fn status_api_error_maps_to_backend() {
        let err = UploadError::from(ApiError::new("bad", Some(400), Some("HTTP_400")));
        assert_eq!(
            err,
            UploadError::Backend {
                status: 400,
                code: Some("HTTP_400".to_string()),
                message: "bad".to_string(),
            }
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn operation_level_messages() {
        assert_eq!(
            UploadError::AuthRequired("no identity".into()).client_message(),
            "You must be logged in to upload files"
        );
        assert_eq!(
            UploadError::NoChunksProcessed { chunks: 2 }.client_message(),
            "Failed to process images. Please try again."
        );
        assert_eq!(
            UploadError::NoChunksProcessed { chunks: 2 }.error_code(),
            "NO_CHUNKS_PROCESSED"
        );
    }

    #[test]
    fn log_level_follows_severity() {
        let cases = [
            (UploadError::NotFound("history".into()), LogLevel::Debug),
            (
                UploadError::Transport {
                    message: "reset".into(),
                    code: None,
                },
                LogLevel::Warn,
            ),
            (UploadError::NoChunksProcessed { chunks: 1 }, LogLevel::Error),
            (UploadError::AuthRequired("expired".into()), LogLevel::Error),
        ];
        for (err, level) in cases {
            assert_eq!(err.log_level(), level, "{:?}", err);
            log_error("operation", &err);
        }
    }

    #[test]
    fn retryable_failures_suggest_an_action() {
        let err = UploadError::NoChunksProcessed { chunks: 3 };
        assert!(err.is_recoverable());
        assert_eq!(err.suggested_action(), Some("Retry the upload"));
        assert_eq!(UploadError::NotFound("x".into()).suggested_action(), None);
    }
}
