//! Auth capability consumed by the pipeline
//!
//! The pipeline only needs "who is logged in" and "a bearer token for them,
//! now". Tokens are short-lived, so [`AuthProvider::fresh_token`] is called
//! once per operation and never cached by the pipeline.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use crate::error::UploadError;

/// Authenticated user as seen by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Currently authenticated identity, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// Obtain a bearer token for `identity`. Fails with `AuthRequired` when
    /// the session can no longer produce one.
    async fn fresh_token(&self, identity: &Identity) -> Result<String, UploadError>;
}

/// Fixed identity and token, e.g. handed over by a login step elsewhere.
#[derive(Clone)]
pub struct StaticTokenAuth {
    identity: Option<Identity>,
    token: String,
}

impl std::fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuth")
            .field("identity", &self.identity)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl StaticTokenAuth {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identity: Some(Identity::new(user_id)),
            token: token.into(),
        }
    }

    /// No one logged in.
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            token: String::new(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    async fn fresh_token(&self, identity: &Identity) -> Result<String, UploadError> {
        match &self.identity {
            Some(own) if own == identity && !self.token.is_empty() => Ok(self.token.clone()),
            _ => Err(UploadError::AuthRequired(format!(
                "no token available for user {}",
                identity.user_id
            ))),
        }
    }
}

/// Mints a token per call by running a shell command and reading its stdout.
///
/// The command sees the user id in `NEUROSCAN_USER_ID`.
#[derive(Debug, Clone)]
pub struct CommandTokenAuth {
    identity: Identity,
    command: String,
}

impl CommandTokenAuth {
    pub fn new(user_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            identity: Identity::new(user_id),
            command: command.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for CommandTokenAuth {
    fn current_identity(&self) -> Option<Identity> {
        Some(self.identity.clone())
    }

    async fn fresh_token(&self, identity: &Identity) -> Result<String, UploadError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env("NEUROSCAN_USER_ID", &identity.user_id)
            .output()
            .await
            .map_err(|e| UploadError::AuthRequired(format!("token command failed to start: {}", e)))?;

        if !output.status.success() {
            tracing::warn!(status = %output.status, "Token command exited with failure");
            return Err(UploadError::AuthRequired(format!(
                "token command exited with {}",
                output.status
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(UploadError::AuthRequired(
                "token command printed no token".to_string(),
            ));
        }
        Ok(token)
    }
}

/// Build the auth provider from NEUROSCAN_USER_ID plus NEUROSCAN_TOKEN_COMMAND
/// or NEUROSCAN_ID_TOKEN. Without a user id nobody is logged in.
pub fn auth_from_env() -> anyhow::Result<Arc<dyn AuthProvider>> {
    dotenvy::dotenv().ok();

    let Ok(user_id) = env::var("NEUROSCAN_USER_ID") else {
        tracing::debug!("NEUROSCAN_USER_ID not set; running unauthenticated");
        return Ok(Arc::new(StaticTokenAuth::anonymous()));
    };

    if let Ok(command) = env::var("NEUROSCAN_TOKEN_COMMAND") {
        return Ok(Arc::new(CommandTokenAuth::new(user_id, command)));
    }

    let token = env::var("NEUROSCAN_ID_TOKEN")
        .context("Missing token. Set NEUROSCAN_ID_TOKEN or NEUROSCAN_TOKEN_COMMAND")?;
    Ok(Arc::new(StaticTokenAuth::new(user_id, token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_auth_issues_token_for_its_identity() {
        let auth = StaticTokenAuth::new("user-1", "tok");
        let identity = auth.current_identity().unwrap();
        assert_eq!(identity.user_id, "user-1");
        assert_eq!(auth.fresh_token(&identity).await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn static_auth_refuses_other_identity() {
        let auth = StaticTokenAuth::new("user-1", "tok");
        let err = auth.fresh_token(&Identity::new("user-2")).await.unwrap_err();
        assert!(matches!(err, UploadError::AuthRequired(_)));
    }

    #[tokio::test]
    async fn anonymous_has_no_identity() {
        assert!(StaticTokenAuth::anonymous().current_identity().is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", StaticTokenAuth::new("u", "secret-token"));
        assert!(!rendered.contains("secret-token"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_auth_reads_trimmed_stdout() {
        let auth = CommandTokenAuth::new("user-9", "echo \"tok-$NEUROSCAN_USER_ID\"");
        let identity = auth.current_identity().unwrap();
        assert_eq!(auth.fresh_token(&identity).await.unwrap(), "tok-user-9");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_auth_failure_is_auth_required() {
        let failing = CommandTokenAuth::new("u", "exit 3");
        let identity = failing.current_identity().unwrap();
        assert!(matches!(
            failing.fresh_token(&identity).await,
            Err(UploadError::AuthRequired(_))
        ));

        let silent = CommandTokenAuth::new("u", "true");
        assert!(matches!(
            silent.fresh_token(&identity).await,
            Err(UploadError::AuthRequired(_))
        ));
    }
}
