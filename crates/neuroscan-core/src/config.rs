//! Configuration module
//!
//! Client and upload settings are read from the environment (a `.env` file is
//! honoured). Every value has a default except the identity settings, which
//! belong to the binary that wires an auth provider.

use std::env;
use std::time::Duration;

/// Largest number of files the backend accepts in one predict request.
pub const MAX_CHUNK_SIZE: usize = 100;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from NEUROSCAN_API_URL (or API_URL) and NEUROSCAN_TIMEOUT_SECS.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let base_url = env::var("NEUROSCAN_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout_secs = env::var("NEUROSCAN_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("NEUROSCAN_TIMEOUT_SECS must be a valid number"))?;

        let config = Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "NEUROSCAN_API_URL must start with http:// or https://"
            ));
        }

        if self.timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "NEUROSCAN_TIMEOUT_SECS must be greater than 0"
            ));
        }

        Ok(())
    }
}

/// Upload pipeline configuration
#[derive(Clone, Copy, Debug)]
pub struct UploadConfig {
    /// Files per predict request, 1..=MAX_CHUNK_SIZE
    pub max_chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

impl UploadConfig {
    /// Load from NEUROSCAN_CHUNK_SIZE.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let max_chunk_size = env::var("NEUROSCAN_CHUNK_SIZE")
            .unwrap_or_else(|_| MAX_CHUNK_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("NEUROSCAN_CHUNK_SIZE must be a valid number"))?;

        let config = Self { max_chunk_size };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_chunk_size == 0 || self.max_chunk_size > MAX_CHUNK_SIZE {
            return Err(anyhow::anyhow!(
                "NEUROSCAN_CHUNK_SIZE must be between 1 and {}",
                MAX_CHUNK_SIZE
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_config_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000/api");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn client_config_rejects_non_http_url() {
        let config = ClientConfig::new("ftp://example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn client_config_rejects_zero_timeout() {
        let config = ClientConfig {
            timeout: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn upload_config_bounds() {
        assert!(UploadConfig::default().validate().is_ok());
        assert!(UploadConfig { max_chunk_size: 1 }.validate().is_ok());
        assert!(UploadConfig { max_chunk_size: 0 }.validate().is_err());
        assert!(UploadConfig {
            max_chunk_size: MAX_CHUNK_SIZE + 1
        }
        .validate()
        .is_err());
    }
}
