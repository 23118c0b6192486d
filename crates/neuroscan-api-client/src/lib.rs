//! Shared HTTP client for the NeuroScan prediction API.
//!
//! Provides a minimal client with per-call bearer auth, generic
//! GET/POST/PUT/PATCH/DELETE helpers, and domain methods (predict, history,
//! model info). Any HTTP response is returned to the caller with its status;
//! only transport failures and undecodable success bodies become [`ApiError`].

pub mod api;

use anyhow::{Context, Result};
use neuroscan_core::ClientConfig;
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error code for a success response whose body does not match the expected type.
pub const MALFORMED_RESPONSE: &str = "MALFORMED_RESPONSE";

/// Normalized client error: one shape regardless of what failed underneath.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status: Option<u16>, code: Option<&str>) -> Self {
        Self {
            message: message.into(),
            status,
            code: code.map(str::to_string),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.status.is_none()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            "TIMEOUT"
        } else if err.is_connect() {
            "CONNECTION_FAILED"
        } else if err.is_builder() {
            "INVALID_REQUEST"
        } else if err.is_body() || err.is_decode() {
            "BODY_ERROR"
        } else {
            "REQUEST_FAILED"
        };

        ApiError {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
            code: Some(code.to_string()),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Status plus decoded body of any HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    /// Decoded body, present for 2xx responses.
    pub data: Option<T>,
    /// Backend `message`/`error` text, present for non-2xx responses.
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-2xx response into an [`ApiError`] carrying its status.
    pub fn into_data(self) -> ApiResult<T> {
        let success = self.is_success();
        match self.data {
            Some(data) if success => Ok(data),
            _ => Err(ApiError {
                message: self
                    .message
                    .unwrap_or_else(|| format!("API request failed with status {}", self.status)),
                status: Some(self.status),
                code: Some(format!("HTTP_{}", self.status)),
            }),
        }
    }
}

/// Request payload: a structured JSON document or a multipart form.
#[derive(Debug)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Form),
}

impl RequestBody {
    pub fn json<D: Serialize>(value: &D) -> ApiResult<Self> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::new(e.to_string(), None, Some("INVALID_REQUEST")))
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Form> for RequestBody {
    fn from(form: Form) -> Self {
        RequestBody::Multipart(form)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn error_message(body: &[u8]) -> Option<String> {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return Some(message);
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// HTTP client for the NeuroScan API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create client from environment: NEUROSCAN_API_URL (or API_URL), NEUROSCAN_TIMEOUT_SECS.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("Invalid client configuration")?;
        Self::new(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    // Multipart bodies must not get an explicit content type: reqwest writes
    // `multipart/form-data; boundary=...` itself.
    fn apply_body(request: RequestBuilder, body: Option<RequestBody>) -> RequestBuilder {
        match body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<RequestBody>,
    ) -> ApiResult<ApiResponse<T>> {
        let url = self.build_url(path);
        let mut request = self.client.request(method.clone(), &url);
        request = Self::apply_auth(request, token);

        if !query.is_empty() {
            request = request.query(query);
        }
        request = Self::apply_body(request, body);

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, url = %url, error = %e, "Request failed before a response");
            ApiError::from(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            tracing::debug!(%method, url = %url, status = status.as_u16(), "API returned non-success status");
            return Ok(ApiResponse {
                status: status.as_u16(),
                data: None,
                message: error_message(&bytes),
            });
        }

        let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };

        let data: T = serde_json::from_slice(raw).map_err(|e| {
            ApiError::new(
                format!("Failed to parse response as JSON: {}", e),
                Some(status.as_u16()),
                Some(MALFORMED_RESPONSE),
            )
        })?;

        Ok(ApiResponse {
            status: status.as_u16(),
            data: Some(data),
            message: None,
        })
    }

    /// GET request with optional query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> ApiResult<ApiResponse<T>> {
        self.send(Method::GET, path, token, query, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: Option<RequestBody>,
    ) -> ApiResult<ApiResponse<T>> {
        self.send(Method::POST, path, token, &[], body).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: Option<RequestBody>,
    ) -> ApiResult<ApiResponse<T>> {
        self.send(Method::PUT, path, token, &[], body).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: Option<RequestBody>,
    ) -> ApiResult<ApiResponse<T>> {
        self.send(Method::PATCH, path, token, &[], body).await
    }

    /// DELETE request; a body, if given, is sent like any other method's.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: Option<RequestBody>,
    ) -> ApiResult<ApiResponse<T>> {
        self.send(Method::DELETE, path, token, &[], body).await
    }
}

pub use api::UploadPart;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_message_then_error_then_text() {
        assert_eq!(
            error_message(br#"{"message":"Model not found"}"#).as_deref(),
            Some("Model not found")
        );
        assert_eq!(
            error_message(br#"{"error":"No image files provided"}"#).as_deref(),
            Some("No image files provided")
        );
        assert_eq!(error_message(b"  Bad Gateway \n").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message(b""), None);
    }

    #[test]
    fn into_data_maps_non_success_to_error() {
        let response: ApiResponse<u32> = ApiResponse {
            status: 404,
            data: None,
            message: Some("No predictions found".to_string()),
        };
        let err = response.into_data().unwrap_err();
        assert_eq!(err.status, Some(404));
        assert_eq!(err.code.as_deref(), Some("HTTP_404"));
        assert_eq!(err.message, "No predictions found");
        assert!(!err.is_transport());
    }

    #[test]
    fn into_data_returns_success_body() {
        let response = ApiResponse {
            status: 200,
            data: Some(7u32),
            message: None,
        };
        assert_eq!(response.into_data().unwrap(), 7);
    }

    #[test]
    fn build_url_trims_trailing_slash() {
        let client = ApiClient::new(ClientConfig::new("http://localhost:5000/api/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(
            client.build_url("/predict/u1"),
            "http://localhost:5000/api/predict/u1"
        );
    }
}
