//! Domain methods for the NeuroScan API client.
//!
//! Response types come from `neuroscan_core::models`. Every method takes the
//! bearer token explicitly: tokens are short-lived and owned by the caller.

use bytes::Bytes;
use neuroscan_core::models::{ModelInfo, PredictionBatch};
use reqwest::multipart::{Form, Part};

use crate::{ApiClient, ApiResponse, ApiResult, RequestBody};

/// Multipart field carrying the shared batch id.
pub const BATCH_ID_FIELD: &str = "batchId";
/// Repeated multipart field carrying the image payloads.
pub const IMAGES_FIELD: &str = "images";

/// One image payload of a predict request.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

fn user_path(prefix: &str, user_id: &str) -> String {
    format!("{}/{}", prefix, urlencoding::encode(user_id))
}

impl ApiClient {
    /// Fetch the user's prediction history. A 404 means "no history yet".
    pub async fn get_predictions(
        &self,
        user_id: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<Vec<PredictionBatch>>> {
        self.get(&user_path("/get-predictions", user_id), Some(token), &[])
            .await
    }

    /// Submit one chunk of images under a shared batch id.
    pub async fn predict(
        &self,
        user_id: &str,
        token: &str,
        batch_id: &str,
        files: &[UploadPart],
    ) -> ApiResult<ApiResponse<PredictionBatch>> {
        let mut form = Form::new().text(BATCH_ID_FIELD, batch_id.to_string());
        for file in files {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.filename.clone())
                .mime_str(&file.content_type)?;
            form = form.part(IMAGES_FIELD, part);
        }

        self.post(
            &user_path("/predict", user_id),
            Some(token),
            Some(RequestBody::from(form)),
        )
        .await
    }

    /// Evaluation figures of the deployed model. A 404 means none is published.
    pub async fn model_info(
        &self,
        user_id: &str,
        token: &str,
    ) -> ApiResult<ApiResponse<ModelInfo>> {
        self.get(&user_path("/model-info", user_id), Some(token), &[])
            .await
    }
}
