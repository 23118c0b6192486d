//! Prediction backend seam and chunk partitioning

use async_trait::async_trait;
use neuroscan_api_client::{ApiClient, ApiResponse, UploadPart};
use neuroscan_core::models::PredictionBatch;
use neuroscan_core::MAX_CHUNK_SIZE;
use uuid::Uuid;

use crate::error::UploadError;

/// A bounded slice of one batch, sent as a single predict request.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub batch_id: Uuid,
    /// Position in dispatch order, starting at 0.
    pub index: usize,
    pub files: Vec<UploadPart>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Split files into ordered chunks, all carrying `batch_id`.
///
/// `max_chunk_size` is clamped to `1..=MAX_CHUNK_SIZE`, so no chunk ever
/// exceeds what the backend accepts regardless of the configuration passed in.
pub fn partition(batch_id: Uuid, files: Vec<UploadPart>, max_chunk_size: usize) -> Vec<Chunk> {
    let max_chunk_size = max_chunk_size.clamp(1, MAX_CHUNK_SIZE);
    files
        .chunks(max_chunk_size)
        .enumerate()
        .map(|(index, slice)| Chunk {
            batch_id,
            index,
            files: slice.to_vec(),
        })
        .collect()
}

#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// The user's stored prediction batches. `NotFound` when none exist yet.
    async fn fetch_history(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Vec<PredictionBatch>, UploadError>;

    /// Submit one chunk and return the backend's record for it.
    async fn predict_chunk(
        &self,
        user_id: &str,
        token: &str,
        chunk: &Chunk,
    ) -> Result<PredictionBatch, UploadError>;
}

fn into_result<T>(response: ApiResponse<T>) -> Result<T, UploadError> {
    let status = response.status;
    response.into_data().map_err(|e| UploadError::Backend {
        status,
        code: e.code,
        message: e.message,
    })
}

#[async_trait]
impl PredictionBackend for ApiClient {
    async fn fetch_history(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Vec<PredictionBatch>, UploadError> {
        let response = self.get_predictions(user_id, token).await?;
        if response.status == 404 {
            return Err(UploadError::NotFound("prediction history".to_string()));
        }
        into_result(response)
    }

    async fn predict_chunk(
        &self,
        user_id: &str,
        token: &str,
        chunk: &Chunk,
    ) -> Result<PredictionBatch, UploadError> {
        let batch_id = chunk.batch_id.to_string();
        let response = self
            .predict(user_id, token, &batch_id, &chunk.files)
            .await?;
        into_result(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn files(n: usize) -> Vec<UploadPart> {
        (0..n)
            .map(|i| UploadPart {
                filename: format!("{}.png", i),
                content_type: "image/png".to_string(),
                bytes: Bytes::new(),
            })
            .collect()
    }

    #[test]
    fn partition_yields_ceil_chunks_with_shared_batch_id() {
        let batch_id = Uuid::new_v4();
        for (n, expected) in [(0, 0), (1, 1), (100, 1), (101, 2), (250, 3)] {
            let chunks = partition(batch_id, files(n), 100);
            assert_eq!(chunks.len(), expected, "n = {}", n);
            assert!(chunks.iter().all(|c| c.len() <= 100 && !c.is_empty()));
            assert!(chunks.iter().all(|c| c.batch_id == batch_id));
            assert_eq!(chunks.iter().map(Chunk::len).sum::<usize>(), n);
        }
    }

    #[test]
    fn partition_preserves_staging_order() {
        let chunks = partition(Uuid::new_v4(), files(5), 2);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        let flattened: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.files.iter().map(|f| f.filename.clone()))
            .collect();
        let expected: Vec<String> = (0..5).map(|i| format!("{}.png", i)).collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn oversized_chunk_size_is_capped_at_backend_limit() {
        let chunks = partition(Uuid::new_v4(), files(250), 250);
        assert_eq!(chunks.iter().map(Chunk::len).collect::<Vec<_>>(), vec![100, 100, 50]);

        let zero = partition(Uuid::new_v4(), files(3), 0);
        assert_eq!(zero.len(), 3);
    }
}
