//! Files selected for upload

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use neuroscan_api_client::UploadPart;
use uuid::Uuid;

use crate::error::UploadError;
use crate::preview::{PreviewHandle, PreviewStore, PreviewUri};

pub const PNG_CONTENT_TYPE: &str = "image/png";

/// A file as handed over by the user, before the PNG filter.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub filename: String,
    /// Declared MIME type, when the source provides one.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(PNG_CONTENT_TYPE),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Whether `path` names a PNG by its extension (case-insensitive).
pub fn has_png_extension(path: &Path) -> bool {
    content_type_for(path) == Some(PNG_CONTENT_TYPE)
}

impl FileInput {
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<&str>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.into(),
        }
    }

    /// Read a local file; the content type is derived from its extension.
    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| UploadError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.png")
            .to_string();

        Ok(Self {
            filename,
            content_type: content_type_for(path).map(str::to_string),
            bytes: Bytes::from(bytes),
        })
    }

    /// Only PNG images are accepted. A declared content type decides; without
    /// one, a `.png` extension does.
    pub fn is_png(&self) -> bool {
        match &self.content_type {
            Some(content_type) => content_type.eq_ignore_ascii_case(PNG_CONTENT_TYPE),
            None => has_png_extension(Path::new(&self.filename)),
        }
    }
}

/// A PNG awaiting submission. Dropping it releases its preview.
#[derive(Debug)]
pub struct StagedFile {
    id: Uuid,
    filename: String,
    bytes: Bytes,
    preview: PreviewHandle,
}

impl StagedFile {
    pub fn new(input: FileInput, previews: Arc<dyn PreviewStore>) -> Self {
        let preview = PreviewHandle::new(previews, &input.filename, &input.bytes);
        Self {
            id: Uuid::new_v4(),
            filename: input.filename,
            bytes: input.bytes,
            preview,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn preview_uri(&self) -> &PreviewUri {
        self.preview.uri()
    }

    pub fn to_upload_part(&self) -> UploadPart {
        UploadPart {
            filename: self.filename.clone(),
            content_type: PNG_CONTENT_TYPE.to_string(),
            bytes: self.bytes.clone(),
        }
    }
}

/// `532` -> `"532 bytes"`, `2048` -> `"2.0 KB"`, `3145728` -> `"3.0 MB"`
pub fn format_file_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    }
}
