//! Preview handles for staged files
//!
//! A [`PreviewHandle`] owns one preview URI and releases it when dropped, so
//! every path that removes a staged file (unstage, reset, successful submit,
//! dropping the pipeline) releases the preview exactly once.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use uuid::Uuid;

/// Renderable reference to a staged file's content (e.g. `blob:<uuid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewUri(String);

impl PreviewUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creates and releases preview URIs.
pub trait PreviewStore: Send + Sync {
    fn create(&self, filename: &str, bytes: &Bytes) -> PreviewUri;

    fn release(&self, uri: &PreviewUri);
}

/// Owned preview URI, released on drop.
pub struct PreviewHandle {
    uri: PreviewUri,
    store: Arc<dyn PreviewStore>,
}

impl PreviewHandle {
    pub fn new(store: Arc<dyn PreviewStore>, filename: &str, bytes: &Bytes) -> Self {
        let uri = store.create(filename, bytes);
        Self { uri, store }
    }

    pub fn uri(&self) -> &PreviewUri {
        &self.uri
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.uri).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.release(&self.uri);
    }
}

#[derive(Default)]
struct MemoryPreviews {
    live: HashMap<PreviewUri, Bytes>,
    #[cfg(test)]
    releases: HashMap<PreviewUri, usize>,
}

/// In-process `blob:` URIs resolving to the staged bytes.
#[derive(Default)]
pub struct MemoryPreviewStore {
    inner: Mutex<MemoryPreviews>,
}

impl MemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryPreviews> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Content behind a live URI.
    pub fn resolve(&self, uri: &PreviewUri) -> Option<Bytes> {
        self.lock().live.get(uri).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// How many times `uri` has been released.
    #[cfg(test)]
    pub fn release_count(&self, uri: &PreviewUri) -> usize {
        self.lock().releases.get(uri).copied().unwrap_or(0)
    }
}

impl PreviewStore for MemoryPreviewStore {
    fn create(&self, _filename: &str, bytes: &Bytes) -> PreviewUri {
        let uri = PreviewUri::new(format!("blob:{}", Uuid::new_v4()));
        self.lock().live.insert(uri.clone(), bytes.clone());
        uri
    }

    fn release(&self, uri: &PreviewUri) {
        let mut previews = self.lock();
        if previews.live.remove(uri).is_none() {
            tracing::warn!(uri = %uri, "Released a preview that was not live");
        }
        #[cfg(test)]
        {
            *previews.releases.entry(uri.clone()).or_insert(0) += 1;
        }
    }
}
