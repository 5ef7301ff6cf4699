//! In-memory object storage.

use crate::error::{PhotoError, Result};
use crate::storage::{ObjectMetadata, ObjectStorage};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Contents.
    pub bytes: Vec<u8>,
    /// Content type given at upload.
    pub content_type: String,
    /// Custom metadata given at upload.
    pub metadata: ObjectMetadata,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, StoredObject>,
    fail_after: Option<usize>,
    uploads: usize,
}

/// Object storage kept in memory. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStorage {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryObjectStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> Result<T>) -> Result<T> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PhotoError::Storage("mock storage poisoned".to_string()))?;
        f(&mut inner)
    }

    /// Accept `count` more uploads, then reject every following one.
    pub fn fail_after(&self, count: usize) {
        if let Err(error) = self.with_inner(|inner| {
            inner.fail_after = Some(inner.uploads + count);
            Ok(())
        }) {
            tracing::error!(%error, "Mock storage not updated");
        }
    }

    /// Object stored at `path`.
    #[must_use]
    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.with_inner(|inner| Ok(inner.objects.get(path).cloned()))
            .ok()
            .flatten()
    }

    /// Every stored path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.with_inner(|inner| Ok(inner.objects.keys().cloned().collect()))
            .unwrap_or_default()
    }
}

impl ObjectStorage for InMemoryObjectStorage {
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: ObjectMetadata,
    ) -> impl Future<Output = Result<()>> + Send {
        let storage = self.clone();
        let path = path.to_string();
        let content_type = content_type.to_string();

        async move {
            storage.with_inner(|inner| {
                if inner.fail_after.is_some_and(|limit| inner.uploads >= limit) {
                    return Err(PhotoError::Storage(format!("upload rejected: {path}")));
                }
                inner.uploads += 1;
                inner.objects.insert(
                    path,
                    StoredObject {
                        bytes,
                        content_type,
                        metadata,
                    },
                );
                Ok(())
            })
        }
    }

    fn download_url(&self, path: &str) -> impl Future<Output = Result<String>> + Send {
        let storage = self.clone();
        let path = path.to_string();

        async move {
            storage.with_inner(|inner| {
                if inner.objects.contains_key(&path) {
                    Ok(format!("memory://{path}"))
                } else {
                    Err(PhotoError::Storage(format!("object not found: {path}")))
                }
            })
        }
    }
}
