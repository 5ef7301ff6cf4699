//! Object storage trait.

use crate::error::Result;
use std::collections::BTreeMap;
use std::future::Future;

/// Custom metadata attached to an uploaded object.
pub type ObjectMetadata = BTreeMap<String, String>;

/// Path-addressed blob storage.
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::Storage` when the upload is rejected.
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: ObjectMetadata,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Public download URL for the object at `path`.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::Storage` when the object does not exist.
    fn download_url(&self, path: &str) -> impl Future<Output = Result<String>> + Send;
}
