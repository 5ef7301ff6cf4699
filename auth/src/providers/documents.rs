//! Document store trait.

use crate::error::Result;
use std::future::Future;

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Collection/id keyed document store with merge writes.
///
/// There is no optimistic concurrency: concurrent merges of the same field
/// resolve last-write-wins.
pub trait DocumentStore: Send + Sync {
    /// Merge `fields` into the document, creating it when absent. Fields not
    /// named are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PermissionDenied` or `AuthError::Unavailable`.
    fn upsert_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Read a document. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PermissionDenied` or `AuthError::Unavailable`.
    fn read(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>>> + Send;

    /// Append `items` to the array `field` (skipping values already present)
    /// and merge `fields`, on an existing document.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DocumentNotFound` if the document is missing, or
    /// the store's access errors.
    fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        items: Vec<serde_json::Value>,
        fields: Document,
    ) -> impl Future<Output = Result<()>> + Send;
}
