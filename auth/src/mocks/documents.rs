//! Mock document store with merge semantics.

use crate::error::{AuthError, Result};
use crate::providers::{Document, DocumentStore};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A recorded write.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    /// Collection written to.
    pub collection: String,
    /// Document id.
    pub id: String,
    /// Fields merged (for array unions, the merged fields plus the array).
    pub fields: Document,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<(String, String), Document>,
    writes: Vec<DocumentWrite>,
    read_failure: Option<AuthError>,
    write_failure: Option<AuthError>,
}

/// In-memory document store.
#[derive(Debug, Clone, Default)]
pub struct MockDocumentStore {
    inner: Arc<Mutex<Inner>>,
}

impl MockDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> Result<T> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AuthError::Internal("mock document store poisoned".to_string()))?;
        Ok(f(&mut inner))
    }

    fn seed(&self, helper: &'static str, f: impl FnOnce(&mut Inner)) {
        if let Err(error) = self.with_inner(f) {
            tracing::error!(%error, helper, "Mock document store not updated");
        }
    }

    /// Seed a document, replacing any existing one. Non-object values are
    /// stored as empty documents.
    pub fn insert(&self, collection: &str, id: &str, document: serde_json::Value) {
        let document = match document {
            serde_json::Value::Object(map) => map,
            _ => Document::new(),
        };
        self.seed("insert", |inner| {
            inner
                .documents
                .insert((collection.to_string(), id.to_string()), document);
        });
    }

    /// Current contents of a document.
    #[must_use]
    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.with_inner(|inner| {
            inner
                .documents
                .get(&(collection.to_string(), id.to_string()))
                .cloned()
        })
        .ok()
        .flatten()
    }

    /// Fail every following read with `error`.
    pub fn fail_reads_with(&self, error: AuthError) {
        self.seed("fail_reads_with", |inner| inner.read_failure = Some(error));
    }

    /// Fail every following write with `error`.
    pub fn fail_writes_with(&self, error: AuthError) {
        self.seed("fail_writes_with", |inner| inner.write_failure = Some(error));
    }

    /// Clear injected failures.
    pub fn heal(&self) {
        self.seed("heal", |inner| {
            inner.read_failure = None;
            inner.write_failure = None;
        });
    }

    /// Successful writes, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<DocumentWrite> {
        self.with_inner(|inner| inner.writes.clone()).unwrap_or_default()
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.with_inner(|inner| inner.writes.len()).unwrap_or_default()
    }
}

impl DocumentStore for MockDocumentStore {
    fn upsert_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> impl Future<Output = Result<()>> + Send {
        let store = self.clone();
        let key = (collection.to_string(), id.to_string());

        async move {
            store.with_inner(|inner| {
                if let Some(error) = inner.write_failure.clone() {
                    return Err(error);
                }
                let document = inner.documents.entry(key.clone()).or_default();
                for (field, value) in &fields {
                    document.insert(field.clone(), value.clone());
                }
                inner.writes.push(DocumentWrite {
                    collection: key.0,
                    id: key.1,
                    fields,
                });
                Ok(())
            })?
        }
    }

    fn read(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>>> + Send {
        let store = self.clone();
        let key = (collection.to_string(), id.to_string());

        async move {
            store.with_inner(|inner| match inner.read_failure.clone() {
                Some(error) => Err(error),
                None => Ok(inner.documents.get(&key).cloned()),
            })?
        }
    }

    fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        items: Vec<serde_json::Value>,
        fields: Document,
    ) -> impl Future<Output = Result<()>> + Send {
        let store = self.clone();
        let key = (collection.to_string(), id.to_string());
        let field = field.to_string();

        async move {
            store.with_inner(|inner| {
                if let Some(error) = inner.write_failure.clone() {
                    return Err(error);
                }
                let document = inner
                    .documents
                    .get_mut(&key)
                    .ok_or(AuthError::DocumentNotFound)?;

                let array = document
                    .entry(field.clone())
                    .or_insert_with(|| serde_json::Value::Array(Vec::new()));
                if !array.is_array() {
                    *array = serde_json::Value::Array(Vec::new());
                }
                if let serde_json::Value::Array(existing) = array {
                    for item in &items {
                        if !existing.contains(item) {
                            existing.push(item.clone());
                        }
                    }
                }
                for (name, value) in &fields {
                    document.insert(name.clone(), value.clone());
                }

                let mut recorded = fields;
                recorded.insert(field, serde_json::Value::Array(items));
                inner.writes.push(DocumentWrite {
                    collection: key.0,
                    id: key.1,
                    fields: recorded,
                });
                Ok(())
            })?
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_merge_keeps_unnamed_fields() {
        let store = MockDocumentStore::new();
        store.upsert_merge("users", "u1", doc(json!({"role": "owner", "phoneVerified": false}))).await.unwrap();
        store.upsert_merge("users", "u1", doc(json!({"phoneVerified": true}))).await.unwrap();

        let stored = store.get("users", "u1").unwrap();
        assert_eq!(stored.get("role"), Some(&json!("owner")));
        assert_eq!(stored.get("phoneVerified"), Some(&json!(true)));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MockDocumentStore::new();
        store.fail_writes_with(AuthError::Unavailable);
        let result = store.upsert_merge("users", "u1", Document::new()).await;
        assert_eq!(result, Err(AuthError::Unavailable));
        assert_eq!(store.write_count(), 0);

        store.heal();
        store.fail_reads_with(AuthError::PermissionDenied);
        assert_eq!(store.read("users", "u1").await, Err(AuthError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_array_union_requires_document_and_dedupes() {
        let store = MockDocumentStore::new();
        let result = store
            .array_union("orders", "o1", "beforePhotos", vec![json!(1)], Document::new())
            .await;
        assert_eq!(result, Err(AuthError::DocumentNotFound));

        store.insert("orders", "o1", json!({"id": "o1"}));
        store
            .array_union("orders", "o1", "beforePhotos", vec![json!(1), json!(2)], Document::new())
            .await
            .unwrap();
        store
            .array_union("orders", "o1", "beforePhotos", vec![json!(2), json!(3)], doc(json!({"updatedAt": "t"})))
            .await
            .unwrap();

        let stored = store.get("orders", "o1").unwrap();
        assert_eq!(stored.get("beforePhotos"), Some(&json!([1, 2, 3])));
        assert_eq!(stored.get("updatedAt"), Some(&json!("t")));
    }

    #[tokio::test]
    #[allow(clippy::panic)]
    async fn test_poisoned_store_surfaces_internal_error() {
        let store = MockDocumentStore::new();
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.inner.lock();
            panic!("holder died with the lock");
        })
        .join();

        store.insert("users", "u1", json!({"role": "admin"}));
        assert_eq!(store.get("users", "u1"), None);
        assert!(matches!(store.read("users", "u1").await, Err(AuthError::Internal(_))));
    }
}
