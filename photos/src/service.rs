//! Order photo upload service.
//!
//! Photos go to object storage under
//! `orders/{order}/{phase}/{ts}_{index}_{uploader}_{name}` and an entry per
//! photo is appended to the order document's `beforePhotos` or `afterPhotos`
//! array.

use crate::error::{PhotoError, Result};
use crate::storage::{ObjectMetadata, ObjectStorage};
use chrono::SecondsFormat;
use lavado_auth::providers::{Document, DocumentStore};
use lavado_auth::{AuthError, UserId};
use lavado_core::environment::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Collection holding order documents.
pub const ORDERS_COLLECTION: &str = "orders";

/// Content type used when an upload does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// When a photo was taken relative to the wash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoPhase {
    /// Before the wash.
    Before,
    /// After the wash.
    After,
}

impl PhotoPhase {
    /// Path segment and metadata value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }

    /// Order document field the entries are appended to.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Before => "beforePhotos",
            Self::After => "afterPhotos",
        }
    }
}

/// One photo as recorded on the order document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPhotoEntry {
    /// Object path.
    pub path: String,
    /// Phase.
    pub phase: PhotoPhase,
    /// Uploader user id.
    pub uploader: String,
    /// Upload time, epoch millis.
    pub uploaded_at: i64,
    /// Original file name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type.
    #[serde(rename = "type")]
    pub content_type: String,
}

/// A file to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Original file name.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
    /// Declared content type; empty means unknown.
    pub content_type: String,
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Replace every run of characters outside `[A-Za-z0-9_.-]` with one `_`.
///
/// ```
/// # use lavado_photos::sanitize_file_name;
/// assert_eq!(sanitize_file_name("mi foto (1).jpg"), "mi_foto_1_.jpg");
/// assert_eq!(sanitize_file_name("ok-name_2.png"), "ok-name_2.png");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let mut clean = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            clean.push(c);
            in_run = false;
        } else if !in_run {
            clean.push('_');
            in_run = true;
        }
    }
    clean
}

fn timestamp(clock: &dyn Clock) -> Value {
    Value::String(clock.now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Uploads order photos and records them on the order document.
#[derive(Clone)]
pub struct PhotoService<S, D>
where
    S: ObjectStorage,
    D: DocumentStore,
{
    storage: S,
    documents: D,
    clock: Arc<dyn Clock>,
}

impl<S, D> PhotoService<S, D>
where
    S: ObjectStorage,
    D: DocumentStore,
{
    /// Create a photo service.
    #[must_use]
    pub fn new(storage: S, documents: D, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            documents,
            clock,
        }
    }

    /// Upload `files` for `order_id` and append their entries under the
    /// phase's field. The order document is created when missing.
    ///
    /// Files are uploaded one at a time; a failed upload stops the batch
    /// before the order document is touched.
    ///
    /// # Errors
    ///
    /// - [`PhotoError::NotAuthenticated`] without an uploader
    /// - [`PhotoError::Storage`] when an upload fails
    /// - [`PhotoError::Document`] when the order document cannot be read or
    ///   updated
    #[tracing::instrument(skip(self, uploader, files), fields(count = files.len()))]
    pub async fn upload_order_photos(
        &self,
        uploader: Option<&UserId>,
        order_id: &str,
        files: Vec<PhotoUpload>,
        phase: PhotoPhase,
    ) -> Result<Vec<OrderPhotoEntry>> {
        let uploader = uploader.ok_or(PhotoError::NotAuthenticated)?;

        if self.documents.read(ORDERS_COLLECTION, order_id).await?.is_none() {
            let mut fields = Document::new();
            fields.insert("id".to_string(), Value::String(order_id.to_string()));
            fields.insert("createdAt".to_string(), timestamp(self.clock.as_ref()));
            self.documents
                .upsert_merge(ORDERS_COLLECTION, order_id, fields)
                .await?;
            tracing::debug!(order_id, "Order document created");
        }

        let mut entries = Vec::with_capacity(files.len());
        for (index, file) in files.into_iter().enumerate() {
            let ts = self.clock.now().timestamp_millis();
            let path = format!(
                "{ORDERS_COLLECTION}/{order_id}/{}/{ts}_{index}_{uploader}_{}",
                phase.as_str(),
                sanitize_file_name(&file.name)
            );
            let content_type = if file.content_type.is_empty() {
                DEFAULT_CONTENT_TYPE.to_string()
            } else {
                file.content_type
            };
            let metadata = ObjectMetadata::from([
                ("orderId".to_string(), order_id.to_string()),
                ("phase".to_string(), phase.as_str().to_string()),
                ("uploader".to_string(), uploader.to_string()),
            ]);
            let size = file.bytes.len() as u64;

            if let Err(error) = self
                .storage
                .upload(&path, file.bytes, &content_type, metadata)
                .await
            {
                tracing::warn!(%error, path = %path, uploaded = entries.len(), "Photo upload failed");
                return Err(error);
            }

            entries.push(OrderPhotoEntry {
                path,
                phase,
                uploader: uploader.to_string(),
                uploaded_at: ts,
                name: file.name,
                size,
                content_type,
            });
        }

        let items = entries
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AuthError::Internal(format!("photo entry encoding failed: {e}")))?;
        let mut fields = Document::new();
        fields.insert("updatedAt".to_string(), timestamp(self.clock.as_ref()));
        self.documents
            .array_union(ORDERS_COLLECTION, order_id, phase.field(), items, fields)
            .await?;

        tracing::info!(order_id, phase = phase.as_str(), count = entries.len(), "Order photos recorded");
        Ok(entries)
    }

    /// Download URL for an uploaded photo.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoError::Storage`] when the object does not exist.
    pub async fn download_url(&self, path: &str) -> Result<String> {
        self.storage.download_url(path).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_phase_fields() {
        assert_eq!(PhotoPhase::Before.field(), "beforePhotos");
        assert_eq!(PhotoPhase::After.field(), "afterPhotos");
    }

    #[test]
    fn test_entry_serializes_type_field() {
        let entry = OrderPhotoEntry {
            path: "orders/o1/after/1_0_u1_a.jpg".into(),
            phase: PhotoPhase::After,
            uploader: "u1".into(),
            uploaded_at: 1,
            name: "a.jpg".into(),
            size: 3,
            content_type: "image/jpeg".into(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "image/jpeg");
        assert_eq!(value["uploadedAt"], 1);
        assert_eq!(value["phase"], "after");
    }

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_file_name("a  b//c.png"), "a_b_c.png");
        assert_eq!(sanitize_file_name("ñandú.jpg"), "_and_.jpg");
        assert_eq!(sanitize_file_name(""), "");
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_path_safe(name in ".{0,40}") {
            let clean = sanitize_file_name(&name);
            prop_assert!(clean.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')));
            prop_assert!(clean.chars().count() <= name.chars().count());
        }
    }
}
