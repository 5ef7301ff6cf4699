//! Order photo uploads against in-memory storage and documents.

#![allow(clippy::unwrap_used)]

use lavado_auth::mocks::MockDocumentStore;
use lavado_auth::UserId;
use lavado_photos::mocks::InMemoryObjectStorage;
use lavado_photos::{PhotoError, PhotoPhase, PhotoService, PhotoUpload};
use lavado_testing::mocks::test_clock;
use serde_json::json;
use std::sync::Arc;

const TS: i64 = 1_735_689_600_000;

fn service() -> (
    PhotoService<InMemoryObjectStorage, MockDocumentStore>,
    InMemoryObjectStorage,
    MockDocumentStore,
) {
    let storage = InMemoryObjectStorage::new();
    let documents = MockDocumentStore::new();
    let service = PhotoService::new(storage.clone(), documents.clone(), Arc::new(test_clock()));
    (service, storage, documents)
}

fn photo(name: &str, content_type: &str) -> PhotoUpload {
    PhotoUpload {
        name: name.into(),
        bytes: vec![1, 2, 3],
        content_type: content_type.into(),
    }
}

#[tokio::test]
async fn upload_requires_an_uploader() {
    let (service, storage, documents) = service();

    let result = service
        .upload_order_photos(None, "o1", vec![photo("a.jpg", "image/jpeg")], PhotoPhase::Before)
        .await;

    assert_eq!(result, Err(PhotoError::NotAuthenticated));
    assert_eq!(PhotoError::NotAuthenticated.to_string(), "No autenticado");
    assert!(storage.paths().is_empty());
    assert_eq!(documents.write_count(), 0);
}

#[tokio::test]
async fn upload_creates_order_and_appends_entries() {
    let (service, storage, documents) = service();
    let uploader = UserId::from("u1");

    let entries = service
        .upload_order_photos(
            Some(&uploader),
            "o1",
            vec![photo("mi foto (1).jpg", "image/jpeg"), photo("raw", "")],
            PhotoPhase::Before,
        )
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, format!("orders/o1/before/{TS}_0_u1_mi_foto_1_.jpg"));
    assert_eq!(entries[0].name, "mi foto (1).jpg");
    assert_eq!(entries[0].size, 3);
    assert_eq!(entries[1].path, format!("orders/o1/before/{TS}_1_u1_raw"));
    assert_eq!(entries[1].content_type, "application/octet-stream");

    let stored = storage.object(&entries[0].path).unwrap();
    assert_eq!(stored.content_type, "image/jpeg");
    assert_eq!(stored.metadata.get("orderId").map(String::as_str), Some("o1"));
    assert_eq!(stored.metadata.get("phase").map(String::as_str), Some("before"));
    assert_eq!(stored.metadata.get("uploader").map(String::as_str), Some("u1"));

    let order = documents.get("orders", "o1").unwrap();
    assert_eq!(order.get("id"), Some(&json!("o1")));
    assert!(order.contains_key("createdAt"));
    assert!(order.contains_key("updatedAt"));
    let before = order.get("beforePhotos").unwrap().as_array().unwrap();
    assert_eq!(before.len(), 2);
    assert_eq!(before[1]["type"], "application/octet-stream");
    assert_eq!(before[0]["uploadedAt"], TS);
    assert!(!order.contains_key("afterPhotos"));
}

#[tokio::test]
async fn after_photos_leave_existing_order_fields_alone() {
    let (service, _storage, documents) = service();
    documents.insert("orders", "o1", json!({"id": "o1", "status": "in-progress"}));
    let uploader = UserId::from("w1");

    service
        .upload_order_photos(Some(&uploader), "o1", vec![photo("after.png", "image/png")], PhotoPhase::After)
        .await
        .unwrap();

    let order = documents.get("orders", "o1").unwrap();
    assert_eq!(order.get("status"), Some(&json!("in-progress")));
    assert!(!order.contains_key("createdAt"));
    assert_eq!(order.get("afterPhotos").unwrap().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_upload_records_nothing_on_the_order() {
    let (service, storage, documents) = service();
    storage.fail_after(1);
    let uploader = UserId::from("u1");

    let result = service
        .upload_order_photos(
            Some(&uploader),
            "o1",
            vec![photo("a.jpg", "image/jpeg"), photo("b.jpg", "image/jpeg")],
            PhotoPhase::Before,
        )
        .await;

    assert!(matches!(result, Err(PhotoError::Storage(_))));
    assert_eq!(storage.paths().len(), 1);
    let order = documents.get("orders", "o1").unwrap();
    assert!(!order.contains_key("beforePhotos"));
}

#[tokio::test]
async fn unreadable_order_surfaces_document_error() {
    let (service, storage, documents) = service();
    documents.fail_reads_with(lavado_auth::AuthError::PermissionDenied);
    let uploader = UserId::from("u1");

    let result = service
        .upload_order_photos(Some(&uploader), "o1", vec![photo("a.jpg", "")], PhotoPhase::Before)
        .await;

    assert_eq!(
        result,
        Err(PhotoError::Document(lavado_auth::AuthError::PermissionDenied))
    );
    assert!(storage.paths().is_empty());
}

#[tokio::test]
async fn download_url_delegates_to_storage() {
    let (service, _storage, _documents) = service();
    let uploader = UserId::from("u1");
    let entries = service
        .upload_order_photos(Some(&uploader), "o1", vec![photo("a.jpg", "image/jpeg")], PhotoPhase::After)
        .await
        .unwrap();

    let url = service.download_url(&entries[0].path).await.unwrap();
    assert_eq!(url, format!("memory://{}", entries[0].path));
    assert!(matches!(
        service.download_url("orders/o1/after/missing").await,
        Err(PhotoError::Storage(_))
    ));
}
