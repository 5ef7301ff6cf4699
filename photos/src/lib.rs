//! # Lavado Order Photos
//!
//! Washers and admins attach before/after photos to an order. Each upload is
//! stored through an [`ObjectStorage`] and recorded on the order document
//! through the same [`DocumentStore`](lavado_auth::providers::DocumentStore)
//! the auth crate uses for profiles.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod service;
pub mod storage;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use error::{PhotoError, Result};
pub use service::{
    sanitize_file_name, OrderPhotoEntry, PhotoPhase, PhotoService, PhotoUpload,
    DEFAULT_CONTENT_TYPE, ORDERS_COLLECTION,
};
pub use storage::{ObjectMetadata, ObjectStorage};
