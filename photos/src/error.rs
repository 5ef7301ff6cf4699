//! Photo upload errors.

use lavado_auth::AuthError;
use thiserror::Error;

/// Result type for photo operations.
pub type Result<T> = std::result::Result<T, PhotoError>;

/// Photo upload error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhotoError {
    /// No signed-in uploader.
    #[error("No autenticado")]
    NotAuthenticated,

    /// Object storage rejected an upload or lookup.
    #[error("Object storage error: {0}")]
    Storage(String),

    /// The order document could not be read or updated.
    #[error("Order document error: {0}")]
    Document(#[from] AuthError),
}
