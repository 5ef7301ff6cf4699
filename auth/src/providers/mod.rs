//! Provider traits for the managed backend.
//!
//! The reducers depend only on these traits. Production wiring supplies
//! backend clients; tests use the in-memory versions in [`crate::mocks`].
//!
//! Every method returns `impl Future<Output = Result<T>> + Send` so calls can
//! run inside effects on any executor thread.

pub mod challenge;
pub mod credential;
pub mod documents;

pub use challenge::ChallengeVerifier;
pub use credential::CredentialIssuer;
pub use documents::{Document, DocumentStore};
