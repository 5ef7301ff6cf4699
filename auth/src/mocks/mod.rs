//! In-memory provider implementations for tests and demos.
//!
//! Each mock shares its state behind an `Arc`, so a clone handed to the
//! environment and a clone kept by the test observe the same data.

pub mod challenge;
pub mod credential;
pub mod documents;

pub use challenge::MockChallengeVerifier;
pub use credential::{IssuerCall, MockCredentialIssuer, VALID_SMS_CODE};
pub use documents::{DocumentWrite, MockDocumentStore};
