//! Auth environment.
//!
//! Dependencies injected into the auth reducers.

use crate::config::AuthConfig;
use crate::providers::{ChallengeVerifier, CredentialIssuer, DocumentStore};
use lavado_core::environment::Clock;
use std::sync::Arc;

/// Auth environment.
///
/// # Type Parameters
///
/// - `I`: Credential issuer
/// - `D`: Document store (profile records)
/// - `V`: Challenge verifier
#[derive(Clone)]
pub struct AuthEnvironment<I, D, V>
where
    I: CredentialIssuer + Clone,
    D: DocumentStore + Clone,
    V: ChallengeVerifier + Clone,
{
    /// Credential issuer.
    pub issuer: I,

    /// Document store holding profile records.
    pub documents: D,

    /// Challenge verifier for the phone channel.
    pub challenge: V,

    /// Clock for record timestamps.
    pub clock: Arc<dyn Clock>,

    /// Registration and sign-in settings.
    pub config: AuthConfig,
}

impl<I, D, V> AuthEnvironment<I, D, V>
where
    I: CredentialIssuer + Clone,
    D: DocumentStore + Clone,
    V: ChallengeVerifier + Clone,
{
    /// Create a new auth environment.
    #[must_use]
    pub fn new(issuer: I, documents: D, challenge: V, clock: Arc<dyn Clock>, config: AuthConfig) -> Self {
        Self {
            issuer,
            documents,
            challenge,
            clock,
            config,
        }
    }
}
