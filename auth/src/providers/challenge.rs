//! Challenge verifier trait (anti-automation check required before SMS).

use crate::error::Result;
use crate::state::ChallengeHandle;
use std::future::Future;

/// Bot challenge that must be initialized before a phone link.
pub trait ChallengeVerifier: Send + Sync {
    /// Initialize the verifier at `mount_point`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ChallengeUnavailable`.
    fn initialize(&self, mount_point: &str) -> impl Future<Output = Result<ChallengeHandle>> + Send;
}
