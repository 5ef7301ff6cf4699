//! Mock challenge verifier.

use crate::error::{AuthError, Result};
use crate::providers::ChallengeVerifier;
use crate::state::ChallengeHandle;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Counts initializations; can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct MockChallengeVerifier {
    initializations: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl MockChallengeVerifier {
    /// Create a verifier that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following initialization fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of initialization attempts so far.
    #[must_use]
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}

impl ChallengeVerifier for MockChallengeVerifier {
    fn initialize(&self, mount_point: &str) -> impl Future<Output = Result<ChallengeHandle>> + Send {
        let count = self.initializations.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self.fail.load(Ordering::SeqCst);
        let handle = ChallengeHandle(format!("{mount_point}#{count}"));

        async move {
            if fail {
                Err(AuthError::ChallengeUnavailable)
            } else {
                Ok(handle)
            }
        }
    }
}
