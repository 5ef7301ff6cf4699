//! # Lavado Testing
//!
//! Testing utilities for reducers written against `lavado-core`.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for a single reducer step
//! - [`driver`]: runs returned effects in-process and feeds actions back, so a
//!   whole flow can be tested without a `Store`
//! - [`FixedClock`]: deterministic time
//!
//! ## Example
//!
//! ```ignore
//! use lavado_testing::{driver, test_clock};
//!
//! #[tokio::test]
//! async fn test_email_registration() {
//!     let env = test_environment();
//!     let mut state = AuthState::default();
//!
//!     let trace = driver::drive(&AuthReducer::new(), &mut state, submit(), &env).await;
//!
//!     assert_eq!(state.registration.phase, Phase::AwaitingEmailConfirmation);
//!     assert!(trace.iter().any(|a| matches!(a, AuthAction::ProfileWritten)));
//! }
//! ```

use chrono::{DateTime, Utc};
use lavado_core::environment::Clock;

pub mod driver;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of core environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use lavado_testing::mocks::FixedClock;
    /// use lavado_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Never in practice: the timestamp is a compile-time constant.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a test-friendly `tracing` subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub use mocks::{test_clock, FixedClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
