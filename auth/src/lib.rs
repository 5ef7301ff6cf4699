//! # Lavado Authentication
//!
//! Registration, contact verification, sign-in and role routing for the car
//! wash marketplace client, written as reducers over injected providers.
//!
//! ## Architecture
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! The credential issuer, the document store holding profile records and the
//! challenge verifier are traits in [`providers`]. Reducers never call them
//! directly; every call happens inside an effect.
//!
//! ## Example: email registration
//!
//! ```rust,ignore
//! use lavado_auth::*;
//!
//! let store = Store::new(AuthState::default(), AuthReducer::new(), env);
//!
//! store
//!     .send_and_wait_for(
//!         AuthAction::SubmitRegistration { form },
//!         |a| matches!(a, AuthAction::ProfileWritten),
//!         Duration::from_secs(5),
//!     )
//!     .await?;
//!
//! // The user follows the link, then presses "verify now"
//! store.send(AuthAction::CheckEmailVerified).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod environment;
pub mod error;
pub mod profile;
pub mod providers;
pub mod reducers;
pub mod role;
pub mod state;
pub mod validation;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use actions::AuthAction;
pub use config::{AuthConfig, ConfigError};
pub use environment::AuthEnvironment;
pub use error::{AuthError, Result, ValidationError};
pub use profile::{ProfilePatch, ProfileRecord};
pub use reducers::AuthReducer;
pub use role::{resolve_role, Destination, Role};
pub use state::{AuthState, Credential, Phase, RegistrationForm, UserId};
