//! Shared fixtures for the auth flow tests.

#![allow(dead_code)]

use lavado_auth::mocks::{MockChallengeVerifier, MockCredentialIssuer, MockDocumentStore};
use lavado_auth::state::{AccountType, VerificationChannel};
use lavado_auth::{AuthAction, AuthConfig, AuthEnvironment, AuthReducer, AuthState, RegistrationForm};
use lavado_testing::driver::drive;
use lavado_testing::mocks::test_clock;
use std::sync::Arc;

pub type TestEnv = AuthEnvironment<MockCredentialIssuer, MockDocumentStore, MockChallengeVerifier>;
pub type TestReducer = AuthReducer<MockCredentialIssuer, MockDocumentStore, MockChallengeVerifier>;

pub const OWNER_KEY: &str = "OWNER-2024";

pub fn test_env() -> TestEnv {
    AuthEnvironment::new(
        MockCredentialIssuer::new(),
        MockDocumentStore::new(),
        MockChallengeVerifier::new(),
        Arc::new(test_clock()),
        AuthConfig::new(OWNER_KEY),
    )
}

pub fn customer_form(email: &str) -> RegistrationForm {
    RegistrationForm {
        first_name: "Ana".into(),
        last_name: "Ruiz".into(),
        street: "1 Main St".into(),
        city: "New York".into(),
        state: "NY".into(),
        zip_code: "10001".into(),
        phone: "+1 (212) 555-0100".into(),
        email: email.into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
        channel: VerificationChannel::Email,
        account_type: AccountType::Customer,
        ..RegistrationForm::default()
    }
}

pub fn phone_form(email: &str) -> RegistrationForm {
    RegistrationForm {
        channel: VerificationChannel::Phone,
        ..customer_form(email)
    }
}

/// Reducer, environment and state driven in-process.
pub struct Harness {
    pub env: TestEnv,
    pub reducer: TestReducer,
    pub state: AuthState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_env(test_env())
    }

    pub fn with_env(env: TestEnv) -> Self {
        Self {
            env,
            reducer: TestReducer::new(),
            state: AuthState::default(),
        }
    }

    /// Reduce `action` and everything it feeds back; returns the fed-back trace.
    pub async fn send(&mut self, action: AuthAction) -> Vec<AuthAction> {
        drive(&self.reducer, &mut self.state, action, &self.env).await
    }
}
