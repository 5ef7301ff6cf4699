//! Authentication reducers.
//!
//! Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
//! Provider calls happen only inside the returned effects.

pub mod login;
pub mod registration;

use crate::providers::{ChallengeVerifier, CredentialIssuer, DocumentStore};
use crate::{AuthAction, AuthEnvironment, AuthState};
use crate::actions::Flow;
use lavado_core::{effect::Effect, reducer::Reducer, SmallVec};

pub use login::LoginReducer;
pub use registration::RegistrationReducer;

/// Unified authentication reducer.
///
/// Routes each action to the registration or sign-in reducer by
/// [`AuthAction::flow`].
#[derive(Clone, Debug)]
pub struct AuthReducer<I, D, V>
where
    I: CredentialIssuer + Clone + 'static,
    D: DocumentStore + Clone + 'static,
    V: ChallengeVerifier + Clone + 'static,
{
    registration: RegistrationReducer<I, D, V>,
    login: LoginReducer<I, D, V>,
}

impl<I, D, V> AuthReducer<I, D, V>
where
    I: CredentialIssuer + Clone + 'static,
    D: DocumentStore + Clone + 'static,
    V: ChallengeVerifier + Clone + 'static,
{
    /// Create a new unified auth reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registration: RegistrationReducer::new(),
            login: LoginReducer::new(),
        }
    }
}

impl<I, D, V> Default for AuthReducer<I, D, V>
where
    I: CredentialIssuer + Clone + 'static,
    D: DocumentStore + Clone + 'static,
    V: ChallengeVerifier + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, D, V> Reducer for AuthReducer<I, D, V>
where
    I: CredentialIssuer + Clone + 'static,
    D: DocumentStore + Clone + 'static,
    V: ChallengeVerifier + Clone + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment<I, D, V>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action.flow() {
            Flow::Registration => self.registration.reduce(state, action, env),
            Flow::Login => self.login.reduce(state, action, env),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::error::{AuthError, ValidationError};
    use crate::mocks::{IssuerCall, MockChallengeVerifier, MockCredentialIssuer, MockDocumentStore};
    use crate::role::{Destination, Role};
    use crate::state::{
        AccountType, AuthMode, ChallengeHandle, Credential, LoginPhase, Phase, RegistrationForm,
        UserId, VerificationChannel,
    };
    use lavado_testing::driver::drive;
    use lavado_testing::mocks::test_clock;
    use lavado_testing::{assertions, ReducerTest};
    use std::sync::Arc;

    type TestEnv = AuthEnvironment<MockCredentialIssuer, MockDocumentStore, MockChallengeVerifier>;
    type TestReducer = AuthReducer<MockCredentialIssuer, MockDocumentStore, MockChallengeVerifier>;

    fn env() -> TestEnv {
        AuthEnvironment::new(
            MockCredentialIssuer::new(),
            MockDocumentStore::new(),
            MockChallengeVerifier::new(),
            Arc::new(test_clock()),
            AuthConfig::new("OWNER-2024"),
        )
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            street: "1 Main St".into(),
            city: "New York".into(),
            state: "NY".into(),
            zip_code: "10001".into(),
            phone: "+1 (212) 555-0100".into(),
            email: "a@b.com".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            ..RegistrationForm::default()
        }
    }

    fn credential() -> Credential {
        Credential {
            user_id: UserId::from("u1"),
            email: "a@b.com".into(),
            phone: None,
            email_verified: false,
            phone_verified: false,
            display_name: None,
        }
    }

    #[test]
    fn test_invalid_form_produces_no_effects() {
        let mut bad = form();
        bad.confirm_password = "other".into();

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::SubmitRegistration { form: bad })
            .then_state(|state| {
                assert_eq!(state.registration.phase, Phase::Collecting);
                assert!(!state.registration.busy);
                assert_eq!(
                    state.registration.error,
                    Some(AuthError::Validation(ValidationError::PasswordMismatch))
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_valid_form_starts_credential_creation() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::SubmitRegistration { form: form() })
            .then_state(|state| {
                assert!(state.registration.busy);
                assert_eq!(
                    state.registration.profile.as_ref().and_then(|p| p.phone.clone()),
                    Some("+12125550100".to_string())
                );
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_submit_while_busy_is_ignored() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::SubmitRegistration { form: form() })
            .when_action(AuthAction::SubmitRegistration { form: form() })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_email_in_use_switches_to_sign_in() {
        let mut state = AuthState::default();
        state.mode = AuthMode::Register;
        state.registration.busy = true;
        state.registration.form = form();

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(AuthAction::CredentialCreationFailed {
                error: AuthError::EmailInUse,
            })
            .then_state(|state| {
                assert_eq!(state.mode, AuthMode::SignIn);
                assert_eq!(state.login.email, "a@b.com");
                assert_eq!(state.login.error, Some(AuthError::EmailInUse));
                assert!(!state.registration.busy);
            })
            .run();
    }

    #[test]
    fn test_reset_keeps_challenge_and_drops_secrets() {
        let mut state = AuthState::default();
        state.registration.phase = Phase::Failed;
        state.registration.form = form();
        state.registration.challenge = Some(ChallengeHandle("recaptcha-container#1".into()));
        state.registration.credential = Some(credential());
        state.registration.error = Some(AuthError::SmsSendFailed);

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(AuthAction::ResetRegistration)
            .then_state(|state| {
                let session = &state.registration;
                assert_eq!(session.phase, Phase::Collecting);
                assert_eq!(session.error, None);
                assert_eq!(session.credential, None);
                assert_eq!(session.form.email, "a@b.com");
                assert!(session.form.password.is_empty());
                assert!(session.challenge.is_some());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_empty_code_is_rejected_locally() {
        let mut state = AuthState::default();
        state.registration.phase = Phase::SmsSent;
        state.registration.confirmation = Some(crate::state::ConfirmationHandle("c1".into()));

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(AuthAction::SubmitVerificationCode { code: "  ".into() })
            .then_state(|state| {
                assert_eq!(
                    state.registration.error,
                    Some(AuthError::Validation(ValidationError::MissingCode))
                );
                assert!(!state.registration.busy);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_sign_in_requires_both_fields() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(AuthState::default())
            .when_action(AuthAction::SignIn {
                email: " ".into(),
                password: "secret1".into(),
            })
            .then_state(|state| {
                assert_eq!(state.login.phase, LoginPhase::Idle);
                assert_eq!(
                    state.login.error,
                    Some(AuthError::Validation(ValidationError::MissingCredentials))
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_show_registration_clears_login_feedback() {
        let mut state = AuthState::default();
        state.login.error = Some(AuthError::WrongPassword);

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(AuthAction::ShowRegistration)
            .then_state(|state| {
                assert_eq!(state.mode, AuthMode::Register);
                assert_eq!(state.login.error, None);
            })
            .run();
    }

    #[tokio::test]
    async fn test_email_registration_then_verify() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = AuthState::default();

        drive(&reducer, &mut state, AuthAction::SubmitRegistration { form: form() }, &env).await;
        assert_eq!(state.registration.phase, Phase::AwaitingEmailConfirmation);
        assert!(!state.registration.busy);

        let trace = drive(&reducer, &mut state, AuthAction::CheckEmailVerified, &env).await;
        assert_eq!(trace, vec![AuthAction::EmailVerificationChecked { verified: false }]);
        assert_eq!(state.registration.error, Some(AuthError::EmailNotVerified));

        env.issuer.verify_email("a@b.com");
        drive(&reducer, &mut state, AuthAction::CheckEmailVerified, &env).await;
        assert_eq!(state.registration.phase, Phase::Resolved);
        assert_eq!(state.registration.role, Some(Role::Customer));
        assert_eq!(state.registration.destination(), Some(Destination::CustomerDashboard));
    }

    #[tokio::test]
    async fn test_phone_registration_initializes_challenge_once() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = AuthState::default();
        let mut phone_form = form();
        phone_form.channel = VerificationChannel::Phone;
        phone_form.account_type = AccountType::Owner;
        phone_form.owner_key = "OWNER-2024".into();

        env.issuer.fail(IssuerCall::LinkPhoneNumber, AuthError::SmsSendFailed);
        drive(&reducer, &mut state, AuthAction::SubmitRegistration { form: phone_form.clone() }, &env)
            .await;
        assert_eq!(state.registration.phase, Phase::Failed);
        assert_eq!(state.registration.credential, None);

        env.issuer.heal(IssuerCall::LinkPhoneNumber);
        drive(&reducer, &mut state, AuthAction::ResetRegistration, &env).await;
        phone_form.email = "c@d.com".into();
        drive(&reducer, &mut state, AuthAction::SubmitRegistration { form: phone_form }, &env).await;
        assert_eq!(state.registration.phase, Phase::SmsSent);
        assert_eq!(env.challenge.initializations(), 1);

        drive(
            &reducer,
            &mut state,
            AuthAction::SubmitVerificationCode {
                code: crate::mocks::VALID_SMS_CODE.into(),
            },
            &env,
        )
        .await;
        assert_eq!(state.registration.role, Some(Role::Owner));
        assert_eq!(state.registration.destination(), Some(Destination::OwnerConsole));
    }
}
