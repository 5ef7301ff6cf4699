//! Sign-in reducer.
//!
//! Signs in with email and password, reads the profile record and routes by
//! role. A disabled profile or an unreadable record signs the credential out
//! again. Also owns the sign-in form's side requests: resending the
//! verification email and password reset.

use crate::actions::AuthAction;
use crate::environment::AuthEnvironment;
use crate::error::{AuthError, ValidationError};
use crate::providers::{ChallengeVerifier, CredentialIssuer, DocumentStore};
use crate::role::{load_profile, Destination};
use crate::state::{AuthMode, AuthState, Credential, LoginPhase, LoginSession, Notice};
use crate::validation::sanitize_email;
use lavado_core::effect::Effect;
use lavado_core::reducer::Reducer;
use lavado_core::{smallvec, SmallVec};

type Effects = SmallVec<[Effect<AuthAction>; 4]>;

/// Sign-in reducer.
#[derive(Debug, Clone)]
pub struct LoginReducer<I, D, V> {
    _phantom: std::marker::PhantomData<(I, D, V)>,
}

impl<I, D, V> LoginReducer<I, D, V> {
    /// Create a new sign-in reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<I, D, V> Default for LoginReducer<I, D, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn ignored(action: &'static str, session: &LoginSession) -> Effects {
    tracing::warn!(
        action,
        phase = ?session.phase,
        busy = session.busy,
        "Ignoring sign-in action"
    );
    smallvec![Effect::None]
}

fn sign_out<I>(issuer: &I, credential: Option<Credential>, then: Option<AuthAction>) -> Effect<AuthAction>
where
    I: CredentialIssuer + Clone + 'static,
{
    let issuer = issuer.clone();
    Effect::future(async move {
        if let Some(credential) = credential {
            if let Err(error) = issuer.sign_out(&credential).await {
                tracing::warn!(%error, user_id = %credential.user_id, "Sign-out failed");
            }
        }
        then
    })
}

impl<I, D, V> Reducer for LoginReducer<I, D, V>
where
    I: CredentialIssuer + Clone + 'static,
    D: DocumentStore + Clone + 'static,
    V: ChallengeVerifier + Clone + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment<I, D, V>;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        let session = &mut state.login;

        match action {
            AuthAction::ShowRegistration => {
                state.mode = AuthMode::Register;
                session.error = None;
                session.notice = None;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // SignIn: credentials, then the profile record
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SignIn { email, password } => {
                if session.phase != LoginPhase::Idle || session.busy {
                    return ignored("SignIn", session);
                }
                let email = sanitize_email(&email);
                session.email.clone_from(&email);
                session.notice = None;
                if email.is_empty() || password.is_empty() {
                    session.error = Some(AuthError::Validation(ValidationError::MissingCredentials));
                    return smallvec![Effect::None];
                }

                session.phase = LoginPhase::SigningIn;
                session.busy = true;
                session.error = None;

                let issuer = env.issuer.clone();
                smallvec![Effect::future(async move {
                    match issuer.sign_in(&email, password.expose()).await {
                        Ok(credential) => Some(AuthAction::SignedIn { credential }),
                        Err(error) => Some(AuthAction::SignInFailed { error }),
                    }
                })]
            },

            AuthAction::SignInFailed { error } => {
                if session.phase != LoginPhase::SigningIn {
                    return ignored("SignInFailed", session);
                }
                tracing::debug!(%error, "Sign-in rejected");
                session.phase = LoginPhase::Idle;
                session.busy = false;
                session.error = Some(error);
                smallvec![Effect::None]
            },

            AuthAction::SignedIn { credential } => {
                if session.phase != LoginPhase::SigningIn {
                    return ignored("SignedIn", session);
                }
                session.phase = LoginPhase::ResolvingRole;
                session.credential = Some(credential.clone());

                let documents = env.documents.clone();
                let collection = env.config.profiles_collection.clone();
                smallvec![Effect::future(async move {
                    match load_profile(&documents, &collection, &credential.user_id).await {
                        Ok(profile) => Some(AuthAction::LoginProfileLoaded { profile }),
                        Err(error) => Some(AuthAction::LoginRoleFailed { error }),
                    }
                })]
            },

            AuthAction::LoginProfileLoaded { profile } => {
                if session.phase != LoginPhase::ResolvingRole {
                    return ignored("LoginProfileLoaded", session);
                }

                if profile.as_ref().is_some_and(|p| p.disabled) {
                    tracing::info!(email = %session.email, "Disabled account blocked at sign-in");
                    session.error = Some(AuthError::UserDisabled);
                    return smallvec![sign_out(
                        &env.issuer,
                        session.credential.clone(),
                        Some(AuthAction::LoginSignedOut)
                    )];
                }

                let role = profile.map(|p| p.role_or_default()).unwrap_or_default();
                tracing::info!(%role, destination = %Destination::for_role(role), "Signed in");
                session.phase = LoginPhase::SignedIn;
                session.busy = false;
                session.role = Some(role);
                smallvec![Effect::None]
            },

            AuthAction::LoginRoleFailed { error } => {
                if session.phase != LoginPhase::ResolvingRole {
                    return ignored("LoginRoleFailed", session);
                }
                tracing::warn!(%error, "Profile not readable after sign-in, signing out");
                session.error = Some(error);
                smallvec![sign_out(
                    &env.issuer,
                    session.credential.clone(),
                    Some(AuthAction::LoginSignedOut)
                )]
            },

            AuthAction::LoginSignedOut => {
                if session.phase != LoginPhase::ResolvingRole {
                    return ignored("LoginSignedOut", session);
                }
                session.phase = LoginPhase::Idle;
                session.busy = false;
                session.credential = None;
                session.role = None;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Side requests from the sign-in form
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ResendVerificationFromSignIn { email, password } => {
                if session.phase != LoginPhase::Idle || session.busy {
                    return ignored("ResendVerificationFromSignIn", session);
                }
                let email = sanitize_email(&email);
                session.email.clone_from(&email);
                session.notice = None;
                if email.is_empty() || password.is_empty() {
                    session.error = Some(AuthError::Validation(ValidationError::MissingCredentials));
                    return smallvec![Effect::None];
                }

                session.busy = true;
                session.error = None;

                let issuer = env.issuer.clone();
                smallvec![Effect::future(async move {
                    let credential = match issuer.sign_in(&email, password.expose()).await {
                        Ok(credential) => credential,
                        Err(error) => {
                            tracing::debug!(%error, "Sign-in for resend rejected");
                            return Some(AuthAction::SignInVerificationResendFailed { error });
                        },
                    };

                    let sent = issuer.send_email_verification(&credential).await;
                    if let Err(error) = issuer.sign_out(&credential).await {
                        tracing::warn!(%error, "Sign-out after resend failed");
                    }

                    match sent {
                        Ok(()) => Some(AuthAction::SignInVerificationResent),
                        Err(error) => {
                            tracing::warn!(%error, "Verification email resend failed");
                            Some(AuthAction::SignInVerificationResendFailed {
                                error: AuthError::EmailDeliveryFailed,
                            })
                        },
                    }
                })]
            },

            AuthAction::SignInVerificationResent => {
                if session.phase != LoginPhase::Idle || !session.busy {
                    return ignored("SignInVerificationResent", session);
                }
                session.busy = false;
                session.notice = Some(Notice::VerificationEmailResent);
                smallvec![Effect::None]
            },

            AuthAction::SignInVerificationResendFailed { error } => {
                if session.phase != LoginPhase::Idle || !session.busy {
                    return ignored("SignInVerificationResendFailed", session);
                }
                session.busy = false;
                session.error = Some(error);
                smallvec![Effect::None]
            },

            AuthAction::RequestPasswordReset { email } => {
                if session.phase != LoginPhase::Idle || session.busy {
                    return ignored("RequestPasswordReset", session);
                }
                let email = sanitize_email(&email);
                session.email.clone_from(&email);
                session.notice = None;
                if email.is_empty() || !email.contains('@') {
                    session.error = Some(AuthError::Validation(ValidationError::InvalidEmail));
                    return smallvec![Effect::None];
                }

                session.busy = true;
                session.error = None;

                let issuer = env.issuer.clone();
                smallvec![Effect::future(async move {
                    match issuer.request_password_reset(&email).await {
                        Ok(()) => Some(AuthAction::PasswordResetSent { email }),
                        Err(error) => Some(AuthAction::PasswordResetFailed { error }),
                    }
                })]
            },

            AuthAction::PasswordResetSent { email } => {
                if !session.busy {
                    return ignored("PasswordResetSent", session);
                }
                session.busy = false;
                session.notice = Some(Notice::PasswordResetSent { email });
                smallvec![Effect::None]
            },

            AuthAction::PasswordResetFailed { error } => {
                if !session.busy {
                    return ignored("PasswordResetFailed", session);
                }
                tracing::debug!(%error, "Password reset not sent");
                session.busy = false;
                session.error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // SignOut
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SignOut => {
                let previous = std::mem::take(session);
                session.email = previous.email;
                state.mode = AuthMode::SignIn;
                smallvec![sign_out(&env.issuer, previous.credential, Some(AuthAction::SignedOut))]
            },

            AuthAction::SignedOut => {
                tracing::debug!("Signed out");
                smallvec![Effect::None]
            },

            _ => smallvec![Effect::None],
        }
    }
}
