//! Registration and verification reducer.
//!
//! # Flow
//!
//! 1. Validate the form locally (no provider call on failure)
//! 2. Create the credential
//! 3. Set the display name (best effort) and merge-write the profile record
//! 4. Branch on the channel:
//!    - email: send the verification link, wait for "verify now"
//!    - phone: initialize the challenge verifier once, send the SMS code,
//!      confirm it and merge `phoneVerified`
//! 5. Resolve the role from the profile record
//!
//! A failed profile write, challenge initialization or SMS send signs the new
//! credential out again before the session reaches [`Phase::Failed`].
//!
//! Actions that arrive while a call is in flight, or in a phase that does not
//! accept them, are logged and dropped without touching state.

use crate::actions::AuthAction;
use crate::environment::AuthEnvironment;
use crate::error::{AuthError, ValidationError};
use crate::profile::ProfilePatch;
use crate::providers::{ChallengeVerifier, CredentialIssuer, DocumentStore};
use crate::role::{resolve_role, Destination};
use crate::state::{
    AuthMode, AuthState, ChallengeHandle, Credential, Notice, Phase, RegistrationSession, UserId,
    VerificationChannel,
};
use crate::validation::validate_registration;
use lavado_core::effect::Effect;
use lavado_core::reducer::Reducer;
use lavado_core::{smallvec, SmallVec};

type Effects = SmallVec<[Effect<AuthAction>; 4]>;

/// Registration and verification reducer.
#[derive(Debug, Clone)]
pub struct RegistrationReducer<I, D, V> {
    _phantom: std::marker::PhantomData<(I, D, V)>,
}

impl<I, D, V> RegistrationReducer<I, D, V> {
    /// Create a new registration reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<I, D, V> Default for RegistrationReducer<I, D, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn ignored(action: &'static str, session: &RegistrationSession) -> Effects {
    tracing::warn!(
        action,
        phase = ?session.phase,
        busy = session.busy,
        "Ignoring registration action"
    );
    smallvec![Effect::None]
}

/// Sign the credential out, logging failures, then feed back `then`.
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

fn link_phone<I>(issuer: &I, credential: Credential, phone: String, challenge: ChallengeHandle) -> Effect<AuthAction>
where
    I: CredentialIssuer + Clone + 'static,
{
    let issuer = issuer.clone();
    Effect::future(async move {
        match issuer.link_phone_number(&credential, &phone, &challenge).await {
            Ok(confirmation) => Some(AuthAction::SmsSent { confirmation }),
            Err(error) => {
                tracing::warn!(%error, "SMS send failed");
                Some(AuthAction::SmsSendFailed {
                    error: AuthError::SmsSendFailed,
                })
            },
        }
    })
}

fn resolve<D>(documents: &D, collection: String, user_id: Option<UserId>) -> Effect<AuthAction>
where
    D: DocumentStore + Clone + 'static,
{
    let documents = documents.clone();
    Effect::future(async move {
        match resolve_role(&documents, &collection, user_id.as_ref()).await {
            Ok(role) => Some(AuthAction::RegistrationRoleResolved { role }),
            Err(error) => Some(AuthAction::RegistrationRoleFailed { error }),
        }
    })
}

impl<I, D, V> Reducer for RegistrationReducer<I, D, V>
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
        let session = &mut state.registration;

        match action {
            // ═══════════════════════════════════════════════════════════════
            // SubmitRegistration: validate, then create the credential
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SubmitRegistration { form } => {
                if session.phase != Phase::Collecting || session.busy {
                    return ignored("SubmitRegistration", session);
                }

                session.notice = None;
                let validated = validate_registration(&form, &env.config);
                session.form = form;

                let validated = match validated {
                    Ok(validated) => validated,
                    Err(error) => {
                        tracing::debug!(%error, "Registration form rejected");
                        session.error = Some(AuthError::Validation(error));
                        return smallvec![Effect::None];
                    },
                };

                session.error = None;
                session.busy = true;
                session.profile = Some(validated.profile);

                let issuer = env.issuer.clone();
                let email = validated.email;
                let password = validated.password;
                smallvec![Effect::future(async move {
                    match issuer.create_credential(&email, &password).await {
                        Ok(credential) => Some(AuthAction::CredentialCreated { credential }),
                        Err(error) => Some(AuthAction::CredentialCreationFailed { error }),
                    }
                })]
            },

            AuthAction::CredentialCreationFailed { error } => {
                if session.phase != Phase::Collecting || !session.busy {
                    return ignored("CredentialCreationFailed", session);
                }
                tracing::debug!(%error, "Credential creation failed");
                session.busy = false;
                session.profile = None;

                if error == AuthError::EmailInUse {
                    state.mode = AuthMode::SignIn;
                    state.login.email = session.form.email.trim().to_lowercase();
                    state.login.error = Some(error.clone());
                }
                session.error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // CredentialCreated: display name, then merge-write the profile
            // ═══════════════════════════════════════════════════════════════
            AuthAction::CredentialCreated { credential } => {
                if session.phase != Phase::Collecting || !session.busy {
                    if session
                        .credential
                        .as_ref()
                        .is_some_and(|held| held.user_id == credential.user_id)
                    {
                        return ignored("CredentialCreated", session);
                    }
                    // Nobody is waiting for this credential; it has no profile.
                    tracing::warn!(
                        user_id = %credential.user_id,
                        phase = ?session.phase,
                        "Credential created after registration was left, signing out"
                    );
                    return smallvec![sign_out(&env.issuer, Some(credential), None)];
                }
                let Some(profile) = session.profile.clone() else {
                    tracing::error!(user_id = %credential.user_id, "Credential created without validated profile");
                    session.phase = Phase::Failed;
                    session.error = Some(AuthError::Internal("missing profile".to_string()));
                    session.credential = Some(credential.clone());
                    return smallvec![sign_out(&env.issuer, Some(credential), Some(AuthAction::CredentialSignedOut))];
                };

                tracing::debug!(user_id = %credential.user_id, "Credential created");
                session.phase = Phase::CredentialCreated;
                session.credential = Some(credential.clone());

                let issuer = env.issuer.clone();
                let documents = env.documents.clone();
                let collection = env.config.profiles_collection.clone();
                let patch = profile.with_created_at(env.clock.now());
                smallvec![Effect::future(async move {
                    let display_name = patch.display_name();
                    if let Err(error) = issuer.update_display_name(&credential, &display_name).await {
                        tracing::warn!(%error, "Display name not updated");
                    }

                    let fields = match patch.to_document() {
                        Ok(fields) => fields,
                        Err(error) => return Some(AuthAction::ProfileWriteFailed { error }),
                    };
                    match documents
                        .upsert_merge(&collection, credential.user_id.as_str(), fields)
                        .await
                    {
                        Ok(()) => Some(AuthAction::ProfileWritten),
                        Err(error) => Some(AuthAction::ProfileWriteFailed { error }),
                    }
                })]
            },

            AuthAction::ProfileWriteFailed { error } => {
                if session.phase != Phase::CredentialCreated {
                    return ignored("ProfileWriteFailed", session);
                }
                tracing::error!(
                    %error,
                    user_id = ?session.credential.as_ref().map(|c| c.user_id.to_string()),
                    "Profile write failed after credential creation, signing out"
                );
                session.phase = Phase::Failed;
                session.error = Some(AuthError::ProfileNotSaved(Box::new(error)));
                smallvec![sign_out(
                    &env.issuer,
                    session.credential.clone(),
                    Some(AuthAction::CredentialSignedOut)
                )]
            },

            // ═══════════════════════════════════════════════════════════════
            // ProfileWritten: branch on the verification channel
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ProfileWritten => {
                if session.phase != Phase::CredentialCreated {
                    return ignored("ProfileWritten", session);
                }
                let Some(credential) = session.credential.clone() else {
                    return ignored("ProfileWritten", session);
                };

                match session.form.channel {
                    VerificationChannel::Email => {
                        session.phase = Phase::AwaitingEmailConfirmation;
                        session.busy = false;
                        session.notice = Some(Notice::VerificationEmailSent {
                            email: credential.email.clone(),
                        });

                        let issuer = env.issuer.clone();
                        smallvec![Effect::future(async move {
                            if let Err(error) = issuer.send_email_verification(&credential).await {
                                tracing::warn!(%error, "Verification email not sent");
                            }
                            None
                        })]
                    },
                    VerificationChannel::Phone => {
                        let Some(phone) = session.profile.as_ref().and_then(|p| p.phone.clone()) else {
                            tracing::error!("Phone channel without normalized phone");
                            session.phase = Phase::Failed;
                            session.error = Some(AuthError::Validation(ValidationError::InvalidPhone));
                            return smallvec![sign_out(
                                &env.issuer,
                                Some(credential),
                                Some(AuthAction::CredentialSignedOut)
                            )];
                        };

                        match session.challenge.clone() {
                            Some(handle) => {
                                smallvec![link_phone(&env.issuer, credential, phone, handle)]
                            },
                            None => {
                                let verifier = env.challenge.clone();
                                let mount_point = env.config.challenge_mount_point.clone();
                                smallvec![Effect::future(async move {
                                    match verifier.initialize(&mount_point).await {
                                        Ok(handle) => Some(AuthAction::ChallengeReady { handle }),
                                        Err(error) => Some(AuthAction::ChallengeFailed { error }),
                                    }
                                })]
                            },
                        }
                    },
                }
            },

            AuthAction::ChallengeReady { handle } => {
                if session.phase != Phase::CredentialCreated || session.challenge.is_some() {
                    return ignored("ChallengeReady", session);
                }
                let (Some(credential), Some(phone)) = (
                    session.credential.clone(),
                    session.profile.as_ref().and_then(|p| p.phone.clone()),
                ) else {
                    return ignored("ChallengeReady", session);
                };

                session.challenge = Some(handle.clone());
                smallvec![link_phone(&env.issuer, credential, phone, handle)]
            },

            AuthAction::ChallengeFailed { error } => {
                if session.phase != Phase::CredentialCreated {
                    return ignored("ChallengeFailed", session);
                }
                tracing::error!(%error, "Challenge verifier failed, signing out");
                session.phase = Phase::Failed;
                session.error = Some(AuthError::ChallengeUnavailable);
                smallvec![sign_out(
                    &env.issuer,
                    session.credential.clone(),
                    Some(AuthAction::CredentialSignedOut)
                )]
            },

            AuthAction::SmsSent { confirmation } => {
                if session.phase != Phase::CredentialCreated {
                    return ignored("SmsSent", session);
                }
                session.phase = Phase::SmsSent;
                session.busy = false;
                session.confirmation = Some(confirmation);
                session.notice = Some(Notice::SmsCodeSent);
                smallvec![Effect::None]
            },

            AuthAction::SmsSendFailed { error } => {
                if session.phase != Phase::CredentialCreated {
                    return ignored("SmsSendFailed", session);
                }
                tracing::error!(%error, "SMS not sent, signing out");
                session.phase = Phase::SmsFailed;
                session.error = Some(error);
                smallvec![sign_out(
                    &env.issuer,
                    session.credential.clone(),
                    Some(AuthAction::CredentialSignedOut)
                )]
            },

            AuthAction::CredentialSignedOut => {
                if !matches!(session.phase, Phase::Failed | Phase::SmsFailed) {
                    return ignored("CredentialSignedOut", session);
                }
                session.phase = Phase::Failed;
                session.busy = false;
                session.credential = None;
                session.confirmation = None;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Phone code
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SubmitVerificationCode { code } => {
                if session.phase != Phase::SmsSent || session.busy {
                    return ignored("SubmitVerificationCode", session);
                }
                let Some(confirmation) = session.confirmation.clone() else {
                    return ignored("SubmitVerificationCode", session);
                };
                let code = code.trim().to_string();
                if code.is_empty() {
                    session.error = Some(AuthError::Validation(ValidationError::MissingCode));
                    return smallvec![Effect::None];
                }

                session.busy = true;
                session.error = None;
                session.notice = None;

                let issuer = env.issuer.clone();
                let documents = env.documents.clone();
                let collection = env.config.profiles_collection.clone();
                let fallback = session.credential.as_ref().map(|c| c.user_id.clone());
                smallvec![Effect::future(async move {
                    let confirmed = match issuer.confirm_phone_code(&confirmation, &code).await {
                        Ok(confirmed) => confirmed,
                        Err(error) => {
                            tracing::warn!(%error, "Verification code rejected");
                            return Some(AuthAction::VerificationCodeRejected {
                                error: AuthError::InvalidOrExpiredCode,
                            });
                        },
                    };

                    let user_id = confirmed.or(fallback);
                    if let Some(user_id) = &user_id {
                        let merged = match ProfilePatch::phone_verified().to_document() {
                            Ok(fields) => documents.upsert_merge(&collection, user_id.as_str(), fields).await,
                            Err(error) => Err(error),
                        };
                        if let Err(error) = merged {
                            tracing::warn!(%error, %user_id, "phoneVerified not recorded");
                        }
                    }
                    Some(AuthAction::PhoneVerified { user_id })
                })]
            },

            AuthAction::VerificationCodeRejected { error } => {
                if session.phase != Phase::SmsSent || !session.busy {
                    return ignored("VerificationCodeRejected", session);
                }
                session.busy = false;
                session.error = Some(error);
                smallvec![Effect::None]
            },

            AuthAction::PhoneVerified { user_id } => {
                if session.phase != Phase::SmsSent || !session.busy {
                    return ignored("PhoneVerified", session);
                }
                session.phase = Phase::Resolved;
                session.confirmation = None;
                let user_id = user_id.or_else(|| session.credential.as_ref().map(|c| c.user_id.clone()));
                smallvec![resolve(&env.documents, env.config.profiles_collection.clone(), user_id)]
            },

            // ═══════════════════════════════════════════════════════════════
            // Email link
            // ═══════════════════════════════════════════════════════════════
            AuthAction::CheckEmailVerified => {
                if session.phase != Phase::AwaitingEmailConfirmation || session.busy {
                    return ignored("CheckEmailVerified", session);
                }
                let Some(credential) = session.credential.clone() else {
                    return ignored("CheckEmailVerified", session);
                };
                session.busy = true;
                session.error = None;

                let issuer = env.issuer.clone();
                smallvec![Effect::future(async move {
                    match issuer.refresh_credential(&credential).await {
                        Ok(verified) => Some(AuthAction::EmailVerificationChecked { verified }),
                        Err(error) => {
                            tracing::warn!(%error, "Credential refresh failed");
                            Some(AuthAction::EmailVerificationCheckFailed {
                                error: AuthError::VerificationStatusUnavailable,
                            })
                        },
                    }
                })]
            },

            AuthAction::EmailVerificationChecked { verified } => {
                if session.phase != Phase::AwaitingEmailConfirmation || !session.busy {
                    return ignored("EmailVerificationChecked", session);
                }
                if !verified {
                    session.busy = false;
                    session.error = Some(AuthError::EmailNotVerified);
                    return smallvec![Effect::None];
                }

                session.phase = Phase::Resolved;
                session.notice = None;
                let user_id = session.credential.as_ref().map(|c| c.user_id.clone());
                smallvec![resolve(&env.documents, env.config.profiles_collection.clone(), user_id)]
            },

            AuthAction::EmailVerificationCheckFailed { error } => {
                if session.phase != Phase::AwaitingEmailConfirmation || !session.busy {
                    return ignored("EmailVerificationCheckFailed", session);
                }
                session.busy = false;
                session.error = Some(error);
                smallvec![Effect::None]
            },

            AuthAction::ResendVerificationEmail => {
                if session.phase != Phase::AwaitingEmailConfirmation || session.busy {
                    return ignored("ResendVerificationEmail", session);
                }
                let Some(credential) = session.credential.clone() else {
                    return ignored("ResendVerificationEmail", session);
                };
                session.busy = true;
                session.error = None;

                let issuer = env.issuer.clone();
                smallvec![Effect::future(async move {
                    match issuer.send_email_verification(&credential).await {
                        Ok(()) => Some(AuthAction::VerificationEmailResent),
                        Err(error) => {
                            tracing::warn!(%error, "Verification email resend failed");
                            Some(AuthAction::VerificationEmailResendFailed {
                                error: AuthError::EmailDeliveryFailed,
                            })
                        },
                    }
                })]
            },

            AuthAction::VerificationEmailResent => {
                if session.phase != Phase::AwaitingEmailConfirmation || !session.busy {
                    return ignored("VerificationEmailResent", session);
                }
                session.busy = false;
                session.notice = Some(Notice::VerificationEmailResent);
                smallvec![Effect::None]
            },

            AuthAction::VerificationEmailResendFailed { error } => {
                if session.phase != Phase::AwaitingEmailConfirmation || !session.busy {
                    return ignored("VerificationEmailResendFailed", session);
                }
                session.busy = false;
                session.error = Some(error);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Role resolution
            // ═══════════════════════════════════════════════════════════════
            AuthAction::RegistrationRoleResolved { role } => {
                if session.phase != Phase::Resolved || !session.busy {
                    return ignored("RegistrationRoleResolved", session);
                }
                tracing::info!(%role, destination = %Destination::for_role(role), "Registration complete");
                session.busy = false;
                session.role = Some(role);
                session.error = None;
                smallvec![Effect::None]
            },

            AuthAction::RegistrationRoleFailed { error } => {
                if session.phase != Phase::Resolved || !session.busy {
                    return ignored("RegistrationRoleFailed", session);
                }
                tracing::warn!(%error, "Role not resolved after verification");
                session.phase = Phase::Failed;
                session.busy = false;
                session.error = Some(AuthError::SessionLost);

                state.mode = AuthMode::SignIn;
                state.login.email = session.form.email.trim().to_lowercase();
                state.login.error = Some(AuthError::SessionLost);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Reset / leave
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ResetRegistration => {
                if session.phase != Phase::Failed || session.busy {
                    return ignored("ResetRegistration", session);
                }
                *session = RegistrationSession {
                    form: std::mem::take(&mut session.form).without_secrets(),
                    challenge: session.challenge.take(),
                    ..RegistrationSession::default()
                };
                smallvec![Effect::None]
            },

            AuthAction::ShowSignIn => {
                let previous = std::mem::take(session);
                session.challenge = previous.challenge;
                state.mode = AuthMode::SignIn;

                match previous.credential {
                    Some(credential) if previous.phase != Phase::Resolved => {
                        tracing::debug!(user_id = %credential.user_id, "Leaving unfinished registration");
                        smallvec![sign_out(&env.issuer, Some(credential), None)]
                    },
                    _ => smallvec![Effect::None],
                }
            },

            _ => smallvec![Effect::None],
        }
    }
}
