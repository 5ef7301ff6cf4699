//! Auth actions.
//!
//! Every input to the auth reducers: user intents (`SubmitRegistration`,
//! `SignIn`, ...) and the results of effects (`CredentialCreated`,
//! `ProfileWriteFailed`, ...). Secrets are [`Secret`] values and are never
//! serialized.

use crate::error::AuthError;
use crate::profile::ProfileRecord;
use crate::role::Role;
use crate::state::{ChallengeHandle, ConfirmationHandle, Credential, RegistrationForm, Secret, UserId};
use serde::{Deserialize, Serialize};

/// Which sub-reducer handles an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Registration and verification.
    Registration,
    /// Sign-in, resend, reset and sign-out.
    Login,
}

/// Authentication action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuthAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════════════════
    /// Submit the registration form.
    SubmitRegistration {
        /// Form as typed.
        form: RegistrationForm,
    },

    /// Issuer created the credential.
    CredentialCreated {
        /// New credential.
        credential: Credential,
    },

    /// Issuer refused to create the credential.
    CredentialCreationFailed {
        /// Issuer error.
        error: AuthError,
    },

    /// Profile record merged.
    ProfileWritten,

    /// Profile record could not be written.
    ProfileWriteFailed {
        /// Store error.
        error: AuthError,
    },

    /// Challenge verifier initialized.
    ChallengeReady {
        /// Verifier handle.
        handle: ChallengeHandle,
    },

    /// Challenge verifier could not be initialized.
    ChallengeFailed {
        /// Verifier error.
        error: AuthError,
    },

    /// SMS code sent.
    SmsSent {
        /// Pending confirmation.
        confirmation: ConfirmationHandle,
    },

    /// SMS code could not be sent.
    SmsSendFailed {
        /// Issuer error.
        error: AuthError,
    },

    /// Compensating sign-out finished.
    CredentialSignedOut,

    /// Submit the SMS code.
    SubmitVerificationCode {
        /// Code as typed.
        code: String,
    },

    /// Code accepted and `phoneVerified` merged.
    PhoneVerified {
        /// User id reported by the issuer, if any.
        user_id: Option<UserId>,
    },

    /// Code rejected.
    VerificationCodeRejected {
        /// Issuer error.
        error: AuthError,
    },

    /// "Verify now": reload the credential and check its email flag.
    CheckEmailVerified,

    /// Reloaded email flag.
    EmailVerificationChecked {
        /// Whether the link has been followed.
        verified: bool,
    },

    /// Credential could not be reloaded.
    EmailVerificationCheckFailed {
        /// Issuer error.
        error: AuthError,
    },

    /// Send the verification email again.
    ResendVerificationEmail,

    /// Verification email sent again.
    VerificationEmailResent,

    /// Verification email could not be sent again.
    VerificationEmailResendFailed {
        /// Issuer error.
        error: AuthError,
    },

    /// Role read after verification.
    RegistrationRoleResolved {
        /// Resolved role.
        role: Role,
    },

    /// Role could not be read after verification.
    RegistrationRoleFailed {
        /// Store error.
        error: AuthError,
    },

    /// Start over after a failure.
    ResetRegistration,

    /// Switch to the sign-in form, discarding the registration attempt.
    ShowSignIn,

    // ═══════════════════════════════════════════════════════════════════════
    // Sign-in
    // ═══════════════════════════════════════════════════════════════════════
    /// Switch to the registration form.
    ShowRegistration,

    /// Sign in with email and password.
    SignIn {
        /// Email as typed.
        email: String,
        /// Password.
        #[serde(skip_serializing, default)]
        password: Secret,
    },

    /// Issuer accepted the credentials.
    SignedIn {
        /// Signed-in credential.
        credential: Credential,
    },

    /// Issuer rejected the credentials.
    SignInFailed {
        /// Issuer error.
        error: AuthError,
    },

    /// Profile read after sign-in.
    LoginProfileLoaded {
        /// Profile record, if one exists.
        profile: Option<ProfileRecord>,
    },

    /// Profile could not be read after sign-in.
    LoginRoleFailed {
        /// Store error.
        error: AuthError,
    },

    /// Credential signed out after a blocked sign-in.
    LoginSignedOut,

    /// Sign in, resend the verification email, sign out again.
    ResendVerificationFromSignIn {
        /// Email as typed.
        email: String,
        /// Password.
        #[serde(skip_serializing, default)]
        password: Secret,
    },

    /// Verification email resent from the sign-in form.
    SignInVerificationResent,

    /// Verification email could not be resent from the sign-in form.
    SignInVerificationResendFailed {
        /// Underlying error.
        error: AuthError,
    },

    /// Email a password reset link.
    RequestPasswordReset {
        /// Email as typed.
        email: String,
    },

    /// Password reset link sent.
    PasswordResetSent {
        /// Recipient.
        email: String,
    },

    /// Password reset link could not be sent.
    PasswordResetFailed {
        /// Issuer error.
        error: AuthError,
    },

    /// User-initiated sign-out.
    SignOut,

    /// Sign-out finished.
    SignedOut,
}

impl AuthAction {
    /// Sub-reducer responsible for this action.
    #[must_use]
    pub const fn flow(&self) -> Flow {
        match self {
            Self::SubmitRegistration { .. }
            | Self::CredentialCreated { .. }
            | Self::CredentialCreationFailed { .. }
            | Self::ProfileWritten
            | Self::ProfileWriteFailed { .. }
            | Self::ChallengeReady { .. }
            | Self::ChallengeFailed { .. }
            | Self::SmsSent { .. }
            | Self::SmsSendFailed { .. }
            | Self::CredentialSignedOut
            | Self::SubmitVerificationCode { .. }
            | Self::PhoneVerified { .. }
            | Self::VerificationCodeRejected { .. }
            | Self::CheckEmailVerified
            | Self::EmailVerificationChecked { .. }
            | Self::EmailVerificationCheckFailed { .. }
            | Self::ResendVerificationEmail
            | Self::VerificationEmailResent
            | Self::VerificationEmailResendFailed { .. }
            | Self::RegistrationRoleResolved { .. }
            | Self::RegistrationRoleFailed { .. }
            | Self::ResetRegistration
            | Self::ShowSignIn => Flow::Registration,
            Self::ShowRegistration
            | Self::SignIn { .. }
            | Self::SignedIn { .. }
            | Self::SignInFailed { .. }
            | Self::LoginProfileLoaded { .. }
            | Self::LoginRoleFailed { .. }
            | Self::LoginSignedOut
            | Self::ResendVerificationFromSignIn { .. }
            | Self::SignInVerificationResent
            | Self::SignInVerificationResendFailed { .. }
            | Self::RequestPasswordReset { .. }
            | Self::PasswordResetSent { .. }
            | Self::PasswordResetFailed { .. }
            | Self::SignOut
            | Self::SignedOut => Flow::Login,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_password_is_not_serialized() {
        let action = AuthAction::SignIn {
            email: "a@b.com".into(),
            password: "secret1".into(),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(!json.contains("secret1"));
        assert!(!format!("{action:?}").contains("secret1"));
    }

    #[test]
    fn test_flow_routing() {
        assert_eq!(AuthAction::ShowSignIn.flow(), Flow::Registration);
        assert_eq!(AuthAction::ShowRegistration.flow(), Flow::Login);
        assert_eq!(AuthAction::ProfileWritten.flow(), Flow::Registration);
        assert_eq!(AuthAction::SignOut.flow(), Flow::Login);
    }
}
