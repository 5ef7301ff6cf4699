//! Auth state types.
//!
//! Everything here is a plain serializable value. Secrets are wrapped in
//! [`Secret`], which never serializes and prints redacted.

use crate::error::AuthError;
use crate::profile::ProfilePatch;
use crate::role::{Destination, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential identifier issued by the credential issuer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A string that must not leak through logs or serialization.
///
/// Fields holding a `Secret` are marked `skip_serializing`; deserializing
/// accepts a plain string.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Borrow the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Signed-in credential as reported by the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Issuer-assigned id, also the profile record key.
    pub user_id: UserId,
    /// Sanitized email.
    pub email: String,
    /// Linked phone in E.164, once verified.
    pub phone: Option<String>,
    /// Email link followed.
    pub email_verified: bool,
    /// Phone code confirmed.
    pub phone_verified: bool,
    /// Display name, if set.
    pub display_name: Option<String>,
}

/// Opaque handle to an initialized challenge verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeHandle(pub String);

/// Opaque handle to a pending phone-code confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationHandle(pub String);

/// Account type chosen on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Regular customer.
    #[default]
    Customer,
    /// Car wash owner; requires the owner key.
    Owner,
}

impl AccountType {
    /// Role written to the profile for this account type.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::Customer => Role::Customer,
            Self::Owner => Role::Owner,
        }
    }
}

/// How the new account proves ownership of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationChannel {
    /// Verification link by email.
    #[default]
    Email,
    /// Code by SMS.
    Phone,
}

/// Registration form as typed.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// ZIP code.
    pub zip_code: String,
    /// Phone as typed; normalized on submit.
    pub phone: String,
    /// Email as typed; sanitized on submit.
    pub email: String,
    /// Password.
    #[serde(skip_serializing)]
    pub password: Secret,
    /// Password confirmation.
    #[serde(skip_serializing)]
    pub confirm_password: Secret,
    /// Verification channel.
    pub channel: VerificationChannel,
    /// Account type.
    pub account_type: AccountType,
    /// Owner key, for owner accounts.
    #[serde(skip_serializing)]
    pub owner_key: Secret,
}

impl RegistrationForm {
    /// Drop every secret, keeping what the user typed elsewhere.
    #[must_use]
    pub fn without_secrets(mut self) -> Self {
        self.password = Secret::default();
        self.confirm_password = Secret::default();
        self.owner_key = Secret::default();
        self
    }
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("city", &self.city)
            .field("state", &self.state)
            .field("email", &self.email)
            .field("channel", &self.channel)
            .field("account_type", &self.account_type)
            .finish_non_exhaustive()
    }
}

/// Registration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Form being filled in.
    #[default]
    Collecting,
    /// Credential exists; profile write and channel setup in flight.
    CredentialCreated,
    /// Waiting for the email link to be followed.
    AwaitingEmailConfirmation,
    /// SMS sent; waiting for the code.
    SmsSent,
    /// SMS could not be sent; credential being signed out.
    SmsFailed,
    /// Verified; role being resolved or resolved.
    Resolved,
    /// Unrecoverable for this attempt; reset to try again.
    Failed,
}

/// Non-error feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// Verification email sent after registration.
    VerificationEmailSent {
        /// Recipient
        email: String,
    },
    /// SMS with the code sent.
    SmsCodeSent,
    /// Verification email sent again on request.
    VerificationEmailResent,
    /// Password reset email sent.
    PasswordResetSent {
        /// Recipient
        email: String,
    },
}

impl Notice {
    /// Message shown to the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::VerificationEmailSent { email } => format!(
                "Te enviamos un correo de verificación a {email}. Abre el enlace y luego presiona \"Verificar ahora\"."
            ),
            Self::SmsCodeSent => {
                "Te enviamos un SMS con el código. Ingresa el código para verificar tu teléfono."
                    .to_string()
            },
            Self::VerificationEmailResent => {
                "Correo de verificación reenviado. Revisa tu bandeja de entrada o spam.".to_string()
            },
            Self::PasswordResetSent { email } => {
                format!("Te enviamos un enlace para restablecer tu contraseña a {email}.")
            },
        }
    }
}

/// One registration attempt.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistrationSession {
    /// Last submitted (or reset) form.
    pub form: RegistrationForm,
    /// Current phase.
    pub phase: Phase,
    /// A backend call is in flight; new submissions are ignored.
    pub busy: bool,
    /// Current error.
    pub error: Option<AuthError>,
    /// Current notice.
    pub notice: Option<Notice>,
    /// Profile fields validated on submit, written once the credential exists.
    pub profile: Option<ProfilePatch>,
    /// Credential, once created.
    pub credential: Option<Credential>,
    /// Challenge verifier, initialized at most once.
    pub challenge: Option<ChallengeHandle>,
    /// Pending phone confirmation.
    pub confirmation: Option<ConfirmationHandle>,
    /// Role resolved after verification.
    pub role: Option<Role>,
}

impl RegistrationSession {
    /// Where to go once registration has finished.
    #[must_use]
    pub fn destination(&self) -> Option<Destination> {
        match (self.phase, self.role) {
            (Phase::Resolved, Some(role)) => Some(Destination::for_role(role)),
            _ => None,
        }
    }
}

/// Sign-in phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginPhase {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Waiting on the issuer.
    SigningIn,
    /// Reading the profile.
    ResolvingRole,
    /// Signed in with a role.
    SignedIn,
}

/// Sign-in session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoginSession {
    /// Sanitized email of the last attempt.
    pub email: String,
    /// Current phase.
    pub phase: LoginPhase,
    /// A backend call is in flight.
    pub busy: bool,
    /// Signed-in credential.
    pub credential: Option<Credential>,
    /// Resolved role.
    pub role: Option<Role>,
    /// Current error.
    pub error: Option<AuthError>,
    /// Current notice.
    pub notice: Option<Notice>,
}

impl LoginSession {
    /// Where to go once signed in.
    #[must_use]
    pub fn destination(&self) -> Option<Destination> {
        match (self.phase, self.role) {
            (LoginPhase::SignedIn, Some(role)) => Some(Destination::for_role(role)),
            _ => None,
        }
    }
}

/// Which form is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// Sign-in form.
    #[default]
    SignIn,
    /// Registration form.
    Register,
}

/// Auth feature state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthState {
    /// Visible form.
    pub mode: AuthMode,
    /// Registration attempt.
    pub registration: RegistrationSession,
    /// Sign-in session.
    pub login: LoginSession,
}
