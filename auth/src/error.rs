//! Error types for registration, verification and sign-in.
//!
//! Errors travel inside actions, so every type here is `Clone + PartialEq` and
//! serializable. `Display` is the developer-facing message; the text shown to
//! the person at the keyboard comes from [`AuthError::user_message`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Local form validation failures.
///
/// These are raised before any provider is called.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    /// A name or address field is blank.
    #[error("Missing name or address field")]
    MissingAddressFields,

    /// Email is blank or has no `@`.
    #[error("Invalid email address")]
    InvalidEmail,

    /// Password and confirmation differ.
    #[error("Password confirmation does not match")]
    PasswordMismatch,

    /// Password shorter than the configured minimum.
    #[error("Password shorter than {min} characters")]
    PasswordTooShort {
        /// Configured minimum length
        min: usize,
    },

    /// Phone is not the country code followed by ten digits.
    #[error("Phone number is not a valid E.164 number")]
    InvalidPhone,

    /// Owner account requested without a key.
    #[error("Owner key missing")]
    MissingOwnerKey,

    /// Owner key does not match the configured secret.
    #[error("Owner key rejected")]
    InvalidOwnerKey,

    /// Verification code is blank.
    #[error("Verification code missing")]
    MissingCode,

    /// Sign-in attempted without email or password.
    #[error("Email and password required")]
    MissingCredentials,
}

impl ValidationError {
    /// Inline message for the form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingAddressFields => "Completa todos los campos de dirección".to_string(),
            Self::InvalidEmail => "Correo electrónico inválido".to_string(),
            Self::PasswordMismatch => "Las contraseñas no coinciden".to_string(),
            Self::PasswordTooShort { min } => {
                format!("La contraseña debe tener al menos {min} caracteres")
            },
            Self::InvalidPhone => {
                "Número de teléfono inválido. Formato: +1 (XXX) XXX-XXXX".to_string()
            },
            Self::MissingOwnerKey => "Ingresa la clave de propietario".to_string(),
            Self::InvalidOwnerKey => "Clave de propietario inválida".to_string(),
            Self::MissingCode => "Ingresa el código recibido".to_string(),
            Self::MissingCredentials => "Ingresa tu correo y contraseña".to_string(),
        }
    }
}

/// How a failure should be handled by the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Bad form input; fix and resubmit.
    InputValidation,
    /// The email already has an account; hand over to sign-in.
    CredentialConflict,
    /// The credential exists but may not proceed.
    AuthorizationGate,
    /// Network or backend trouble; retry later.
    TransientInfrastructure,
    /// Backend rules denied the operation.
    Permission,
    /// Wrong or expired code; the user may try again.
    VerificationRetry,
    /// Part of the work succeeded and was rolled back.
    CompensablePartialFailure,
    /// The session can no longer continue; sign in again.
    SessionLost,
    /// Bug or unexpected provider response.
    Internal,
}

/// Error taxonomy for the auth flows.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Input Errors
    // ═══════════════════════════════════════════════════════════

    /// Local validation failed.
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    /// Issuer rejected the email format.
    #[error("Issuer rejected email address")]
    InvalidEmail,

    /// Issuer rejected the password strength.
    #[error("Issuer rejected password as weak")]
    WeakPassword,

    // ═══════════════════════════════════════════════════════════
    // Credential Errors
    // ═══════════════════════════════════════════════════════════

    /// An account already exists for the email.
    #[error("Email already in use")]
    EmailInUse,

    /// No account for the email.
    #[error("User not found")]
    UserNotFound,

    /// Password does not match the account.
    #[error("Wrong password")]
    WrongPassword,

    /// Email/password pair rejected without detail.
    #[error("Invalid credential")]
    InvalidCredential,

    /// Account disabled by the issuer or the profile flag.
    #[error("User disabled")]
    UserDisabled,

    /// Email link not yet followed.
    #[error("Email not verified")]
    EmailNotVerified,

    // ═══════════════════════════════════════════════════════════
    // Verification Errors
    // ═══════════════════════════════════════════════════════════

    /// Challenge verifier could not be initialized.
    #[error("Challenge verifier unavailable")]
    ChallengeUnavailable,

    /// SMS with the code could not be sent.
    #[error("SMS send failed")]
    SmsSendFailed,

    /// Phone code rejected.
    #[error("Invalid or expired verification code")]
    InvalidOrExpiredCode,

    /// Could not refresh the credential to read its verified flag.
    #[error("Verification status unavailable")]
    VerificationStatusUnavailable,

    /// Verification email could not be sent.
    #[error("Email delivery failed")]
    EmailDeliveryFailed,

    // ═══════════════════════════════════════════════════════════
    // Backend Errors
    // ═══════════════════════════════════════════════════════════

    /// Too many requests.
    #[error("Rate limited")]
    RateLimited,

    /// Request never reached the backend.
    #[error("Network request failed")]
    Network,

    /// Document store rules denied the operation.
    #[error("Permission denied")]
    PermissionDenied,

    /// Document store offline.
    #[error("Document store unavailable")]
    Unavailable,

    /// Update targeted a missing document.
    #[error("Document not found")]
    DocumentNotFound,

    // ═══════════════════════════════════════════════════════════
    // Flow Errors
    // ═══════════════════════════════════════════════════════════

    /// Credential was created but the profile write failed; the credential
    /// has been signed out.
    #[error("Profile not saved: {0}")]
    ProfileNotSaved(Box<AuthError>),

    /// Role could not be resolved after verification.
    #[error("Session lost after verification")]
    SessionLost,

    /// Unexpected failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for AuthError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error)
    }
}

impl AuthError {
    /// Category driving how the flow reacts.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lavado_auth::error::{AuthError, ErrorCategory};
    /// assert_eq!(AuthError::EmailInUse.category(), ErrorCategory::CredentialConflict);
    /// assert_eq!(AuthError::Network.category(), ErrorCategory::TransientInfrastructure);
    /// ```
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::InvalidEmail | Self::WeakPassword => {
                ErrorCategory::InputValidation
            },
            Self::EmailInUse => ErrorCategory::CredentialConflict,
            Self::UserNotFound
            | Self::WrongPassword
            | Self::InvalidCredential
            | Self::UserDisabled
            | Self::EmailNotVerified => ErrorCategory::AuthorizationGate,
            Self::ChallengeUnavailable
            | Self::SmsSendFailed
            | Self::VerificationStatusUnavailable
            | Self::EmailDeliveryFailed
            | Self::RateLimited
            | Self::Network
            | Self::Unavailable => ErrorCategory::TransientInfrastructure,
            Self::PermissionDenied => ErrorCategory::Permission,
            Self::InvalidOrExpiredCode => ErrorCategory::VerificationRetry,
            Self::ProfileNotSaved(_) => ErrorCategory::CompensablePartialFailure,
            Self::SessionLost => ErrorCategory::SessionLost,
            Self::DocumentNotFound | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns `true` if repeating the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::TransientInfrastructure | ErrorCategory::VerificationRetry
        )
    }

    /// Inline message shown next to the form.
    ///
    /// ```
    /// # use lavado_auth::error::{AuthError, ValidationError};
    /// let error = AuthError::Validation(ValidationError::InvalidOwnerKey);
    /// assert_eq!(error.user_message(), "Clave de propietario inválida");
    /// ```
    #[must_use]
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Validation(error) => return error.user_message(),
            Self::ProfileNotSaved(cause) => {
                return match cause.as_ref() {
                    Self::PermissionDenied => {
                        "No tienes permisos para guardar tu perfil. Revisa las reglas de seguridad."
                            .to_string()
                    },
                    Self::Unavailable | Self::Network => {
                        "Base de datos sin conexión. Revisa internet o reglas.".to_string()
                    },
                    _ => "Error guardando tu perfil. Intenta nuevamente.".to_string(),
                };
            },
            Self::InvalidEmail => "Correo electrónico inválido",
            Self::WeakPassword => "La contraseña es demasiado débil",
            Self::EmailInUse => "Este correo ya está registrado. Intenta iniciar sesión.",
            Self::UserNotFound => "No existe una cuenta con este correo.",
            Self::WrongPassword => "Contraseña incorrecta.",
            Self::InvalidCredential => "Correo o contraseña incorrectos.",
            Self::UserDisabled => "Esta cuenta ha sido deshabilitada",
            Self::EmailNotVerified => "Aún no verificas tu correo. Revisa bandeja o spam.",
            Self::ChallengeUnavailable => {
                "No se pudo inicializar la verificación de seguridad. Recarga la página e intenta nuevamente."
            },
            Self::SmsSendFailed => {
                "No se pudo enviar el SMS. Verifica tu número (+1...) y vuelve a intentar."
            },
            Self::InvalidOrExpiredCode => "Código inválido o expirado. Intenta nuevamente.",
            Self::VerificationStatusUnavailable => {
                "No se pudo verificar el estado. Intenta de nuevo."
            },
            Self::EmailDeliveryFailed => {
                "No se pudo reenviar el correo de verificación. Intenta más tarde."
            },
            Self::RateLimited => "Demasiados intentos. Intenta más tarde.",
            Self::Network => "Error de conexión. Verifica tu internet.",
            Self::PermissionDenied => {
                "Error: la base de datos bloqueó el acceso. Actualiza las reglas de seguridad."
            },
            Self::Unavailable => "Base de datos sin conexión. Revisa internet o reglas.",
            Self::DocumentNotFound | Self::Internal(_) => "Error: Intenta nuevamente",
            Self::SessionLost => "No se pudo continuar. Inicia sesión nuevamente.",
        };
        message.to_string()
    }
}
