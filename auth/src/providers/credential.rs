//! Credential issuer trait.

use crate::error::Result;
use crate::state::{ChallengeHandle, ConfirmationHandle, Credential, UserId};
use std::future::Future;

/// Email/password identity provider.
///
/// Password hashes never leave the issuer.
pub trait CredentialIssuer: Send + Sync {
    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// - `AuthError::EmailInUse`
    /// - `AuthError::InvalidEmail`
    /// - `AuthError::WeakPassword`
    /// - `AuthError::Network` / `AuthError::RateLimited`
    fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credential>> + Send;

    /// Set the display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the issuer rejects the update.
    fn update_display_name(
        &self,
        credential: &Credential,
        display_name: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Send the email verification link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailDeliveryFailed` or a transport error.
    fn send_email_verification(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Reload the credential from the issuer and report whether its email is
    /// verified. Never answers from a cached flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be reloaded.
    fn refresh_credential(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// End the credential's session.
    ///
    /// # Errors
    ///
    /// Returns an error if the issuer cannot be reached.
    fn sign_out(&self, credential: &Credential) -> impl Future<Output = Result<()>> + Send;

    /// Send an SMS code to link `phone_e164` to the credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SmsSendFailed`.
    fn link_phone_number(
        &self,
        credential: &Credential,
        phone_e164: &str,
        challenge: &ChallengeHandle,
    ) -> impl Future<Output = Result<ConfirmationHandle>> + Send;

    /// Confirm the SMS code. Returns the confirmed user id when the issuer
    /// reports one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOrExpiredCode`.
    fn confirm_phone_code(
        &self,
        confirmation: &ConfirmationHandle,
        code: &str,
    ) -> impl Future<Output = Result<Option<UserId>>> + Send;

    /// Email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound`, `AuthError::InvalidEmail` or a
    /// transport error.
    fn request_password_reset(&self, email: &str) -> impl Future<Output = Result<()>> + Send;

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// - `AuthError::UserNotFound` / `AuthError::WrongPassword` /
    ///   `AuthError::InvalidCredential`
    /// - `AuthError::UserDisabled`
    /// - `AuthError::Network` / `AuthError::RateLimited`
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credential>> + Send;
}
