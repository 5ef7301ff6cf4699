//! Mock credential issuer.

use crate::error::{AuthError, Result};
use crate::providers::CredentialIssuer;
use crate::state::{ChallengeHandle, ConfirmationHandle, Credential, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// The only SMS code the mock accepts.
pub const VALID_SMS_CODE: &str = "123456";

/// One recorded issuer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssuerCall {
    /// `create_credential`
    CreateCredential,
    /// `update_display_name`
    UpdateDisplayName,
    /// `send_email_verification`
    SendEmailVerification,
    /// `refresh_credential`
    RefreshCredential,
    /// `sign_out`
    SignOut,
    /// `link_phone_number`
    LinkPhoneNumber,
    /// `confirm_phone_code`
    ConfirmPhoneCode,
    /// `request_password_reset`
    RequestPasswordReset,
    /// `sign_in`
    SignIn,
}

#[derive(Debug, Clone)]
struct Account {
    credential: Credential,
    password: String,
    disabled: bool,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    pending_confirmations: HashMap<String, (String, String)>,
    failures: HashMap<IssuerCall, AuthError>,
    calls: Vec<IssuerCall>,
}

/// In-memory email/password issuer.
///
/// Accounts are keyed by sanitized email. Every call is recorded before any
/// injected failure is applied.
#[derive(Debug, Clone, Default)]
pub struct MockCredentialIssuer {
    inner: Arc<Mutex<Inner>>,
}

impl MockCredentialIssuer {
    /// Create an issuer with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> Result<T>) -> Result<T> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AuthError::Internal("mock issuer poisoned".to_string()))?;
        f(&mut inner)
    }

    /// Record `call` and return its injected failure, if any.
    fn record(inner: &mut Inner, call: IssuerCall) -> Result<()> {
        inner.calls.push(call);
        inner.failures.get(&call).cloned().map_or(Ok(()), Err)
    }

    fn seed(&self, helper: &'static str, f: impl FnOnce(&mut Inner)) {
        if let Err(error) = self.with_inner(|inner| {
            f(inner);
            Ok(())
        }) {
            tracing::error!(%error, helper, "Mock issuer not updated");
        }
    }

    /// Seed an account.
    pub fn add_account(&self, email: &str, password: &str) -> Credential {
        let credential = Credential {
            user_id: UserId::new(),
            email: email.to_string(),
            phone: None,
            email_verified: false,
            phone_verified: false,
            display_name: None,
        };
        let account = Account {
            credential: credential.clone(),
            password: password.to_string(),
            disabled: false,
        };
        self.seed("add_account", |inner| {
            inner.accounts.insert(email.to_string(), account);
        });
        credential
    }

    /// Mark an account's email as verified, as if the link was followed.
    pub fn verify_email(&self, email: &str) {
        self.seed("verify_email", |inner| {
            if let Some(account) = inner.accounts.get_mut(email) {
                account.credential.email_verified = true;
            }
        });
    }

    /// Disable an account at the issuer.
    pub fn disable(&self, email: &str) {
        self.seed("disable", |inner| {
            if let Some(account) = inner.accounts.get_mut(email) {
                account.disabled = true;
            }
        });
    }

    /// Fail every following `call` with `error`.
    pub fn fail(&self, call: IssuerCall, error: AuthError) {
        self.seed("fail", |inner| {
            inner.failures.insert(call, error);
        });
    }

    /// Stop failing `call`.
    pub fn heal(&self, call: IssuerCall) {
        self.seed("heal", |inner| {
            inner.failures.remove(&call);
        });
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<IssuerCall> {
        self.with_inner(|inner| Ok(inner.calls.clone())).unwrap_or_default()
    }

    /// Number of times `call` was made.
    #[must_use]
    pub fn count(&self, call: IssuerCall) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    /// Current issuer view of an account.
    #[must_use]
    pub fn credential(&self, email: &str) -> Option<Credential> {
        self.with_inner(|inner| Ok(inner.accounts.get(email).map(|a| a.credential.clone())))
            .ok()
            .flatten()
    }
}

impl CredentialIssuer for MockCredentialIssuer {
    fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credential>> + Send {
        let issuer = self.clone();
        let email = email.to_string();
        let password = password.to_string();

        async move {
            issuer.with_inner(|inner| {
                Self::record(inner, IssuerCall::CreateCredential)?;
                if inner.accounts.contains_key(&email) {
                    return Err(AuthError::EmailInUse);
                }
                if !email.contains('@') {
                    return Err(AuthError::InvalidEmail);
                }
                if password.len() < 6 {
                    return Err(AuthError::WeakPassword);
                }
                let credential = Credential {
                    user_id: UserId::new(),
                    email: email.clone(),
                    phone: None,
                    email_verified: false,
                    phone_verified: false,
                    display_name: None,
                };
                inner.accounts.insert(
                    email,
                    Account {
                        credential: credential.clone(),
                        password,
                        disabled: false,
                    },
                );
                Ok(credential)
            })
        }
    }

    fn update_display_name(
        &self,
        credential: &Credential,
        display_name: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        let issuer = self.clone();
        let email = credential.email.clone();
        let display_name = display_name.to_string();

        async move {
            issuer.with_inner(|inner| {
                Self::record(inner, IssuerCall::UpdateDisplayName)?;
                let account = inner.accounts.get_mut(&email).ok_or(AuthError::UserNotFound)?;
                account.credential.display_name = Some(display_name);
                Ok(())
            })
        }
    }

    fn send_email_verification(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<()>> + Send {
        let issuer = self.clone();
        let email = credential.email.clone();

        async move {
            issuer.with_inner(|inner| {
                Self::record(inner, IssuerCall::SendEmailVerification)?;
                inner
                    .accounts
                    .contains_key(&email)
                    .then_some(())
                    .ok_or(AuthError::UserNotFound)
            })
        }
    }

    fn refresh_credential(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<bool>> + Send {
        let issuer = self.clone();
        let email = credential.email.clone();

        async move {
            issuer.with_inner(|inner| {
                Self::record(inner, IssuerCall::RefreshCredential)?;
                inner
                    .accounts
                    .get(&email)
                    .map(|a| a.credential.email_verified)
                    .ok_or(AuthError::UserNotFound)
            })
        }
    }

    fn sign_out(&self, _credential: &Credential) -> impl Future<Output = Result<()>> + Send {
        let issuer = self.clone();

        async move { issuer.with_inner(|inner| Self::record(inner, IssuerCall::SignOut)) }
    }

    fn link_phone_number(
        &self,
        credential: &Credential,
        phone_e164: &str,
        challenge: &ChallengeHandle,
    ) -> impl Future<Output = Result<ConfirmationHandle>> + Send {
        let issuer = self.clone();
        let email = credential.email.clone();
        let phone = phone_e164.to_string();
        let challenge = challenge.0.clone();

        async move {
            issuer.with_inner(|inner| {
                Self::record(inner, IssuerCall::LinkPhoneNumber)?;
                if !phone.starts_with('+') || challenge.is_empty() {
                    return Err(AuthError::SmsSendFailed);
                }
                let handle = format!("confirmation-{}", inner.pending_confirmations.len() + 1);
                inner
                    .pending_confirmations
                    .insert(handle.clone(), (email, phone));
                Ok(ConfirmationHandle(handle))
            })
        }
    }

    fn confirm_phone_code(
        &self,
        confirmation: &ConfirmationHandle,
        code: &str,
    ) -> impl Future<Output = Result<Option<UserId>>> + Send {
        let issuer = self.clone();
        let handle = confirmation.0.clone();
        let code = code.trim().to_string();

        async move {
            issuer.with_inner(|inner| {
                Self::record(inner, IssuerCall::ConfirmPhoneCode)?;
                if code != VALID_SMS_CODE {
                    return Err(AuthError::InvalidOrExpiredCode);
                }
                let (email, phone) = inner
                    .pending_confirmations
                    .get(&handle)
                    .cloned()
                    .ok_or(AuthError::InvalidOrExpiredCode)?;
                let account = inner.accounts.get_mut(&email).ok_or(AuthError::UserNotFound)?;
                account.credential.phone = Some(phone);
                account.credential.phone_verified = true;
                Ok(Some(account.credential.user_id.clone()))
            })
        }
    }

    fn request_password_reset(&self, email: &str) -> impl Future<Output = Result<()>> + Send {
        let issuer = self.clone();
        let email = email.to_string();

        async move {
            issuer.with_inner(|inner| {
                Self::record(inner, IssuerCall::RequestPasswordReset)?;
                inner
                    .accounts
                    .contains_key(&email)
                    .then_some(())
                    .ok_or(AuthError::UserNotFound)
            })
        }
    }

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credential>> + Send {
        let issuer = self.clone();
        let email = email.to_string();
        let password = password.to_string();

        async move {
            issuer.with_inner(|inner| {
                Self::record(inner, IssuerCall::SignIn)?;
                let account = inner.accounts.get(&email).ok_or(AuthError::UserNotFound)?;
                if account.password != password {
                    return Err(AuthError::WrongPassword);
                }
                if account.disabled {
                    return Err(AuthError::UserDisabled);
                }
                Ok(account.credential.clone())
            })
        }
    }
}
