//! Registration form validation and phone formatting.
//!
//! Validation is local and ordered; the first failing rule wins and nothing
//! reaches a provider.

use crate::config::AuthConfig;
use crate::error::ValidationError;
use crate::profile::ProfilePatch;
use crate::state::{AccountType, RegistrationForm, VerificationChannel};
use constant_time_eq::constant_time_eq;

/// A form that passed validation.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    /// Sanitized email.
    pub email: String,
    /// Password, checked against the confirmation and minimum length.
    pub password: String,
    /// Phone in E.164.
    pub phone_e164: String,
    /// Chosen channel.
    pub channel: VerificationChannel,
    /// Profile fields to merge once the credential exists.
    pub profile: ProfilePatch,
}

impl std::fmt::Debug for ValidatedRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedRegistration")
            .field("email", &self.email)
            .field("phone_e164", &self.phone_e164)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// Trim and lowercase an email.
#[must_use]
pub fn sanitize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Canonical E.164 form of a typed phone, or `None` when it is not the
/// country code followed by exactly ten digits.
///
/// ```
/// # use lavado_auth::validation::normalize_phone;
/// assert_eq!(normalize_phone("+1 (212) 555-0100", "1"), Some("+12125550100".to_string()));
/// assert_eq!(normalize_phone("212-555-0100", "1"), None);
/// ```
#[must_use]
pub fn normalize_phone(input: &str, country_code: &str) -> Option<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    let subscriber = digits.strip_prefix(country_code)?;
    (subscriber.len() == 10).then(|| format!("+{digits}"))
}

/// Format keystrokes into `+C (XXX) XXX-XXXX`.
///
/// Clearing the field leaves the `+C` prefix in place and anything beyond ten
/// subscriber digits is dropped.
///
/// ```
/// # use lavado_auth::validation::format_phone_input;
/// assert_eq!(format_phone_input("", "1"), "+1");
/// assert_eq!(format_phone_input("+1212", "1"), "+1 (212");
/// assert_eq!(format_phone_input("12125550100999", "1"), "+1 (212) 555-0100");
/// ```
#[must_use]
pub fn format_phone_input(raw: &str, country_code: &str) -> String {
    let prefix = format!("+{country_code}");
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= country_code.len() {
        return prefix;
    }

    let subscriber: String = digits.chars().skip(country_code.len()).take(10).collect();
    let (area, rest) = subscriber.split_at(subscriber.len().min(3));
    let (exchange, line) = rest.split_at(rest.len().min(3));

    let mut formatted = format!("{prefix} ({area}");
    if !exchange.is_empty() {
        formatted.push_str(") ");
        formatted.push_str(exchange);
    }
    if !line.is_empty() {
        formatted.push('-');
        formatted.push_str(line);
    }
    formatted
}

/// Check the owner key for an owner account.
fn check_owner_key(key: &str, config: &AuthConfig) -> Result<(), ValidationError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ValidationError::MissingOwnerKey);
    }
    if config.allow_owner_bypass {
        tracing::warn!("Owner key bypass enabled, accepting key without comparison");
        return Ok(());
    }
    if constant_time_eq(key.as_bytes(), config.owner_key.trim().as_bytes()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidOwnerKey)
    }
}

/// Validate a registration form.
///
/// Rules, in order: name and address fields present, email shape, password
/// confirmation, password length, phone, owner key.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_registration(
    form: &RegistrationForm,
    config: &AuthConfig,
) -> Result<ValidatedRegistration, ValidationError> {
    let required = [
        &form.first_name,
        &form.last_name,
        &form.street,
        &form.city,
        &form.state,
        &form.zip_code,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(ValidationError::MissingAddressFields);
    }

    let email = sanitize_email(&form.email);
    if email.is_empty() || !email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if form.password.expose().chars().count() < config.min_password_length {
        return Err(ValidationError::PasswordTooShort {
            min: config.min_password_length,
        });
    }

    let phone_e164 =
        normalize_phone(&form.phone, &config.country_code).ok_or(ValidationError::InvalidPhone)?;

    if form.account_type == AccountType::Owner {
        check_owner_key(form.owner_key.expose(), config)?;
    }

    let profile = ProfilePatch {
        first_name: Some(form.first_name.trim().to_string()),
        last_name: Some(form.last_name.trim().to_string()),
        street: Some(form.street.trim().to_string()),
        city: Some(form.city.trim().to_string()),
        state: Some(form.state.trim().to_string()),
        zip_code: Some(form.zip_code.trim().to_string()),
        phone: Some(phone_e164.clone()),
        email: Some(email.clone()),
        role: Some(form.account_type.role()),
        phone_verified: Some(false),
        ..ProfilePatch::default()
    };

    Ok(ValidatedRegistration {
        email,
        password: form.password.expose().to_string(),
        phone_e164,
        channel: form.channel,
        profile,
    })
}
