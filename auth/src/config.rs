//! Auth configuration.
//!
//! Values come from the application (builder) or from the process
//! environment ([`AuthConfig::from_env`]). Nothing here is read at reduce
//! time except through the environment.

use std::fmt;
use thiserror::Error;

/// Default owner key when `LAVADO_OWNER_KEY` is unset.
pub const DEFAULT_OWNER_KEY: &str = "OWNER-2024";

/// Default profile collection.
pub const DEFAULT_PROFILES_COLLECTION: &str = "users";

/// Configuration loading error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable present but unparsable.
    #[error("Invalid value for {var}: {value}")]
    InvalidValue {
        /// Variable name
        var: String,
        /// Raw value
        value: String,
    },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Registration and sign-in settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared secret an owner must type to register an owner account.
    pub owner_key: String,

    /// Accept any non-empty owner key (development only).
    pub allow_owner_bypass: bool,

    /// Minimum password length.
    ///
    /// Default: 6
    pub min_password_length: usize,

    /// Country calling code without `+`.
    ///
    /// Default: `1`
    pub country_code: String,

    /// Collection holding profile records.
    pub profiles_collection: String,

    /// Where the challenge verifier mounts its widget.
    pub challenge_mount_point: String,
}

impl AuthConfig {
    /// Create a configuration with the given owner key and defaults elsewhere.
    #[must_use]
    pub fn new(owner_key: impl Into<String>) -> Self {
        Self {
            owner_key: owner_key.into(),
            ..Self::default()
        }
    }

    /// Allow any non-empty owner key.
    #[must_use]
    pub const fn with_owner_bypass(mut self, allow: bool) -> Self {
        self.allow_owner_bypass = allow;
        self
    }

    /// Set the minimum password length.
    #[must_use]
    pub const fn with_min_password_length(mut self, min: usize) -> Self {
        self.min_password_length = min;
        self
    }

    /// Set the country calling code (digits only).
    #[must_use]
    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = code.into();
        self
    }

    /// Set the profile collection name.
    #[must_use]
    pub fn with_profiles_collection(mut self, collection: impl Into<String>) -> Self {
        self.profiles_collection = collection.into();
        self
    }

    /// Set the challenge verifier mount point.
    #[must_use]
    pub fn with_challenge_mount_point(mut self, mount_point: impl Into<String>) -> Self {
        self.challenge_mount_point = mount_point.into();
        self
    }

    /// Load from `LAVADO_*` environment variables, falling back to defaults.
    ///
    /// - `LAVADO_OWNER_KEY` (empty means unset)
    /// - `LAVADO_ALLOW_OWNER_BYPASS` (`true`/`false`)
    /// - `LAVADO_PROFILES_COLLECTION` (empty means unset)
    /// - `LAVADO_PHONE_COUNTRY_CODE`
    /// - `LAVADO_MIN_PASSWORD_LENGTH`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparsable values and
    /// [`ConfigError::ValidationError`] if the result fails [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|var| std::env::var(var).ok())
    }

    /// Load from `LAVADO_*` variables supplied by `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty("LAVADO_OWNER_KEY") {
            config.owner_key = key;
        }

        if let Some(raw) = lookup("LAVADO_ALLOW_OWNER_BYPASS") {
            config.allow_owner_bypass = match raw.trim().to_lowercase().as_str() {
                "true" => true,
                "false" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "LAVADO_ALLOW_OWNER_BYPASS".to_string(),
                        value: raw,
                    });
                },
            };
        }

        if let Some(collection) = non_empty("LAVADO_PROFILES_COLLECTION") {
            config.profiles_collection = collection;
        }

        if let Some(code) = lookup("LAVADO_PHONE_COUNTRY_CODE") {
            config.country_code = code.trim().trim_start_matches('+').to_string();
        }

        if let Some(raw) = lookup("LAVADO_MIN_PASSWORD_LENGTH") {
            config.min_password_length =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: "LAVADO_MIN_PASSWORD_LENGTH".to_string(),
                    value: raw.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner_key.trim().is_empty() {
            return Err(ConfigError::ValidationError("owner_key cannot be empty".to_string()));
        }
        if self.country_code.is_empty()
            || self.country_code.len() > 3
            || !self.country_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::ValidationError(format!(
                "country_code must be 1-3 digits, got {:?}",
                self.country_code
            )));
        }
        if self.min_password_length == 0 {
            return Err(ConfigError::ValidationError(
                "min_password_length must be > 0".to_string(),
            ));
        }
        if self.profiles_collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "profiles_collection cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            owner_key: DEFAULT_OWNER_KEY.to_string(),
            allow_owner_bypass: false,
            min_password_length: 6,
            country_code: "1".to_string(),
            profiles_collection: DEFAULT_PROFILES_COLLECTION.to_string(),
            challenge_mount_point: "recaptcha-container".to_string(),
        }
    }
}

// The owner key is a secret
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("owner_key", &"<redacted>")
            .field("allow_owner_bypass", &self.allow_owner_bypass)
            .field("min_password_length", &self.min_password_length)
            .field("country_code", &self.country_code)
            .field("profiles_collection", &self.profiles_collection)
            .field("challenge_mount_point", &self.challenge_mount_point)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AuthConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AuthConfig::from_vars(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AuthConfig::default();
        assert_eq!(config.owner_key, "OWNER-2024");
        assert_eq!(config.min_password_length, 6);
        assert_eq!(config.profiles_collection, "users");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_owner_key() {
        let config = AuthConfig::new("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AuthConfig::new("  ").validate().is_err());
        assert!(AuthConfig::default().with_country_code("+1").validate().is_err());
        assert!(AuthConfig::default().with_country_code("").validate().is_err());
        assert!(AuthConfig::default().with_min_password_length(0).validate().is_err());
        assert!(AuthConfig::default().with_country_code("52").validate().is_ok());
    }

    #[test]
    fn test_from_vars_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.owner_key, DEFAULT_OWNER_KEY);
        assert!(!config.allow_owner_bypass);
        assert_eq!(config.country_code, "1");
        assert_eq!(config.min_password_length, 6);
        assert_eq!(config.profiles_collection, DEFAULT_PROFILES_COLLECTION);
    }

    #[test]
    fn test_from_vars_reads_every_setting() {
        let config = load(&[
            ("LAVADO_OWNER_KEY", "OWNER-2025"),
            ("LAVADO_ALLOW_OWNER_BYPASS", " TRUE "),
            ("LAVADO_PROFILES_COLLECTION", "profiles"),
            ("LAVADO_PHONE_COUNTRY_CODE", "+52"),
            ("LAVADO_MIN_PASSWORD_LENGTH", " 8 "),
        ])
        .unwrap();

        assert_eq!(config.owner_key, "OWNER-2025");
        assert!(config.allow_owner_bypass);
        assert_eq!(config.profiles_collection, "profiles");
        assert_eq!(config.country_code, "52");
        assert_eq!(config.min_password_length, 8);
    }

    #[test]
    fn test_from_vars_treats_empty_owner_key_as_unset() {
        let config = load(&[("LAVADO_OWNER_KEY", ""), ("LAVADO_PROFILES_COLLECTION", " ")]).unwrap();
        assert_eq!(config.owner_key, DEFAULT_OWNER_KEY);
        assert_eq!(config.profiles_collection, DEFAULT_PROFILES_COLLECTION);

        let config = load(&[("LAVADO_ALLOW_OWNER_BYPASS", "")]).unwrap();
        assert!(!config.allow_owner_bypass);
    }

    #[test]
    fn test_from_vars_rejects_unparsable_values() {
        assert_eq!(
            load(&[("LAVADO_ALLOW_OWNER_BYPASS", "yes")]).unwrap_err(),
            ConfigError::InvalidValue {
                var: "LAVADO_ALLOW_OWNER_BYPASS".to_string(),
                value: "yes".to_string(),
            }
        );
        assert_eq!(
            load(&[("LAVADO_MIN_PASSWORD_LENGTH", "six")]).unwrap_err(),
            ConfigError::InvalidValue {
                var: "LAVADO_MIN_PASSWORD_LENGTH".to_string(),
                value: "six".to_string(),
            }
        );
        assert!(matches!(
            load(&[("LAVADO_MIN_PASSWORD_LENGTH", "0")]),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            load(&[("LAVADO_PHONE_COUNTRY_CODE", "+1234")]),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
