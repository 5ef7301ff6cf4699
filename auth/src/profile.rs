//! Profile records as stored in the document store.
//!
//! Stored field names are camelCase and the street line is kept under
//! `address`. Reads are lenient: a missing, `null` or mistyped field takes its
//! default rather than failing the whole record. Numbers stored where text is
//! expected (a numeric `zipCode`) are kept as text.

use crate::error::{AuthError, Result};
use crate::providers::Document;
use crate::role::{self, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Profile record read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRecord {
    /// First name.
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: String,
    /// Last name.
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: String,
    /// Street line.
    #[serde(rename = "address", alias = "street", deserialize_with = "lenient_string")]
    pub street: String,
    /// City.
    #[serde(deserialize_with = "lenient_string")]
    pub city: String,
    /// State.
    #[serde(deserialize_with = "lenient_string")]
    pub state: String,
    /// ZIP code.
    #[serde(deserialize_with = "lenient_string")]
    pub zip_code: String,
    /// Phone in E.164.
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    /// Email.
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    /// Stored role; absent means customer.
    #[serde(deserialize_with = "role::deserialize_stored", skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Phone code confirmed.
    #[serde(deserialize_with = "lenient_bool")]
    pub phone_verified: bool,
    /// Sign-in blocked.
    #[serde(deserialize_with = "lenient_bool")]
    pub disabled: bool,
    /// Creation time.
    #[serde(deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// Decode a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] only if the document cannot be walked
    /// at all; individual fields never fail the decode.
    pub fn from_document(document: Document) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(document))
            .map_err(|e| AuthError::Internal(format!("malformed profile record: {e}")))
    }

    /// Role, defaulting to customer.
    #[must_use]
    pub fn role_or_default(&self) -> Role {
        self.role.unwrap_or_default()
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => text,
        Some(serde_json::Value::Number(number)) => number.to_string(),
        _ => String::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(serde_json::Value::Bool(true))))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Field-level merge into a profile record. `None` fields are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// First name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Street line.
    #[serde(rename = "address", skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    /// City.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// ZIP code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// Phone in E.164.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Phone code confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_verified: Option<bool>,
    /// Sign-in blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    /// Patch marking the phone as verified.
    #[must_use]
    pub fn phone_verified() -> Self {
        Self {
            phone_verified: Some(true),
            ..Self::default()
        }
    }

    /// Set the creation time.
    #[must_use]
    pub const fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Display name built from the name fields.
    #[must_use]
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or_default();
        let last = self.last_name.as_deref().unwrap_or_default();
        format!("{first} {last}").trim().to_string()
    }

    /// Encode as a merge document containing only the set fields.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if encoding fails.
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(AuthError::Internal(format!("profile patch encoded as {other}"))),
            Err(e) => Err(AuthError::Internal(format!("profile patch encoding failed: {e}"))),
        }
    }
}
