//! Role resolution and post-verification routing.
//!
//! Stored role strings are mapped onto a closed [`Role`] enum at the
//! deserialization boundary, so every stored value (including values this
//! client does not know) lands on exactly one [`Destination`].

use crate::error::Result;
use crate::profile::ProfileRecord;
use crate::providers::DocumentStore;
use crate::state::UserId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Books washes.
    #[default]
    Customer,
    /// Runs a car wash.
    Owner,
    /// Operates the marketplace.
    Admin,
    /// Performs washes. Stored as `washer` or the legacy `worker`.
    Washer,
}

impl Role {
    /// Map a stored role string. Unknown strings become [`Role::Customer`].
    ///
    /// ```
    /// # use lavado_auth::role::Role;
    /// assert_eq!(Role::from_stored("worker"), Role::Washer);
    /// assert_eq!(Role::from_stored("superuser"), Role::Customer);
    /// ```
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        match value {
            "owner" => Self::Owner,
            "admin" => Self::Admin,
            "washer" | "worker" => Self::Washer,
            _ => Self::Customer,
        }
    }

    /// Canonical stored form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Washer => "washer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_stored(&raw))
    }
}

/// Deserialize a stored `role` field of any JSON type.
///
/// Strings go through [`Role::from_stored`], `null` counts as absent and any
/// other value is treated as a customer.
///
/// # Errors
///
/// Only fails if the input is not valid JSON.
pub fn deserialize_stored<'de, D>(deserializer: D) -> std::result::Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(stored_role))
}

fn stored_role(value: &serde_json::Value) -> Option<Role> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(raw) => Some(Role::from_stored(raw)),
        _ => Some(Role::Customer),
    }
}

/// Where a signed-in user is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// `/owner`
    OwnerConsole,
    /// `/admin/orders`
    AdminOrders,
    /// `/washer/orders`
    WasherOrders,
    /// `/customer-dashboard`
    CustomerDashboard,
}

impl Destination {
    /// Destination for a role.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Owner => Self::OwnerConsole,
            Role::Admin => Self::AdminOrders,
            Role::Washer => Self::WasherOrders,
            Role::Customer => Self::CustomerDashboard,
        }
    }

    /// Destination for a raw stored role, or its absence.
    #[must_use]
    pub fn for_stored_role(role: Option<&str>) -> Self {
        Self::for_role(role.map(Role::from_stored).unwrap_or_default())
    }

    /// Route path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::OwnerConsole => "/owner",
            Self::AdminOrders => "/admin/orders",
            Self::WasherOrders => "/washer/orders",
            Self::CustomerDashboard => "/customer-dashboard",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Read the profile record for `user_id`.
///
/// # Errors
///
/// Returns the document store error unchanged, or
/// [`AuthError::Internal`](crate::AuthError::Internal) if the record cannot be
/// decoded.
pub async fn load_profile<D: DocumentStore>(
    documents: &D,
    collection: &str,
    user_id: &UserId,
) -> Result<Option<ProfileRecord>> {
    let document = documents.read(collection, user_id.as_str()).await?;
    document.map(ProfileRecord::from_document).transpose()
}

/// Resolve the role for a user.
///
/// No user id, no record or a record without a role all resolve to
/// [`Role::Customer`]. Only the `role` field is read, so the rest of the
/// record cannot fail resolution. Read failures are returned, not retried and
/// not guessed around.
///
/// # Errors
///
/// Propagates document store errors.
pub async fn resolve_role<D: DocumentStore>(
    documents: &D,
    collection: &str,
    user_id: Option<&UserId>,
) -> Result<Role> {
    let Some(user_id) = user_id else {
        tracing::debug!("No user id, resolving as customer");
        return Ok(Role::Customer);
    };

    let document = documents.read(collection, user_id.as_str()).await?;
    let role = document
        .as_ref()
        .and_then(|d| d.get("role"))
        .and_then(stored_role)
        .unwrap_or_default();
    tracing::debug!(user_id = %user_id, role = %role, "Role resolved");
    Ok(role)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::mocks::MockDocumentStore;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_destinations() {
        assert_eq!(Destination::for_stored_role(Some("owner")).path(), "/owner");
        assert_eq!(Destination::for_stored_role(Some("admin")).path(), "/admin/orders");
        assert_eq!(Destination::for_stored_role(Some("washer")).path(), "/washer/orders");
        assert_eq!(Destination::for_stored_role(Some("worker")).path(), "/washer/orders");
        assert_eq!(Destination::for_stored_role(Some("customer")).path(), "/customer-dashboard");
        assert_eq!(Destination::for_stored_role(None).path(), "/customer-dashboard");
    }

    #[test]
    fn test_stored_role_of_any_type() {
        #[derive(Deserialize)]
        struct Doc {
            #[serde(default, deserialize_with = "deserialize_stored")]
            role: Option<Role>,
        }

        let parse = |v: serde_json::Value| serde_json::from_value::<Doc>(v).unwrap().role;
        assert_eq!(parse(json!({})), None);
        assert_eq!(parse(json!({"role": null})), None);
        assert_eq!(parse(json!({"role": "admin"})), Some(Role::Admin));
        assert_eq!(parse(json!({"role": 7})), Some(Role::Customer));
        assert_eq!(parse(json!({"role": ["owner"]})), Some(Role::Customer));
    }

    #[tokio::test]
    async fn test_resolve_role_defaults_to_customer() {
        let documents = MockDocumentStore::new();
        let user = UserId::from("u-1");

        assert_eq!(resolve_role(&documents, "users", None).await.unwrap(), Role::Customer);
        assert_eq!(resolve_role(&documents, "users", Some(&user)).await.unwrap(), Role::Customer);

        documents.insert("users", "u-1", json!({"firstName": "Ana"}));
        assert_eq!(resolve_role(&documents, "users", Some(&user)).await.unwrap(), Role::Customer);

        documents.insert("users", "u-1", json!({"role": "washer"}));
        assert_eq!(resolve_role(&documents, "users", Some(&user)).await.unwrap(), Role::Washer);
    }

    #[tokio::test]
    async fn test_resolve_role_ignores_other_fields() {
        let documents = MockDocumentStore::new();
        let user = UserId::from("u-1");

        documents.insert("users", "u-1", json!({"role": "washer", "phone": null}));
        assert_eq!(resolve_role(&documents, "users", Some(&user)).await.unwrap(), Role::Washer);

        documents.insert("users", "u-1", json!({"role": "owner", "zipCode": 10001}));
        assert_eq!(resolve_role(&documents, "users", Some(&user)).await.unwrap(), Role::Owner);

        let profile = load_profile(&documents, "users", &user).await.unwrap().unwrap();
        assert_eq!(profile.zip_code, "10001");
        assert_eq!(profile.role_or_default(), Role::Owner);
    }

    #[tokio::test]
    async fn test_resolve_role_returns_read_errors() {
        let documents = MockDocumentStore::new();
        documents.fail_reads_with(AuthError::PermissionDenied);

        let result = resolve_role(&documents, "users", Some(&UserId::from("u-1"))).await;
        assert_eq!(result, Err(AuthError::PermissionDenied));
    }

    proptest! {
        #[test]
        fn prop_every_stored_role_has_one_destination(raw in ".*") {
            let destination = Destination::for_stored_role(Some(&raw));
            let expected = match raw.as_str() {
                "owner" => "/owner",
                "admin" => "/admin/orders",
                "washer" | "worker" => "/washer/orders",
                _ => "/customer-dashboard",
            };
            prop_assert_eq!(destination.path(), expected);
        }

        #[test]
        fn prop_role_round_trips_through_stored_form(index in 0usize..4) {
            let role = [Role::Customer, Role::Owner, Role::Admin, Role::Washer][index];
            prop_assert_eq!(Role::from_stored(role.as_str()), role);
        }
    }
}
