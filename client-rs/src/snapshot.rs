//! Decoding of the `/api/me` response body
//!
//! The expected shape is `{ "permissions": string[], "role": string | null }`.
//! A missing or null field defaults on its own. Anything else (a body that
//! is not a JSON object, a field of the wrong type, a non-string
//! permission) rejects the whole body, so no field survives a bad reply.

use crate::error::Result;
use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;

/// Authorization data reported by the backend for the current session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationSnapshot {
    /// Permission identifiers, as sent (may contain duplicates)
    pub permissions: Vec<String>,

    /// Role identifier, if any
    pub role: Option<String>,
}

/// Wire form of the body
#[derive(Deserialize)]
struct MeBody {
    permissions: Option<Vec<String>>,
    role: Option<String>,
}

impl AuthorizationSnapshot {
    pub fn new<I, S>(permissions: I, role: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            role: role.map(str::to_string),
        }
    }

    /// Decode a raw response body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON document
    pub fn from_value(value: Value) -> Result<Self> {
        // Structs also deserialize from sequences, which is never a valid body
        if !value.is_object() {
            return Err(serde_json::Error::custom(format!(
                "expected a JSON object, found {}",
                kind(&value)
            ))
            .into());
        }

        let body: MeBody = serde_json::from_value(value)?;
        Ok(Self {
            permissions: body.permissions.unwrap_or_default(),
            role: body.role,
        })
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use serde_json::json;

    #[test]
    fn test_decode_full_body() {
        let body = br#"{"permissions":["CMS_DASHBOARD","CMS_ORDERS"],"role":"admin"}"#;
        let snapshot = AuthorizationSnapshot::from_slice(body).unwrap();

        assert_eq!(snapshot.permissions, vec!["CMS_DASHBOARD", "CMS_ORDERS"]);
        assert_eq!(snapshot.role.as_deref(), Some("admin"));
    }

    #[test]
    fn test_decode_missing_role() {
        let snapshot =
            AuthorizationSnapshot::from_value(json!({"permissions": ["CMS_USERS"]})).unwrap();

        assert_eq!(snapshot.permissions, vec!["CMS_USERS"]);
        assert!(snapshot.role.is_none());
    }

    #[test]
    fn test_decode_null_fields() {
        let snapshot =
            AuthorizationSnapshot::from_value(json!({"permissions": [], "role": null})).unwrap();
        assert!(snapshot.role.is_none());

        let snapshot =
            AuthorizationSnapshot::from_value(json!({"permissions": null, "role": "viewer"}))
                .unwrap();
        assert!(snapshot.permissions.is_empty());
        assert_eq!(snapshot.role.as_deref(), Some("viewer"));
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let snapshot = AuthorizationSnapshot::from_value(json!({
            "permissions": ["CMS_ORDERS"],
            "role": "admin",
            "email": "ops@shop.example"
        }))
        .unwrap();
        assert_eq!(snapshot.permissions, vec!["CMS_ORDERS"]);
    }

    #[test]
    fn test_decode_wrong_permissions_type_rejects_role_too() {
        let err = AuthorizationSnapshot::from_slice(
            br#"{"permissions":"CMS_ORDERS","role":"admin"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_decode_wrong_role_type_rejects_permissions_too() {
        let result = AuthorizationSnapshot::from_value(json!({
            "permissions": ["CMS_ORDERS"],
            "role": 7
        }));
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_decode_non_string_permission_rejects_body() {
        for body in [
            json!({"permissions": ["CMS_ORDERS", 42], "role": "admin"}),
            json!({"permissions": ["CMS_ORDERS", null]}),
            json!({"permissions": [{"x": 1}, "CMS_CONTENT"]}),
        ] {
            let result = AuthorizationSnapshot::from_value(body.clone());
            assert!(matches!(result, Err(FetchError::Malformed(_))), "{}", body);
        }
    }

    #[test]
    fn test_decode_non_object_documents() {
        for body in [
            json!([["CMS_ORDERS"], "admin"]),
            json!(null),
            json!("admin"),
            json!(1),
        ] {
            let result = AuthorizationSnapshot::from_value(body.clone());
            assert!(matches!(result, Err(FetchError::Malformed(_))), "{}", body);
        }
    }

    #[test]
    fn test_decode_not_json_is_error() {
        assert!(AuthorizationSnapshot::from_slice(b"<html>login</html>").is_err());
        assert!(AuthorizationSnapshot::from_slice(b"").is_err());
    }
}
