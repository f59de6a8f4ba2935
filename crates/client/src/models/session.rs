//! Session-related types.
//!
//! The authenticated identity persisted under [`keys::USER`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booknest_core::{Email, Role, UserId};

/// The logged-in user.
///
/// Created from the auth API's response on login or registration and
/// removed on logout. Only the session service writes it; everything else
/// reads it to pick the storage scope.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Backend user ID.
    #[serde(alias = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: Email,
    /// Account role.
    #[serde(default)]
    pub role: Role,
    /// Bearer token, when the backend issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// When the password was last changed, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_last_changed: Option<DateTime<Utc>>,
}

impl Session {
    /// First word of the display name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// Everything after the first word of the display name.
    #[must_use]
    pub fn last_name(&self) -> String {
        self.name
            .split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("password_last_changed", &self.password_last_changed)
            .finish()
    }
}

/// Storage keys for session data.
pub mod keys {
    /// Key for the current logged-in user.
    pub const USER: &str = "user";

    /// Key for the admin override flag.
    pub const ADMIN_VERIFIED: &str = "adminVerified";

    /// Key for the bearer token used on order mirror calls.
    pub const TOKEN: &str = "token";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::session;

    #[test]
    fn test_debug_redacts_token() {
        let mut s = session("u42");
        s.token = Some("super-secret-bearer".to_string());

        let debug = format!("{s:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-bearer"));
    }

    #[test]
    fn test_name_split() {
        let mut s = session("u42");
        s.name = "Ada King Lovelace".to_string();
        assert_eq!(s.first_name(), "Ada");
        assert_eq!(s.last_name(), "King Lovelace");
    }

    #[test]
    fn test_accepts_underscore_id() {
        let json = r#"{"_id":"u7","name":"Sam","email":"sam@booknest.dev","role":"admin"}"#;
        let s: Session = serde_json::from_str(json).unwrap();
        assert_eq!(s.id.as_str(), "u7");
        assert_eq!(s.role, Role::Admin);
        assert!(s.token.is_none());
    }
}
