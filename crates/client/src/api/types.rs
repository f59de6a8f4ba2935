//! Request and response bodies for the BookNest API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booknest_core::{Email, Role, SubscriberId, UserId};

use super::ApiError;
use crate::models::Session;

// =============================================================================
// Users & auth
// =============================================================================

/// A user document as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default, alias = "name")]
    pub fullname: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub password_last_changed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RemoteUser {
    /// Build the client session for this user.
    ///
    /// `role` applies when the backend did not send one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if the backend sent a malformed e-mail.
    pub fn to_session(&self, role: Role, token: Option<String>) -> Result<Session, ApiError> {
        let email = Email::parse(&self.email)
            .map_err(|e| ApiError::Parse(format!("user {} has invalid email: {e}", self.id)))?;
        Ok(Session {
            id: self.id.clone(),
            name: self.fullname.clone(),
            email,
            role: self.role.unwrap_or(role),
            token,
            password_last_changed: self.password_last_changed,
        })
    }
}

/// Response to login and signup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: RemoteUser,
    #[serde(default)]
    pub token: Option<String>,
}

/// Response to `PUT /user/change-password`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<RemoteUser>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Payment
// =============================================================================

/// Gateway order created by `POST /api/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
}

/// Response to `POST /api/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub order: Option<GatewayOrder>,
}

/// Body for `POST /api/paymentverification`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

impl PaymentVerification {
    /// Verification for a gateway order confirmed at `at`.
    #[must_use]
    pub fn for_order(order_id: &str, at: DateTime<Utc>) -> Self {
        let stamp = at.timestamp_millis();
        Self {
            razorpay_order_id: order_id.to_string(),
            razorpay_payment_id: format!("pay_{stamp}"),
            razorpay_signature: format!("sig_{stamp}"),
        }
    }
}

/// Response to `POST /api/paymentverification`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct VerificationResponse {
    #[serde(default)]
    pub success: bool,
}

// =============================================================================
// Newsletter
// =============================================================================

/// Body for `POST /send-email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl EmailMessage {
    /// The newsletter welcome message.
    #[must_use]
    pub fn welcome(email: &Email) -> Self {
        Self {
            email: email.as_str().to_string(),
            subject: "Welcome to BookNest Newsletter!".to_string(),
            message: "Thank you for subscribing to our newsletter! We will keep you updated \
                      with the latest books, promotions, and exclusive offers."
                .to_string(),
        }
    }
}

/// Response to `POST /send-email`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub email_saved: bool,
    #[serde(default)]
    pub already_subscribed: bool,
}

// =============================================================================
// Contact
// =============================================================================

/// Body for `POST /contact/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Response to `POST /contact/send`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// A newsletter subscriber (`GET /emails`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    #[serde(rename = "_id", alias = "id")]
    pub id: SubscriberId,
    pub email: String,
    #[serde(default, alias = "subscribedAt")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_remote_user_to_session_uses_fallback_role() {
        let user: RemoteUser = serde_json::from_str(
            r#"{"_id":"u42","fullname":"Ada Lovelace","email":"ada@booknest.dev"}"#,
        )
        .unwrap();
        let session = user.to_session(Role::Admin, Some("tok".to_string())).unwrap();

        assert_eq!(session.id.as_str(), "u42");
        assert_eq!(session.name, "Ada Lovelace");
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_remote_user_role_wins() {
        let user: RemoteUser = serde_json::from_str(
            r#"{"_id":"u1","fullname":"Sam","email":"sam@booknest.dev","role":"user"}"#,
        )
        .unwrap();
        assert_eq!(user.to_session(Role::Admin, None).unwrap().role, Role::User);
    }

    #[test]
    fn test_remote_user_bad_email() {
        let user: RemoteUser =
            serde_json::from_str(r#"{"_id":"u1","fullname":"Sam","email":"nope"}"#).unwrap();
        assert!(matches!(user.to_session(Role::User, None), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_payment_verification_stamps() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let v = PaymentVerification::for_order("order_9", at);
        assert_eq!(v.razorpay_order_id, "order_9");
        assert_eq!(v.razorpay_payment_id, format!("pay_{}", at.timestamp_millis()));
        assert!(v.razorpay_signature.starts_with("sig_"));
    }

    #[test]
    fn test_send_email_response_defaults() {
        let r: SendEmailResponse = serde_json::from_str(r#"{"emailSaved":true}"#).unwrap();
        assert!(r.email_saved);
        assert!(!r.success);
        assert!(!r.already_subscribed);
    }

    #[test]
    fn test_contact_response_message_is_optional() {
        let r: ContactResponse =
            serde_json::from_str(r#"{"success":true,"message":"Thanks!"}"#).unwrap();
        assert_eq!(r.message.as_deref(), Some("Thanks!"));
        let r: ContactResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(r, ContactResponse::default());
    }
}
