//! BookNest REST API.
//!
//! The backend is split into narrow ports, one per concern, so services can
//! depend on exactly what they call and tests can substitute fakes.
//! [`HttpBackend`] implements all of them over `reqwest`.
//!
//! # Endpoints
//!
//! - Auth: `/user/login`, `/user/signup`, `/auth/*`, `/user/change-password`
//! - Catalog: `/book`
//! - Orders: `/orders`
//! - Payment: `/api/checkout`, `/api/paymentverification`
//! - Newsletter: `/send-email`, `/emails`
//! - Users: `/user`
//! - Contact: `/contact/send`

mod http;
mod types;

pub use http::HttpBackend;
pub use types::*;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use booknest_core::{BookId, Email, Money, OrderId, OrderStatus, SubscriberId, UserId};

use crate::models::{Book, BookDraft, Order, RemoteOrder};

/// Errors that can occur when talking to the BookNest API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend could not be reached at all.
    #[error("Network unavailable: {0}")]
    Unreachable(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rejected credentials or missing authorization (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request conflicts with existing state (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether the request never got an HTTP response.
    #[must_use]
    pub fn is_network(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Unreachable(_) => true,
            _ => false,
        }
    }

    /// The HTTP status, when the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::Conflict(_) => Some(409),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Unreachable(_) | Self::Parse(_) => None,
        }
    }

    /// Server-supplied message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. }
            | Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => Some(message),
            _ => None,
        }
    }
}

// =============================================================================
// Ports
// =============================================================================

/// Account authentication.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /user/login`.
    async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthResponse, ApiError>;

    /// `POST /user/signup`.
    async fn signup(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/forgot-password`.
    async fn forgot_password(&self, email: &Email) -> Result<(), ApiError>;

    /// `POST /auth/reset-password`.
    async fn reset_password(&self, token: &str, new_password: &SecretString) -> Result<(), ApiError>;

    /// `PUT /user/change-password`.
    async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<ChangePasswordResponse, ApiError>;
}

/// Book catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_books(&self) -> Result<Vec<Book>, ApiError>;
    async fn get_book(&self, id: &BookId) -> Result<Book, ApiError>;
    async fn create_book(&self, draft: &BookDraft) -> Result<Book, ApiError>;
    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<Book, ApiError>;
    async fn delete_book(&self, id: &BookId) -> Result<(), ApiError>;
}

/// Server-side order records.
#[async_trait]
pub trait OrdersApi: Send + Sync {
    async fn list_orders(&self) -> Result<Vec<RemoteOrder>, ApiError>;

    /// Mirror a locally completed order. `token` is sent as a bearer token.
    async fn create_order(&self, order: &Order, token: Option<&str>) -> Result<(), ApiError>;

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), ApiError>;
}

/// Payment gateway handshake.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// `POST /api/checkout`.
    async fn create_payment(&self, amount: Money) -> Result<PaymentIntent, ApiError>;

    /// `POST /api/paymentverification`.
    async fn verify_payment(&self, verification: &PaymentVerification) -> Result<bool, ApiError>;
}

/// Newsletter e-mail capture.
#[async_trait]
pub trait NewsletterApi: Send + Sync {
    /// `POST /send-email`.
    async fn send_email(&self, message: &EmailMessage) -> Result<SendEmailResponse, ApiError>;

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, ApiError>;
    async fn delete_subscriber(&self, id: &SubscriberId) -> Result<(), ApiError>;
}

/// Registered accounts.
#[async_trait]
pub trait UsersApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<RemoteUser>, ApiError>;
}

/// The contact form.
#[async_trait]
pub trait ContactApi: Send + Sync {
    /// `POST /contact/send`.
    async fn send_contact(&self, message: &ContactMessage) -> Result<ContactResponse, ApiError>;
}

/// Every port at once.
pub trait Backend:
    AuthApi + CatalogApi + OrdersApi + PaymentApi + NewsletterApi + UsersApi + ContactApi
{
}

impl<T> Backend for T where
    T: AuthApi + CatalogApi + OrdersApi + PaymentApi + NewsletterApi + UsersApi + ContactApi
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        assert!(ApiError::Unreachable("connection refused".to_string()).is_network());
        assert!(
            !ApiError::Api {
                status: 500,
                message: "boom".to_string()
            }
            .is_network()
        );
        assert!(!ApiError::Unauthorized("nope".to_string()).is_network());
    }

    #[test]
    fn test_status_and_message() {
        let err = ApiError::Conflict("User already exists".to_string());
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.message(), Some("User already exists"));
        assert_eq!(ApiError::Parse("bad".to_string()).status(), None);
    }
}
