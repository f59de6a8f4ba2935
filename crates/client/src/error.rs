//! Unified error handling for client operations.
//!
//! Services return `Result<T, ClientError>`. Lower layers keep their own
//! error types (`StorageError`, `ApiError`, `ValidationError`) and convert
//! through `From`, so `?` works across the boundary.

use thiserror::Error;

use booknest_core::{BookId, EmailError, QuantityError};

use crate::api::ApiError;
use crate::storage::StorageError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Form input rejected before anything is sent or stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Please login first")]
    LoginRequired,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Card number must contain at least 12 digits")]
    InvalidCardNumber,

    #[error("Card expiry must look like MM/YY")]
    InvalidExpiry,

    #[error("Card CVC must be 3 or 4 digits")]
    InvalidCvc,

    #[error("Price must be greater than zero")]
    InvalidPrice,

    #[error("Discount must be between 0 and 100")]
    InvalidDiscount,

    #[error("Rating must be between 0 and 5")]
    InvalidRating,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),
}

/// Application-level error type for the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend rejected the credentials.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The backend could not be reached.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Local storage write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Any other backend failure.
    #[error("API error: {0}")]
    Api(ApiError),

    /// Registration with an e-mail that already has an account.
    #[error("An account with this email already exists")]
    AccountExists,

    /// Admin-only operation without admin rights.
    #[error("Admin access required")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The payment gateway declined or could not verify the payment.
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// The book is already in the cart.
    #[error("Book {0} is already in your cart")]
    AlreadyInCart(BookId),
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        if err.is_network() {
            return Self::NetworkUnavailable(err.to_string());
        }
        match err {
            ApiError::NotFound(message) => Self::NotFound(message),
            other => Self::Api(other),
        }
    }
}

impl ClientError {
    /// Short message suitable for showing to the user.
    ///
    /// Internal details (storage paths, parse errors) are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials(message) => {
                if message.is_empty() {
                    "Invalid email or password".to_string()
                } else {
                    message.clone()
                }
            }
            Self::NetworkUnavailable(_) => "Network error. Please check your connection.".to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Storage(_) => "Could not save your changes. Please try again.".to_string(),
            Self::Api(err) => err
                .message()
                .map_or_else(|| "Server error. Please try again.".to_string(), str::to_string),
            Self::AccountExists => "User already exists. Please login instead.".to_string(),
            Self::Forbidden => "You do not have permission to do that.".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::PaymentFailed(reason) => format!("Payment error: {reason}"),
            Self::AlreadyInCart(_) => "Already in cart".to_string(),
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
