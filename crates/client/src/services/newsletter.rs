//! Newsletter sign-up.

use std::sync::Arc;

use tracing::{info, instrument};

use super::validation::validate_email;
use crate::api::{ApiError, EmailMessage, NewsletterApi};
use crate::error::Result;

/// Result of a sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Subscribed,
    AlreadySubscribed,
}

/// Captures newsletter e-mails.
#[derive(Clone)]
pub struct NewsletterService {
    api: Arc<dyn NewsletterApi>,
}

impl std::fmt::Debug for NewsletterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsletterService").finish_non_exhaustive()
    }
}

impl NewsletterService {
    #[must_use]
    pub fn new(api: Arc<dyn NewsletterApi>) -> Self {
        Self { api }
    }

    /// Subscribe `email` and send the welcome message.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed address (nothing is sent), otherwise
    /// backend failures. A response that confirms neither delivery nor
    /// storage is an API error.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, email: &str) -> Result<SignupOutcome> {
        let email = validate_email(email)?;
        let response = self.api.send_email(&EmailMessage::welcome(&email)).await?;

        if !(response.success || response.email_saved) {
            return Err(ApiError::Api {
                status: 200,
                message: "Something went wrong. Please try again.".to_string(),
            }
            .into());
        }

        let outcome = if response.already_subscribed {
            SignupOutcome::AlreadySubscribed
        } else {
            SignupOutcome::Subscribed
        };
        info!(email = %email, ?outcome, "Newsletter subscription");
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::SendEmailResponse;
    use crate::error::{ClientError, ValidationError};
    use crate::testing::FakeBackend;

    fn service(backend: &Arc<FakeBackend>) -> NewsletterService {
        NewsletterService::new(backend.clone())
    }

    #[tokio::test]
    async fn test_subscribe() {
        let backend = Arc::new(FakeBackend::new());
        let outcome = service(&backend).subscribe("reader@booknest.dev").await.unwrap();
        assert_eq!(outcome, SignupOutcome::Subscribed);
        assert_eq!(backend.sent_emails().first().unwrap().email, "reader@booknest.dev");
    }

    #[tokio::test]
    async fn test_already_subscribed() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_email_response(SendEmailResponse {
            success: false,
            email_saved: true,
            already_subscribed: true,
        });
        let outcome = service(&backend).subscribe("reader@booknest.dev").await.unwrap();
        assert_eq!(outcome, SignupOutcome::AlreadySubscribed);
    }

    #[tokio::test]
    async fn test_unconfirmed_response_is_error() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_email_response(SendEmailResponse::default());
        let err = service(&backend).subscribe("reader@booknest.dev").await.unwrap_err();
        assert!(matches!(err, ClientError::Api(_)));
    }

    #[tokio::test]
    async fn test_bad_address_sends_nothing() {
        let backend = Arc::new(FakeBackend::new());
        let err = service(&backend).subscribe("reader@booknest").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::InvalidEmail(_))));
        assert!(backend.sent_emails().is_empty());
    }
}
