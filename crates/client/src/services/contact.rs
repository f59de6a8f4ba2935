//! Contact form.

use std::sync::Arc;

use tracing::{info, instrument};

use super::validation::{validate_email, validate_name};
use crate::api::{ApiError, ContactApi, ContactMessage};
use crate::error::{Result, ValidationError};

/// Sends contact-form messages to the store's inbox.
#[derive(Clone)]
pub struct ContactService {
    api: Arc<dyn ContactApi>,
}

impl std::fmt::Debug for ContactService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactService").finish_non_exhaustive()
    }
}

impl ContactService {
    #[must_use]
    pub fn new(api: Arc<dyn ContactApi>) -> Self {
        Self { api }
    }

    /// Send a message. Returns the confirmation the server gave.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank field or malformed e-mail; nothing is sent
    /// - `Api` carrying the server's message when it reports a failure
    #[instrument(skip(self, message))]
    pub async fn send(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<String> {
        let name = validate_name(name)?;
        let email = validate_email(email)?;
        let subject = required(subject, "Subject")?;
        let message = required(message, "Message")?;

        let response = self
            .api
            .send_contact(&ContactMessage {
                name,
                email: email.as_str().to_string(),
                subject,
                message,
            })
            .await?;

        if !response.success {
            return Err(ApiError::Api {
                status: 200,
                message: response
                    .message
                    .unwrap_or_else(|| "Failed to send message. Please try again.".to_string()),
            }
            .into());
        }
        info!(email = %email, "Contact message sent");
        Ok(response
            .message
            .unwrap_or_else(|| "Message sent successfully".to_string()))
    }
}

fn required(raw: &str, label: &'static str) -> std::result::Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(label));
    }
    Ok(trimmed.to_string())
}
