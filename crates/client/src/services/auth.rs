//! Session lifecycle: login, registration, password management, logout.
//!
//! The persisted [`Session`] under `user` is the single source of truth for
//! who is signed in. Writes to it (and to `token`) happen in one store
//! transaction so subscribers see one change per login or logout.

use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use booknest_core::{Email, Role, UserId};

use super::validation::{validate_email, validate_name, validate_new_password};
use crate::api::{ApiError, AuthApi};
use crate::config::OfflineFallback;
use crate::error::{ClientError, Result, ValidationError};
use crate::models::Session;
use crate::models::session::keys;
use crate::store::{ClientStore, Collection};

/// Authentication and session management.
#[derive(Clone)]
pub struct AuthService {
    store: ClientStore,
    api: Arc<dyn AuthApi>,
    fallback: OfflineFallback,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    #[must_use]
    pub fn new(store: ClientStore, api: Arc<dyn AuthApi>, fallback: OfflineFallback) -> Self {
        Self {
            store,
            api,
            fallback,
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.store.current_session()
    }

    /// Admin by role or by the separately persisted override flag.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.store.is_admin()
    }

    /// Persist the admin override flag.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    pub fn set_admin_override(&self, enabled: bool) -> Result<()> {
        self.store
            .transaction(|tx| tx.set_value(keys::ADMIN_VERIFIED, &enabled))?;
        info!(enabled, "Admin override updated");
        Ok(())
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input (nothing is sent)
    /// - `InvalidCredentials` when the backend rejects the login
    /// - `NetworkUnavailable` when the backend is unreachable and the
    ///   offline fallback is disabled
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session> {
        let email = validate_email(email)?;
        if password.expose_secret().is_empty() {
            return Err(ValidationError::MissingField("Password").into());
        }

        let session = match self.api.login(&email, password).await {
            Ok(response) => {
                let mut session = response.user.to_session(role_hint(&email), response.token)?;
                session.password_last_changed.get_or_insert_with(Utc::now);
                session
            }
            Err(e) if e.is_network() && self.fallback == OfflineFallback::Mock => {
                warn!(email = %email, error = %e, "Backend unreachable, fabricating offline session");
                offline_session(UserId::new("1"), email.local_part().to_string(), email.clone())
            }
            Err(e) => return Err(classify_login_error(e)),
        };

        self.persist(&session)?;
        info!(user_id = %session.id, role = %session.role, "Logged in");
        Ok(session)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input (nothing is sent)
    /// - `AccountExists` when the e-mail is already registered
    /// - `NetworkUnavailable` when the backend is unreachable and the
    ///   offline fallback is disabled
    #[instrument(skip(self, password, confirmation))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<Session> {
        let name = validate_name(name)?;
        let email = validate_email(email)?;
        validate_new_password(password, confirmation)?;

        let session = match self.api.signup(&name, &email, password).await {
            Ok(response) => {
                let mut session = response.user.to_session(Role::User, response.token)?;
                session.role = Role::User;
                session
            }
            Err(e) if e.is_network() && self.fallback == OfflineFallback::Mock => {
                warn!(email = %email, error = %e, "Backend unreachable, fabricating offline account");
                let id = UserId::new(Utc::now().timestamp_millis().to_string());
                let mut session = offline_session(id, name, email);
                session.role = Role::User;
                session
            }
            Err(e) if is_duplicate_account(&e) => return Err(ClientError::AccountExists),
            Err(e) => return Err(e.into()),
        };

        self.persist(&session)?;
        info!(user_id = %session.id, "Registered");
        Ok(session)
    }

    /// Ask the backend to e-mail a reset link.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed address, otherwise backend failures.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let email = validate_email(email)?;
        match self.api.forgot_password(&email).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_network() && self.fallback == OfflineFallback::Mock => {
                warn!(email = %email, error = %e, "Backend unreachable, pretending reset link was sent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Set a new password using the token from a reset link.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank token or bad password, otherwise backend
    /// failures.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<()> {
        if token.trim().is_empty() {
            return Err(ValidationError::MissingField("Reset token").into());
        }
        validate_new_password(new_password, confirmation)?;

        match self.api.reset_password(token.trim(), new_password).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_network() && self.fallback == OfflineFallback::Mock => {
                warn!(error = %e, "Backend unreachable, pretending password was reset");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Change the signed-in user's password and refresh the stored session.
    ///
    /// # Errors
    ///
    /// - `LoginRequired` without a session
    /// - `InvalidCredentials` when the current password is wrong
    /// - `NetworkUnavailable` when the backend is unreachable and the
    ///   offline fallback is disabled
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current_password: &SecretString,
        new_password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<Session> {
        let current = self
            .store
            .current_session()
            .ok_or(ValidationError::LoginRequired)?;
        if current_password.expose_secret().is_empty() {
            return Err(ValidationError::MissingField("Current password").into());
        }
        validate_new_password(new_password, confirmation)?;

        let refreshed = match self
            .api
            .change_password(&current.id, current_password, new_password)
            .await
        {
            Ok(response) if response.success => {
                let mut session = match response.user {
                    Some(user) => user.to_session(current.role, current.token.clone())?,
                    None => current.clone(),
                };
                session.password_last_changed =
                    session.password_last_changed.or_else(|| Some(Utc::now()));
                session
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Failed to update password".to_string());
                return Err(ClientError::InvalidCredentials(message));
            }
            Err(e) if e.is_network() && self.fallback == OfflineFallback::Mock => {
                warn!(user_id = %current.id, error = %e, "Backend unreachable, recording password change locally");
                Session {
                    password_last_changed: Some(Utc::now()),
                    ..current
                }
            }
            Err(ApiError::Unauthorized(_)) => {
                return Err(ClientError::InvalidCredentials(
                    "Current password is incorrect".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        self.persist(&refreshed)?;
        info!(user_id = %refreshed.id, "Password changed");
        Ok(refreshed)
    }

    /// Sign out.
    ///
    /// Removes the session, the admin flag, the token and the user's cart and
    /// wishlist. The user's order history stays.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if a removal fails.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<()> {
        let session = self.store.current_session();
        self.store.transaction(|tx| {
            tx.remove(keys::USER)?;
            tx.remove(keys::ADMIN_VERIFIED)?;
            tx.remove(keys::TOKEN)?;
            if let Some(session) = &session {
                tx.remove(&crate::store::scoped_key(Collection::Cart, Some(session)))?;
                tx.remove(&crate::store::scoped_key(Collection::Wishlist, Some(session)))?;
            }
            Ok(())
        })?;
        if let Some(session) = session {
            info!(user_id = %session.id, "Logged out");
        }
        Ok(())
    }

    fn persist(&self, session: &Session) -> Result<()> {
        self.store.transaction(|tx| {
            tx.set_value(keys::USER, session)?;
            match &session.token {
                Some(token) => tx.set_value(keys::TOKEN, token),
                None => tx.remove(keys::TOKEN),
            }
        })?;
        Ok(())
    }
}

/// Role to assume when the backend does not say.
fn role_hint(email: &Email) -> Role {
    if email.as_str().contains("admin") {
        Role::Admin
    } else {
        Role::User
    }
}

fn offline_session(id: UserId, name: String, email: Email) -> Session {
    let role = role_hint(&email);
    Session {
        id,
        name,
        email,
        role,
        token: None,
        password_last_changed: Some(Utc::now()),
    }
}

fn classify_login_error(err: ApiError) -> ClientError {
    match err.status() {
        Some(status) if (400..500).contains(&status) => ClientError::InvalidCredentials(
            err.message()
                .map_or_else(|| "Invalid email or password".to_string(), str::to_string),
        ),
        _ => err.into(),
    }
}

fn is_duplicate_account(err: &ApiError) -> bool {
    matches!(err, ApiError::Conflict(_))
        || err
            .message()
            .is_some_and(|m| m.to_lowercase().contains("already exists"))
}
