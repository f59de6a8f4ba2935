//! `reqwest` implementation of the API ports.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use booknest_core::{BookId, Email, Money, OrderId, OrderStatus, SubscriberId, UserId};

use super::types::VerificationResponse;
use super::{
    ApiError, AuthApi, AuthResponse, CatalogApi, ChangePasswordResponse, ContactApi,
    ContactMessage, ContactResponse, EmailMessage, NewsletterApi, OrdersApi, PaymentApi,
    PaymentIntent, PaymentVerification, RemoteUser, SendEmailResponse, Subscriber, UsersApi,
};
use crate::config::ClientConfig;
use crate::models::{Book, BookDraft, Order, RemoteOrder};

/// HTTP client for the BookNest backend.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    fullname: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct EmailOnly<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    user_id: &'a str,
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
struct AmountRequest {
    amount: Money,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: OrderStatus,
}

impl HttpBackend {
    /// Create a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.post(self.url(path)).json(body).send().await?;
        handle_response(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.put(self.url(path)).json(body).send().await?;
        handle_response(response).await
    }

    /// Send a request whose response body is irrelevant.
    async fn send_unit(&self, request: reqwest::RequestBuilder) -> Result<(), ApiError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(parse_error(response).await)
    }
}

/// Handle API response and parse JSON.
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
    }

    Err(parse_error(response).await)
}

/// Map an error response to an `ApiError`.
async fn parse_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body);
    debug!(status, %message, "API error response");

    match status {
        401 | 403 => ApiError::Unauthorized(message),
        404 => ApiError::NotFound(message),
        409 => ApiError::Conflict(message),
        _ => ApiError::Api { status, message },
    }
}

/// The backend reports errors as `{"message": ..}` or `{"error": ..}`.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                "Unknown error".to_string()
            } else {
                body.to_string()
            }
        })
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

// =============================================================================
// Ports
// =============================================================================

#[async_trait]
impl AuthApi for HttpBackend {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthResponse, ApiError> {
        self.post(
            "/user/login",
            &Credentials {
                email: email.as_str(),
                password: password.expose_secret(),
            },
        )
        .await
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn signup(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        self.post(
            "/user/signup",
            &SignupRequest {
                fullname: name,
                email: email.as_str(),
                password: password.expose_secret(),
            },
        )
        .await
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn forgot_password(&self, email: &Email) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.url("/auth/forgot-password"))
            .json(&EmailOnly {
                email: email.as_str(),
            });
        self.send_unit(request).await
    }

    #[instrument(skip_all)]
    async fn reset_password(&self, token: &str, new_password: &SecretString) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.url("/auth/reset-password"))
            .json(&ResetPasswordRequest {
                token,
                new_password: new_password.expose_secret(),
            });
        self.send_unit(request).await
    }

    #[instrument(skip(self, current_password, new_password), fields(user_id = %user_id))]
    async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<ChangePasswordResponse, ApiError> {
        self.put(
            "/user/change-password",
            &ChangePasswordRequest {
                user_id: user_id.as_str(),
                current_password: current_password.expose_secret(),
                new_password: new_password.expose_secret(),
            },
        )
        .await
    }
}

#[async_trait]
impl CatalogApi for HttpBackend {
    #[instrument(skip(self))]
    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        self.get("/book").await
    }

    #[instrument(skip(self), fields(book_id = %id))]
    async fn get_book(&self, id: &BookId) -> Result<Book, ApiError> {
        self.get(&format!("/book/{}", encode(id.as_str()))).await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create_book(&self, draft: &BookDraft) -> Result<Book, ApiError> {
        self.post("/book", draft).await
    }

    #[instrument(skip(self, draft), fields(book_id = %id))]
    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<Book, ApiError> {
        self.put(&format!("/book/{}", encode(id.as_str())), draft)
            .await
    }

    #[instrument(skip(self), fields(book_id = %id))]
    async fn delete_book(&self, id: &BookId) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .delete(self.url(&format!("/book/{}", encode(id.as_str()))));
        self.send_unit(request).await
    }
}

#[async_trait]
impl OrdersApi for HttpBackend {
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<RemoteOrder>, ApiError> {
        self.get("/orders").await
    }

    #[instrument(skip(self, order, token), fields(order_id = %order.id))]
    async fn create_order(&self, order: &Order, token: Option<&str>) -> Result<(), ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::Parse(format!("Invalid token format: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        let request = self
            .inner
            .client
            .post(self.url("/orders"))
            .headers(headers)
            .json(order);
        self.send_unit(request).await
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .patch(self.url(&format!("/orders/{}", encode(id.as_str()))))
            .json(&StatusUpdate { status });
        self.send_unit(request).await
    }
}

#[async_trait]
impl PaymentApi for HttpBackend {
    #[instrument(skip(self), fields(amount = %amount))]
    async fn create_payment(&self, amount: Money) -> Result<PaymentIntent, ApiError> {
        self.post("/api/checkout", &AmountRequest { amount }).await
    }

    #[instrument(skip(self, verification), fields(gateway_order = %verification.razorpay_order_id))]
    async fn verify_payment(&self, verification: &PaymentVerification) -> Result<bool, ApiError> {
        let response: VerificationResponse =
            self.post("/api/paymentverification", verification).await?;
        Ok(response.success)
    }
}

#[async_trait]
impl NewsletterApi for HttpBackend {
    #[instrument(skip(self, message), fields(email = %message.email))]
    async fn send_email(&self, message: &EmailMessage) -> Result<SendEmailResponse, ApiError> {
        self.post("/send-email", message).await
    }

    #[instrument(skip(self))]
    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, ApiError> {
        self.get("/emails").await
    }

    #[instrument(skip(self), fields(subscriber_id = %id))]
    async fn delete_subscriber(&self, id: &SubscriberId) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .delete(self.url(&format!("/emails/{}", encode(id.as_str()))));
        self.send_unit(request).await
    }
}

#[async_trait]
impl UsersApi for HttpBackend {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<RemoteUser>, ApiError> {
        self.get("/user").await
    }
}

#[async_trait]
impl ContactApi for HttpBackend {
    #[instrument(skip(self, message), fields(email = %message.email))]
    async fn send_contact(&self, message: &ContactMessage) -> Result<ContactResponse, ApiError> {
        self.post("/contact/send", message).await
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}
