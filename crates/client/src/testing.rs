//! Test fixtures and an in-process fake backend.
//!
//! Compiled for this crate's tests and, with the `test-util` feature, for
//! downstream test crates.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use secrecy::SecretString;

use booknest_core::{
    BookId, Email, Money, OrderId, OrderStatus, Quantity, Role, SubscriberId, UserId,
};

use crate::api::{
    ApiError, AuthApi, AuthResponse, CatalogApi, ChangePasswordResponse, ContactApi,
    ContactMessage, ContactResponse, EmailMessage, GatewayOrder, NewsletterApi, OrdersApi,
    PaymentApi, PaymentIntent, PaymentVerification, RemoteUser, SendEmailResponse, Subscriber,
    UsersApi,
};
use crate::models::session::keys;
use crate::models::{
    Book, BookDraft, LineItem, Order, PaymentCard, PaymentSummary, RemoteOrder, Session,
    ShippingAddress,
};
use crate::store::ClientStore;

// =============================================================================
// Fixtures
// =============================================================================

/// A catalog book priced at `cents`.
#[must_use]
pub fn book(id: &str, cents: i64) -> Book {
    Book {
        id: BookId::new(id),
        name: format!("Book {id}"),
        title: None,
        author: "Anonymous".to_string(),
        price: Money::from_cents(cents),
        original_price: None,
        category: "Fiction".to_string(),
        image: format!("{id}.jpg"),
        description: String::new(),
        rating: None,
        discount: None,
    }
}

/// A plain user session.
#[must_use]
pub fn session(id: &str) -> Session {
    session_as(id, Role::User)
}

fn session_as(id: &str, role: Role) -> Session {
    Session {
        id: UserId::new(id),
        name: format!("User {id}"),
        email: Email::parse(&format!("{}@booknest.dev", id.to_lowercase()))
            .unwrap_or_else(|e| panic!("fixture id {id} is not a valid mailbox: {e}")),
        role,
        token: None,
        password_last_changed: None,
    }
}

/// Persist a user session directly, bypassing the auth service.
pub fn log_in(store: &ClientStore, id: &str) -> Session {
    log_in_as(store, id, Role::User)
}

/// Persist a session with the given role.
///
/// # Panics
///
/// Panics if the store rejects the write.
pub fn log_in_as(store: &ClientStore, id: &str, role: Role) -> Session {
    let session = session_as(id, role);
    store
        .transaction(|tx| tx.set_value(keys::USER, &session))
        .unwrap_or_else(|e| panic!("failed to store session: {e}"));
    session
}

/// A bus handler that counts invocations.
pub fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    (count, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

/// A filled-in shipping form.
#[must_use]
pub fn shipping() -> ShippingAddress {
    ShippingAddress {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@booknest.dev".to_string(),
        phone: "555-0100".to_string(),
        address: "12 St James's Square".to_string(),
        city: "London".to_string(),
        state: "Greater London".to_string(),
        zip_code: "SW1Y 4JH".to_string(),
    }
}

/// A card that passes validation.
#[must_use]
pub fn card() -> PaymentCard {
    PaymentCard {
        name: "Ada Lovelace".to_string(),
        number: "4111 1111 1111 1111".to_string(),
        expiry: "12/30".to_string(),
        cvc: "123".to_string(),
    }
}

/// A completed one-line order.
#[must_use]
pub fn order(id: &str) -> Order {
    let line = LineItem::new(book("b1", 1000), Quantity::ONE);
    Order {
        id: OrderId::new(id),
        user_id: None,
        items: vec![line],
        shipping: shipping(),
        payment: PaymentSummary {
            card_last4: "1111".to_string(),
            reference: format!("pay_{id}"),
        },
        subtotal: Money::from_cents(1000),
        shipping_cost: Money::from_cents(599),
        tax: Money::from_cents(70),
        total: Money::from_cents(1669),
        status: OrderStatus::Processing,
        created_at: Utc
            .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}

/// A backend user document.
#[must_use]
pub fn remote_user(id: &str, name: &str, email: &str) -> RemoteUser {
    RemoteUser {
        id: UserId::new(id),
        fullname: name.to_string(),
        email: email.to_string(),
        role: None,
        password_last_changed: None,
        created_at: None,
    }
}

// =============================================================================
// Fake backend
// =============================================================================

type ErrorFactory = Box<dyn Fn() -> ApiError + Send + Sync>;

#[derive(Default)]
struct FakeState {
    offline: bool,
    auth_user: Option<(RemoteUser, Option<String>)>,
    auth_failure: Option<ErrorFactory>,
    mirror_fails: bool,
    payments_declined: bool,
    books: Vec<Book>,
    next_book: usize,
    orders: Vec<RemoteOrder>,
    created_orders: Vec<Order>,
    status_updates: Vec<(OrderId, OrderStatus)>,
    email_response: Option<SendEmailResponse>,
    sent_emails: Vec<EmailMessage>,
    subscribers: Vec<Subscriber>,
    users: Vec<RemoteUser>,
    contact_response: Option<ContactResponse>,
    sent_contacts: Vec<ContactMessage>,
    calls: BTreeMap<&'static str, usize>,
}

/// In-process implementation of every API port.
///
/// Records calls and lets tests script failures.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl std::fmt::Debug for FakeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeBackend").finish_non_exhaustive()
    }
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and fail if offline.
    fn enter(&self, name: &'static str) -> Result<MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.state();
        *state.calls.entry(name).or_default() += 1;
        if state.offline {
            return Err(ApiError::Unreachable("connection refused".to_string()));
        }
        Ok(state)
    }

    /// Every call from now on fails as unreachable.
    pub fn go_offline(&self) {
        self.state().offline = true;
    }

    /// User (and token) returned by login and signup.
    pub fn set_login_user(&self, user: RemoteUser, token: Option<&str>) {
        self.state().auth_user = Some((user, token.map(str::to_string)));
    }

    /// Make every auth call fail with the produced error.
    pub fn fail_auth_with(&self, error: impl Fn() -> ApiError + Send + Sync + 'static) {
        self.state().auth_failure = Some(Box::new(error));
    }

    /// Make order creation fail.
    pub fn fail_mirror(&self) {
        self.state().mirror_fails = true;
    }

    /// Make the gateway refuse payments.
    pub fn decline_payments(&self) {
        self.state().payments_declined = true;
    }

    pub fn seed_books(&self, books: Vec<Book>) {
        self.state().books = books;
    }

    pub fn seed_orders(&self, orders: Vec<RemoteOrder>) {
        self.state().orders = orders;
    }

    pub fn seed_subscribers(&self, subscribers: Vec<Subscriber>) {
        self.state().subscribers = subscribers;
    }

    pub fn seed_users(&self, users: Vec<RemoteUser>) {
        self.state().users = users;
    }

    pub fn set_email_response(&self, response: SendEmailResponse) {
        self.state().email_response = Some(response);
    }

    /// Answer `send_contact` with `response` instead of a plain success.
    pub fn set_contact_response(&self, response: ContactResponse) {
        self.state().contact_response = Some(response);
    }

    /// How many times the named port method was called.
    #[must_use]
    pub fn calls(&self, name: &str) -> usize {
        self.state().calls.get(name).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn books(&self) -> Vec<Book> {
        self.state().books.clone()
    }

    /// Orders received through `create_order`.
    #[must_use]
    pub fn created_orders(&self) -> Vec<Order> {
        self.state().created_orders.clone()
    }

    #[must_use]
    pub fn status_updates(&self) -> Vec<(OrderId, OrderStatus)> {
        self.state().status_updates.clone()
    }

    #[must_use]
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.state().sent_emails.clone()
    }

    #[must_use]
    pub fn sent_contacts(&self) -> Vec<ContactMessage> {
        self.state().sent_contacts.clone()
    }

    fn auth_result(
        state: &FakeState,
        email: &Email,
        name: Option<&str>,
    ) -> Result<AuthResponse, ApiError> {
        if let Some(failure) = &state.auth_failure {
            return Err(failure());
        }
        let (user, token) = state.auth_user.clone().unwrap_or_else(|| {
            let local = email.local_part();
            (
                remote_user(&format!("u-{local}"), name.unwrap_or(local), email.as_str()),
                None,
            )
        });
        Ok(AuthResponse { user, token })
    }
}

fn book_from_draft(id: BookId, draft: &BookDraft) -> Book {
    Book {
        id,
        name: draft.name.clone(),
        title: None,
        author: draft.author.clone(),
        price: draft.price,
        original_price: draft.original_price,
        category: draft.category.clone(),
        image: draft.image.clone(),
        description: draft.description.clone(),
        rating: draft.rating,
        discount: draft.discount,
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, email: &Email, _password: &SecretString) -> Result<AuthResponse, ApiError> {
        let state = self.enter("login")?;
        Self::auth_result(&state, email, None)
    }

    async fn signup(
        &self,
        name: &str,
        email: &Email,
        _password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let state = self.enter("signup")?;
        Self::auth_result(&state, email, Some(name))
    }

    async fn forgot_password(&self, _email: &Email) -> Result<(), ApiError> {
        let state = self.enter("forgot_password")?;
        state.auth_failure.as_ref().map_or(Ok(()), |f| Err(f()))
    }

    async fn reset_password(&self, _token: &str, _new: &SecretString) -> Result<(), ApiError> {
        let state = self.enter("reset_password")?;
        state.auth_failure.as_ref().map_or(Ok(()), |f| Err(f()))
    }

    async fn change_password(
        &self,
        _user_id: &UserId,
        _current: &SecretString,
        _new: &SecretString,
    ) -> Result<ChangePasswordResponse, ApiError> {
        let state = self.enter("change_password")?;
        if let Some(failure) = &state.auth_failure {
            return Err(failure());
        }
        Ok(ChangePasswordResponse {
            success: true,
            user: None,
            message: None,
        })
    }
}

#[async_trait]
impl CatalogApi for FakeBackend {
    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        Ok(self.enter("list_books")?.books.clone())
    }

    async fn get_book(&self, id: &BookId) -> Result<Book, ApiError> {
        self.enter("get_book")?
            .books
            .iter()
            .find(|b| &b.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Book {id} not found")))
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<Book, ApiError> {
        let mut state = self.enter("create_book")?;
        state.next_book += 1;
        let book = book_from_draft(BookId::new(format!("new-{}", state.next_book)), draft);
        state.books.push(book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<Book, ApiError> {
        let mut state = self.enter("update_book")?;
        let slot = state
            .books
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Book {id} not found")))?;
        *slot = book_from_draft(id.clone(), draft);
        Ok(slot.clone())
    }

    async fn delete_book(&self, id: &BookId) -> Result<(), ApiError> {
        let mut state = self.enter("delete_book")?;
        let before = state.books.len();
        state.books.retain(|b| &b.id != id);
        if state.books.len() == before {
            return Err(ApiError::NotFound(format!("Book {id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl OrdersApi for FakeBackend {
    async fn list_orders(&self) -> Result<Vec<RemoteOrder>, ApiError> {
        Ok(self.enter("list_orders")?.orders.clone())
    }

    async fn create_order(&self, order: &Order, _token: Option<&str>) -> Result<(), ApiError> {
        let mut state = self.enter("create_order")?;
        if state.mirror_fails {
            return Err(ApiError::Api {
                status: 500,
                message: "Failed to save order".to_string(),
            });
        }
        state.created_orders.push(order.clone());
        Ok(())
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), ApiError> {
        let mut state = self.enter("update_order_status")?;
        state.status_updates.push((id.clone(), status));
        if let Some(order) = state.orders.iter_mut().find(|o| &o.id == id) {
            order.status = Some(status);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentApi for FakeBackend {
    async fn create_payment(&self, _amount: Money) -> Result<PaymentIntent, ApiError> {
        let state = self.enter("create_payment")?;
        if state.payments_declined {
            return Ok(PaymentIntent {
                success: false,
                order: None,
            });
        }
        Ok(PaymentIntent {
            success: true,
            order: Some(GatewayOrder {
                id: "order_fake".to_string(),
            }),
        })
    }

    async fn verify_payment(&self, _verification: &PaymentVerification) -> Result<bool, ApiError> {
        let state = self.enter("verify_payment")?;
        Ok(!state.payments_declined)
    }
}

#[async_trait]
impl NewsletterApi for FakeBackend {
    async fn send_email(&self, message: &EmailMessage) -> Result<SendEmailResponse, ApiError> {
        let mut state = self.enter("send_email")?;
        state.sent_emails.push(message.clone());
        Ok(state.email_response.clone().unwrap_or(SendEmailResponse {
            success: true,
            email_saved: true,
            already_subscribed: false,
        }))
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, ApiError> {
        Ok(self.enter("list_subscribers")?.subscribers.clone())
    }

    async fn delete_subscriber(&self, id: &SubscriberId) -> Result<(), ApiError> {
        let mut state = self.enter("delete_subscriber")?;
        let before = state.subscribers.len();
        state.subscribers.retain(|s| &s.id != id);
        if state.subscribers.len() == before {
            return Err(ApiError::NotFound(format!("Subscriber {id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl ContactApi for FakeBackend {
    async fn send_contact(&self, message: &ContactMessage) -> Result<ContactResponse, ApiError> {
        let mut state = self.enter("send_contact")?;
        state.sent_contacts.push(message.clone());
        Ok(state.contact_response.clone().unwrap_or(ContactResponse {
            success: true,
            message: Some("Message sent successfully".to_string()),
        }))
    }
}

#[async_trait]
impl UsersApi for FakeBackend {
    async fn list_users(&self) -> Result<Vec<RemoteUser>, ApiError> {
        Ok(self.enter("list_users")?.users.clone())
    }
}
