//! Client state shared across front ends.

use std::sync::Arc;

use crate::api::{
    ApiError, AuthApi, Backend, CatalogApi, ContactApi, HttpBackend, NewsletterApi, OrdersApi,
    PaymentApi, UsersApi,
};
use crate::config::ClientConfig;
use crate::services::{
    AdminService, AuthService, CartService, CatalogService, CheckoutService, ContactService,
    NewsletterService, OrderHistory, WishlistService,
};
use crate::storage::{FileStorage, KeyValueStorage};
use crate::store::ClientStore;

/// Everything a front end needs: configuration, the state store and the
/// backend ports.
///
/// This struct is cheaply cloneable via `Arc`. Services are built on demand
/// and share the same store, so a write through one is visible to all.
#[derive(Clone)]
pub struct ClientState {
    inner: Arc<ClientStateInner>,
}

struct ClientStateInner {
    config: ClientConfig,
    store: ClientStore,
    auth: Arc<dyn AuthApi>,
    catalog: Arc<dyn CatalogApi>,
    orders: Arc<dyn OrdersApi>,
    payments: Arc<dyn PaymentApi>,
    newsletter: Arc<dyn NewsletterApi>,
    users: Arc<dyn UsersApi>,
    contact: Arc<dyn ContactApi>,
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("config", &self.inner.config)
            .field("store", &self.inner.store)
            .finish_non_exhaustive()
    }
}

impl ClientState {
    /// Create client state over `storage`, talking to `backend`.
    #[must_use]
    pub fn new<B: Backend + 'static>(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStorage>,
        backend: Arc<B>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientStateInner {
                config,
                store: ClientStore::new(storage),
                auth: backend.clone(),
                catalog: backend.clone(),
                orders: backend.clone(),
                payments: backend.clone(),
                newsletter: backend.clone(),
                users: backend.clone(),
                contact: backend,
            }),
        }
    }

    /// File-backed state at `config.state_path` against the HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn open(config: ClientConfig) -> Result<Self, ApiError> {
        let backend = Arc::new(HttpBackend::new(&config)?);
        let storage = Arc::new(FileStorage::open(&config.state_path));
        Ok(Self::new(config, storage, backend))
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &ClientStore {
        &self.inner.store
    }

    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(
            self.inner.store.clone(),
            self.inner.auth.clone(),
            self.inner.config.offline_fallback,
        )
    }

    #[must_use]
    pub fn cart(&self) -> CartService {
        CartService::new(self.inner.store.clone())
    }

    #[must_use]
    pub fn wishlist(&self) -> WishlistService {
        WishlistService::new(self.inner.store.clone())
    }

    #[must_use]
    pub fn orders(&self) -> OrderHistory {
        OrderHistory::new(self.inner.store.clone())
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(
            self.inner.store.clone(),
            self.inner.payments.clone(),
            self.inner.orders.clone(),
        )
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.inner.catalog.clone())
    }

    #[must_use]
    pub fn newsletter(&self) -> NewsletterService {
        NewsletterService::new(self.inner.newsletter.clone())
    }

    #[must_use]
    pub fn contact(&self) -> ContactService {
        ContactService::new(self.inner.contact.clone())
    }

    #[must_use]
    pub fn admin(&self) -> AdminService {
        AdminService::new(
            self.inner.store.clone(),
            self.inner.catalog.clone(),
            self.inner.orders.clone(),
            self.inner.newsletter.clone(),
            self.inner.users.clone(),
        )
    }
}
