//! Admin back-office: catalog, orders, subscribers and the dashboard.
//!
//! Every operation checks [`ClientStore::is_admin`] first and fails with
//! `ClientError::Forbidden` before any request is sent.

mod dashboard;
mod filters;

pub use dashboard::*;
pub use filters::*;

use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument};

use booknest_core::{BookId, OrderId, OrderStatus, SubscriberId};

use super::validation::validate_book_draft;
use crate::api::{CatalogApi, NewsletterApi, OrdersApi, Subscriber, UsersApi};
use crate::error::{ClientError, Result};
use crate::models::{Book, BookDraft, RemoteOrder};
use crate::store::ClientStore;

/// Admin operations against the backend.
#[derive(Clone)]
pub struct AdminService {
    store: ClientStore,
    catalog: Arc<dyn CatalogApi>,
    orders: Arc<dyn OrdersApi>,
    newsletter: Arc<dyn NewsletterApi>,
    users: Arc<dyn UsersApi>,
}

impl fmt::Debug for AdminService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminService").finish_non_exhaustive()
    }
}

impl AdminService {
    #[must_use]
    pub fn new(
        store: ClientStore,
        catalog: Arc<dyn CatalogApi>,
        orders: Arc<dyn OrdersApi>,
        newsletter: Arc<dyn NewsletterApi>,
        users: Arc<dyn UsersApi>,
    ) -> Self {
        Self {
            store,
            catalog,
            orders,
            newsletter,
            users,
        }
    }

    fn ensure_admin(&self) -> Result<()> {
        if self.store.is_admin() {
            Ok(())
        } else {
            Err(ClientError::Forbidden)
        }
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// # Errors
    ///
    /// `Forbidden` for non-admins, otherwise backend failures.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        self.ensure_admin()?;
        Ok(self.catalog.list_books().await?)
    }

    /// # Errors
    ///
    /// `Forbidden` for non-admins, `NotFound` for unknown ids, otherwise
    /// backend failures.
    pub async fn get_book(&self, id: &BookId) -> Result<Book> {
        self.ensure_admin()?;
        Ok(self.catalog.get_book(id).await?)
    }

    /// Validate and create a book.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `Validation`, otherwise backend failures.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_book(&self, draft: BookDraft) -> Result<Book> {
        self.ensure_admin()?;
        let draft = validate_book_draft(draft)?;
        let book = self.catalog.create_book(&draft).await?;
        info!(book_id = %book.id, "Book created");
        Ok(book)
    }

    /// # Errors
    ///
    /// `Forbidden`, `Validation`, `NotFound`, otherwise backend failures.
    #[instrument(skip(self, draft), fields(book_id = %id))]
    pub async fn update_book(&self, id: &BookId, draft: BookDraft) -> Result<Book> {
        self.ensure_admin()?;
        let draft = validate_book_draft(draft)?;
        let book = self.catalog.update_book(id, &draft).await?;
        info!(book_id = %book.id, "Book updated");
        Ok(book)
    }

    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, otherwise backend failures.
    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn delete_book(&self, id: &BookId) -> Result<()> {
        self.ensure_admin()?;
        self.catalog.delete_book(id).await?;
        info!(book_id = %id, "Book deleted");
        Ok(())
    }

    /// Catalog entries matching `term`.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, otherwise backend failures.
    pub async fn search_books(&self, term: &str) -> Result<Vec<Book>> {
        let books = self.list_books().await?;
        Ok(search_books(&books, term).into_iter().cloned().collect())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// `Forbidden` for non-admins, otherwise backend failures.
    pub async fn list_orders(&self) -> Result<Vec<RemoteOrder>> {
        self.ensure_admin()?;
        Ok(self.orders.list_orders().await?)
    }

    /// Orders matching `filter`, in backend order.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, otherwise backend failures.
    pub async fn filter_orders(&self, filter: &OrderFilter) -> Result<Vec<RemoteOrder>> {
        let orders = self.list_orders().await?;
        let now = chrono::Utc::now();
        Ok(filter.apply(&orders, now).into_iter().cloned().collect())
    }

    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, otherwise backend failures.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<()> {
        self.ensure_admin()?;
        self.orders.update_order_status(id, status).await?;
        info!("Order status updated");
        Ok(())
    }

    // =========================================================================
    // Subscribers
    // =========================================================================

    /// # Errors
    ///
    /// `Forbidden` for non-admins, otherwise backend failures.
    pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        self.ensure_admin()?;
        Ok(self.newsletter.list_subscribers().await?)
    }

    /// # Errors
    ///
    /// `Forbidden` for non-admins, otherwise backend failures.
    pub async fn filter_subscribers(&self, filter: &SubscriberFilter) -> Result<Vec<Subscriber>> {
        let subscribers = self.list_subscribers().await?;
        let now = chrono::Utc::now();
        Ok(filter.apply(&subscribers, now).into_iter().cloned().collect())
    }

    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, otherwise backend failures.
    #[instrument(skip(self), fields(subscriber_id = %id))]
    pub async fn delete_subscriber(&self, id: &SubscriberId) -> Result<()> {
        self.ensure_admin()?;
        self.newsletter.delete_subscriber(id).await?;
        info!("Subscriber deleted");
        Ok(())
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Fetch books, orders, users and subscribers concurrently and aggregate.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins; the first backend failure otherwise.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        self.ensure_admin()?;
        let (books, orders, users, subscribers) = tokio::try_join!(
            self.catalog.list_books(),
            self.orders.list_orders(),
            self.users.list_users(),
            self.newsletter.list_subscribers(),
        )?;
        Ok(DashboardStats::compute(
            &books,
            &orders,
            users.len(),
            subscribers.len(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use booknest_core::{Money, Role};

    use super::*;
    use crate::testing::{FakeBackend, book, log_in, log_in_as};

    fn admin(backend: &Arc<FakeBackend>) -> (ClientStore, AdminService) {
        let store = ClientStore::in_memory();
        let service = AdminService::new(
            store.clone(),
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend.clone(),
        );
        (store, service)
    }

    fn draft() -> BookDraft {
        BookDraft {
            name: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            price: Money::from_cents(999),
            category: "Sci-Fi".to_string(),
            image: "dune.jpg".to_string(),
            description: "Spice".to_string(),
            ..BookDraft::default()
        }
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden_before_any_request() {
        let backend = Arc::new(FakeBackend::new());
        let (store, admin) = admin(&backend);
        log_in(&store, "u1");

        assert!(matches!(admin.list_books().await, Err(ClientError::Forbidden)));
        assert!(matches!(admin.dashboard().await, Err(ClientError::Forbidden)));
        assert_eq!(backend.calls("list_books"), 0);
    }

    #[tokio::test]
    async fn test_create_book_validates_and_defaults_original_price() {
        let backend = Arc::new(FakeBackend::new());
        let (store, admin) = admin(&backend);
        log_in_as(&store, "a1", Role::Admin);

        let created = admin.create_book(draft()).await.unwrap();
        assert_eq!(created.original_price, Some(Money::from_cents(999)));
        assert_eq!(backend.books().len(), 1);

        let mut bad = draft();
        bad.name.clear();
        assert!(matches!(admin.create_book(bad).await, Err(ClientError::Validation(_))));
        assert_eq!(backend.books().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_book() {
        let backend = Arc::new(FakeBackend::new());
        backend.seed_books(vec![book("b1", 500)]);
        let (store, admin) = admin(&backend);
        log_in_as(&store, "a1", Role::Admin);

        let updated = admin.update_book(&BookId::new("b1"), draft()).await.unwrap();
        assert_eq!(updated.name, "Dune");

        admin.delete_book(&BookId::new("b1")).await.unwrap();
        let err = admin.get_book(&BookId::new("b1")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_override_grants_access() {
        let backend = Arc::new(FakeBackend::new());
        let (store, admin) = admin(&backend);
        log_in(&store, "u1");
        store
            .transaction(|tx| tx.set_value(crate::models::keys::ADMIN_VERIFIED, &true))
            .unwrap();

        assert!(admin.list_orders().await.is_ok());
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let backend = Arc::new(FakeBackend::new());
        backend.seed_books(vec![book("b1", 500), book("b2", 700)]);
        let (store, admin) = admin(&backend);
        log_in_as(&store, "a1", Role::Admin);

        let stats = admin.dashboard().await.unwrap();
        assert_eq!(stats.totals.books, 2);
        assert_eq!(stats.totals.orders, 0);
        assert_eq!(stats.monthly_sales.len(), 12);
    }

    #[tokio::test]
    async fn test_update_order_status_reaches_backend() {
        let backend = Arc::new(FakeBackend::new());
        let (store, admin) = admin(&backend);
        log_in_as(&store, "a1", Role::Admin);

        admin
            .update_order_status(&OrderId::new("o1"), OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(
            backend.status_updates(),
            vec![(OrderId::new("o1"), OrderStatus::Shipped)]
        );
    }
}
