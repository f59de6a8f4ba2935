//! Local order history.

use booknest_core::OrderId;

use crate::error::Result;
use crate::models::Order;
use crate::store::{ClientStore, Collection};

/// Completed orders in the current session's scope, oldest first.
#[derive(Debug, Clone)]
pub struct OrderHistory {
    store: ClientStore,
}

impl OrderHistory {
    #[must_use]
    pub const fn new(store: ClientStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn list(&self) -> Vec<Order> {
        let session = self.store.current_session();
        self.store.read_collection(Collection::Orders, session.as_ref())
    }

    #[must_use]
    pub fn find(&self, id: &OrderId) -> Option<Order> {
        self.list().into_iter().find(|order| &order.id == id)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    pub fn append(&self, order: Order) -> Result<()> {
        let session = self.store.current_session();
        self.store.append_order(session.as_ref(), order)?;
        Ok(())
    }
}
