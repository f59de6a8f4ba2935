//! Shopping cart.

use tracing::{debug, instrument};

use booknest_core::{BookId, Quantity};

use crate::error::Result;
use crate::models::{Book, CartSummary, LineItem};
use crate::store::{ClientStore, Collection};

/// Cart operations in the current session's scope.
#[derive(Debug, Clone)]
pub struct CartService {
    store: ClientStore,
}

impl CartService {
    #[must_use]
    pub const fn new(store: ClientStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        let session = self.store.current_session();
        self.store.read_collection(Collection::Cart, session.as_ref())
    }

    /// Number of distinct books (the badge count).
    #[must_use]
    pub fn count(&self) -> usize {
        self.items().len()
    }

    #[must_use]
    pub fn contains(&self, id: &BookId) -> bool {
        self.items().iter().any(|line| &line.book.id == id)
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::for_items(&self.items())
    }

    /// Add `quantity` copies. A book already in the cart has its quantity
    /// increased. Returns the resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    #[instrument(skip(self, book), fields(book_id = %book.id, quantity = %quantity))]
    pub fn add(&self, book: Book, quantity: Quantity) -> Result<Quantity> {
        let session = self.store.current_session();
        let result = self
            .store
            .modify(Collection::Cart, session.as_ref(), |items: &mut Vec<LineItem>| {
                if let Some(line) = items.iter_mut().find(|line| line.book.id == book.id) {
                    line.quantity = line.quantity.saturating_add(quantity);
                    return Some(line.quantity);
                }
                items.push(LineItem::new(book, quantity));
                Some(quantity)
            })?;
        Ok(result.unwrap_or(quantity))
    }

    /// Add one copy if absent, otherwise remove the line. Returns whether the
    /// book is in the cart afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    #[instrument(skip(self, book), fields(book_id = %book.id))]
    pub fn toggle(&self, book: Book) -> Result<bool> {
        let session = self.store.current_session();
        let in_cart = self
            .store
            .modify(Collection::Cart, session.as_ref(), |items: &mut Vec<LineItem>| {
                let before = items.len();
                items.retain(|line| line.book.id != book.id);
                if items.len() == before {
                    items.push(LineItem::new(book, Quantity::ONE));
                    Some(true)
                } else {
                    Some(false)
                }
            })?;
        Ok(in_cart.unwrap_or(false))
    }

    /// Set a line's quantity. Returns `false` if the book is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    pub fn set_quantity(&self, id: &BookId, quantity: Quantity) -> Result<bool> {
        let updated = self.update_line(id, |_| Some(quantity))?;
        Ok(updated.is_some())
    }

    /// Add one copy to an existing line.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    pub fn increment(&self, id: &BookId) -> Result<Option<Quantity>> {
        self.update_line(id, |current| Some(current.incremented()))
    }

    /// Take one copy off an existing line. A line at one copy stays at one;
    /// use [`remove`](Self::remove) to drop it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    pub fn decrement(&self, id: &BookId) -> Result<Option<Quantity>> {
        let session = self.store.current_session();
        let result = self
            .store
            .modify(Collection::Cart, session.as_ref(), |items: &mut Vec<LineItem>| {
                let line = items.iter_mut().find(|line| &line.book.id == id)?;
                let lowered = line.quantity.decremented()?;
                line.quantity = lowered;
                Some(lowered)
            })?;
        if result.is_none() {
            debug!(book_id = %id, "Decrement skipped");
            return Ok(self
                .items()
                .into_iter()
                .find(|line| &line.book.id == id)
                .map(|line| line.quantity));
        }
        Ok(result)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    pub fn remove(&self, id: &BookId) -> Result<bool> {
        let session = self.store.current_session();
        Ok(self
            .store
            .remove_line_item::<LineItem>(Collection::Cart, session.as_ref(), id)?)
    }

    /// Empty the cart. Always notifies, even if it was already empty.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the write fails.
    pub fn clear(&self) -> Result<()> {
        let session = self.store.current_session();
        self.store.clear_collection(Collection::Cart, session.as_ref())?;
        Ok(())
    }

    fn update_line(
        &self,
        id: &BookId,
        next: impl FnOnce(Quantity) -> Option<Quantity>,
    ) -> Result<Option<Quantity>> {
        let session = self.store.current_session();
        Ok(self
            .store
            .modify(Collection::Cart, session.as_ref(), |items: &mut Vec<LineItem>| {
                let line = items.iter_mut().find(|line| &line.book.id == id)?;
                line.quantity = next(line.quantity)?;
                Some(line.quantity)
            })?)
    }
}
