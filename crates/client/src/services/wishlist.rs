//! Wishlist.
//!
//! Saving books is a signed-in feature: every mutation requires a session
//! and guests get `ValidationError::LoginRequired`.

use tracing::instrument;

use booknest_core::{BookId, Quantity};

use crate::error::{ClientError, Result, ValidationError};
use crate::models::{Book, LineItem, Session};
use crate::store::{ClientStore, Collection};

/// Wishlist operations in the current session's scope.
#[derive(Debug, Clone)]
pub struct WishlistService {
    store: ClientStore,
}

impl WishlistService {
    #[must_use]
    pub const fn new(store: ClientStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn items(&self) -> Vec<Book> {
        let session = self.store.current_session();
        self.store.read_collection(Collection::Wishlist, session.as_ref())
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.items().len()
    }

    #[must_use]
    pub fn contains(&self, id: &BookId) -> bool {
        self.items().iter().any(|book| &book.id == id)
    }

    /// Save a book. Saving one that is already saved refreshes the stored
    /// copy in place.
    ///
    /// # Errors
    ///
    /// Returns `LoginRequired` for guests or `ClientError::Storage` if the
    /// write fails.
    #[instrument(skip(self, book), fields(book_id = %book.id))]
    pub fn add(&self, book: Book) -> Result<()> {
        let session = self.require_session()?;
        self.store
            .upsert_line_item(Collection::Wishlist, Some(&session), book)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `LoginRequired` for guests or `ClientError::Storage` if the
    /// write fails.
    pub fn remove(&self, id: &BookId) -> Result<bool> {
        let session = self.require_session()?;
        Ok(self
            .store
            .remove_line_item::<Book>(Collection::Wishlist, Some(&session), id)?)
    }

    /// Save the book if absent, otherwise drop it. Returns whether it is
    /// saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns `LoginRequired` for guests or `ClientError::Storage` if the
    /// write fails.
    #[instrument(skip(self, book), fields(book_id = %book.id))]
    pub fn toggle(&self, book: Book) -> Result<bool> {
        let session = self.require_session()?;
        let saved = self.store.modify(
            Collection::Wishlist,
            Some(&session),
            |items: &mut Vec<Book>| {
                let before = items.len();
                items.retain(|saved| saved.id != book.id);
                if items.len() == before {
                    items.push(book);
                    Some(true)
                } else {
                    Some(false)
                }
            },
        )?;
        Ok(saved.unwrap_or(false))
    }

    /// # Errors
    ///
    /// Returns `LoginRequired` for guests or `ClientError::Storage` if the
    /// write fails.
    pub fn clear(&self) -> Result<()> {
        let session = self.require_session()?;
        self.store
            .clear_collection(Collection::Wishlist, Some(&session))?;
        Ok(())
    }

    /// Put one copy of a saved book in the cart. The wishlist keeps it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the book is not saved, `AlreadyInCart` if the
    /// cart already holds it, or `ClientError::Storage` if the write fails.
    #[instrument(skip(self), fields(book_id = %id))]
    pub fn move_to_cart(&self, id: &BookId) -> Result<()> {
        let session = self.require_session()?;
        let book = self
            .items()
            .into_iter()
            .find(|book| &book.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("Book {id} is not in your wishlist")))?;

        let added = self.store.modify(
            Collection::Cart,
            Some(&session),
            |items: &mut Vec<LineItem>| {
                if items.iter().any(|line| &line.book.id == id) {
                    return None;
                }
                items.push(LineItem::new(book, Quantity::ONE));
                Some(())
            },
        )?;

        added.ok_or_else(|| ClientError::AlreadyInCart(id.clone()))
    }

    fn require_session(&self) -> Result<Session> {
        self.store
            .current_session()
            .ok_or(ClientError::Validation(ValidationError::LoginRequired))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{book, counter, log_in};

    #[test]
    fn test_guest_is_rejected() {
        let store = ClientStore::in_memory();
        let wishlist = WishlistService::new(store.clone());

        let err = wishlist.toggle(book("b1", 100)).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::LoginRequired)
        ));
        assert!(store.read_collection::<Book>(Collection::Wishlist, None).is_empty());
    }

    #[test]
    fn test_toggle_off_notifies_once() {
        let store = ClientStore::in_memory();
        let session = log_in(&store, "u42");
        let wishlist = WishlistService::new(store.clone());
        assert!(wishlist.toggle(book("b7", 900)).unwrap());

        let (count, handler) = counter();
        let _sub = store.subscribe(handler);
        assert!(!wishlist.toggle(book("b7", 900)).unwrap());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(
            store
                .read_collection::<Book>(Collection::Wishlist, Some(&session))
                .is_empty()
        );
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = ClientStore::in_memory();
        log_in(&store, "u1");
        let wishlist = WishlistService::new(store);

        wishlist.add(book("b1", 100)).unwrap();
        wishlist.add(book("b1", 100)).unwrap();
        assert_eq!(wishlist.count(), 1);
    }

    #[test]
    fn test_move_to_cart() {
        let store = ClientStore::in_memory();
        log_in(&store, "u1");
        let wishlist = WishlistService::new(store.clone());
        wishlist.add(book("b1", 100)).unwrap();

        wishlist.move_to_cart(&BookId::new("b1")).unwrap();
        assert!(wishlist.contains(&BookId::new("b1")));

        let err = wishlist.move_to_cart(&BookId::new("b1")).unwrap_err();
        assert!(matches!(err, ClientError::AlreadyInCart(_)));

        let err = wishlist.move_to_cart(&BookId::new("nope")).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }
}
