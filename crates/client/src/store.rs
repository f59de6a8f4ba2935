//! Client state store.
//!
//! Per-user scoped collections (cart, wishlist, orders) plus the session
//! slots, layered over any [`KeyValueStorage`]. Every successful mutation
//! publishes on the store's [`ChangeBus`] so other views can re-read.
//!
//! # Scoping
//!
//! Collections live under `<collection>_<userId>` while a session exists and
//! under the bare `<collection>` name for guests. Changing session changes
//! which key is addressed; nothing is copied or merged between scopes.
//!
//! # Read-modify-write
//!
//! Writes replace a whole collection. The helpers here hold a store-wide
//! mutation lock across read, modify and write so two helpers racing on the
//! same collection cannot lose each other's update. Notifications go out
//! after the lock is released, so handlers are free to read or mutate.

use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::bus::{ChangeBus, Subscription};
use crate::models::session::keys;
use crate::models::{Keyed, Order, Session};
use crate::storage::{KeyValueStorage, MemoryStorage, StorageError};

/// A per-user persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Cart,
    Wishlist,
    Orders,
}

impl Collection {
    /// Base storage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage key for `collection` in the scope of `session`.
#[must_use]
pub fn scoped_key(collection: Collection, session: Option<&Session>) -> String {
    session.map_or_else(
        || collection.as_str().to_owned(),
        |s| format!("{}_{}", collection.as_str(), s.id),
    )
}

/// Result of [`ClientStore::upsert_line_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

struct StoreInner {
    storage: Arc<dyn KeyValueStorage>,
    bus: ChangeBus,
    write_lock: Mutex<()>,
}

/// Shared handle to the client state.
///
/// Cheap to clone; clones share storage, bus and mutation lock.
#[derive(Clone)]
pub struct ClientStore {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for ClientStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientStore")
            .field("bus", &self.inner.bus)
            .finish_non_exhaustive()
    }
}

impl ClientStore {
    /// Create a store over `storage` with a fresh bus.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                storage,
                bus: ChangeBus::new(),
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Create a store over an empty [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// The bus this store publishes on.
    #[must_use]
    pub fn bus(&self) -> &ChangeBus {
        &self.inner.bus
    }

    /// Shorthand for `self.bus().subscribe(handler)`.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.inner.bus.subscribe(handler)
    }

    /// The persisted session, if any. A corrupt slot reads as logged out.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.read_value(keys::USER)
    }

    /// The admin override flag.
    #[must_use]
    pub fn admin_override(&self) -> bool {
        self.read_value(keys::ADMIN_VERIFIED).unwrap_or(false)
    }

    /// Admin by session role or by the override flag.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        let by_role = self
            .current_session()
            .is_some_and(|s| s.role == booknest_core::Role::Admin);
        by_role || self.admin_override()
    }

    /// Decode the JSON value stored under a raw key.
    pub(crate) fn read_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        decode(self.inner.storage.as_ref(), key)
    }

    /// Read a collection; absent or unparseable data reads as empty.
    #[must_use]
    pub fn read_collection<T: DeserializeOwned>(
        &self,
        collection: Collection,
        session: Option<&Session>,
    ) -> Vec<T> {
        let key = scoped_key(collection, session);
        decode(self.inner.storage.as_ref(), &key).unwrap_or_default()
    }

    /// Replace a whole collection and publish.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    pub fn write_collection<T: Serialize>(
        &self,
        collection: Collection,
        session: Option<&Session>,
        items: &[T],
    ) -> Result<(), StorageError> {
        self.transaction(|tx| tx.write_collection(collection, session, items))
    }

    /// Empty a collection and publish.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    pub fn clear_collection(
        &self,
        collection: Collection,
        session: Option<&Session>,
    ) -> Result<(), StorageError> {
        self.write_collection::<serde_json::Value>(collection, session, &[])
    }

    /// Insert `item`, or replace the entry with the same key in place.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    pub fn upsert_line_item<T>(
        &self,
        collection: Collection,
        session: Option<&Session>,
        item: T,
    ) -> Result<Upsert, StorageError>
    where
        T: Keyed + Serialize + DeserializeOwned,
    {
        let outcome = self.modify(collection, session, |items: &mut Vec<T>| {
            match items.iter_mut().find(|existing| existing.key() == item.key()) {
                Some(existing) => {
                    *existing = item;
                    Some(Upsert::Replaced)
                }
                None => {
                    items.push(item);
                    Some(Upsert::Inserted)
                }
            }
        })?;
        Ok(outcome.unwrap_or(Upsert::Inserted))
    }

    /// Remove the entry keyed `key`. Returns whether anything was removed;
    /// an absent key neither writes nor publishes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    pub fn remove_line_item<T>(
        &self,
        collection: Collection,
        session: Option<&Session>,
        key: &T::Key,
    ) -> Result<bool, StorageError>
    where
        T: Keyed + Serialize + DeserializeOwned,
    {
        let removed = self.modify(collection, session, |items: &mut Vec<T>| {
            let before = items.len();
            items.retain(|item| item.key() != key);
            (items.len() != before).then_some(())
        })?;
        Ok(removed.is_some())
    }

    /// Append a completed order to the scoped order history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    pub fn append_order(&self, session: Option<&Session>, order: Order) -> Result<(), StorageError> {
        self.transaction(|tx| tx.append_order(session, order))
    }

    /// Read-modify-write one collection under the mutation lock.
    ///
    /// `apply` returns `Some` when it changed the items; only then is the
    /// collection written and a change published.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    pub fn modify<T, R>(
        &self,
        collection: Collection,
        session: Option<&Session>,
        apply: impl FnOnce(&mut Vec<T>) -> Option<R>,
    ) -> Result<Option<R>, StorageError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.transaction(|tx| {
            let mut items = tx.read_collection(collection, session);
            match apply(&mut items) {
                Some(result) => {
                    tx.write_collection(collection, session, &items)?;
                    Ok(Some(result))
                }
                None => Ok(None),
            }
        })
    }

    /// Run several writes under the mutation lock and publish once.
    ///
    /// The change is published if any write went through, even when a later
    /// write in the same batch failed: the earlier writes are not rolled back.
    ///
    /// # Errors
    ///
    /// Propagates the first `StorageError` returned by `body`.
    pub fn transaction<R>(
        &self,
        body: impl FnOnce(&Transaction<'_>) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let result;
        let dirty;
        {
            let _guard = self
                .inner
                .write_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let tx = Transaction {
                storage: self.inner.storage.as_ref(),
                dirty: Cell::new(false),
            };
            result = body(&tx);
            dirty = tx.dirty.get();
        }

        if dirty {
            self.inner.bus.publish();
        }
        result
    }
}

/// Writes batched by [`ClientStore::transaction`].
pub struct Transaction<'a> {
    storage: &'a dyn KeyValueStorage,
    dirty: Cell<bool>,
}

impl Transaction<'_> {
    /// The session as stored at this point of the batch.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        decode(self.storage, keys::USER)
    }

    /// Read a collection inside the batch.
    #[must_use]
    pub fn read_collection<T: DeserializeOwned>(
        &self,
        collection: Collection,
        session: Option<&Session>,
    ) -> Vec<T> {
        decode(self.storage, &scoped_key(collection, session)).unwrap_or_default()
    }

    /// Replace a collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    pub fn write_collection<T: Serialize>(
        &self,
        collection: Collection,
        session: Option<&Session>,
        items: &[T],
    ) -> Result<(), StorageError> {
        self.set_value(&scoped_key(collection, session), &items)
    }

    /// Push an order onto the scoped history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    pub fn append_order(&self, session: Option<&Session>, order: Order) -> Result<(), StorageError> {
        let mut orders: Vec<Order> = self.read_collection(Collection::Orders, session);
        orders.push(order);
        self.write_collection(Collection::Orders, session, &orders)
    }

    /// Store a JSON value under a raw key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    pub fn set_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key, &json)?;
        self.dirty.set(true);
        debug!(key, bytes = json.len(), "Stored value");
        Ok(())
    }

    /// Delete a raw key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend delete fails.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove(key)?;
        self.dirty.set(true);
        debug!(key, "Removed value");
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Ignoring corrupt stored value");
            None
        }
    }
}
