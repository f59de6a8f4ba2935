//! Integration tests for the BookNest client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p booknest-integration-tests
//! ```
//!
//! No server is needed: every scenario runs [`ClientState`] against the
//! in-process [`FakeBackend`] and either memory or file storage.
//!
//! # Test Categories
//!
//! - `store_scoping` - collection invariants, scopes and notifications
//! - `session_lifecycle` - login, logout and the admin override
//! - `checkout_flow` - cart to order, payment failures and the mirror
//! - `persistence` - state surviving a reopen of the JSON file

use std::path::Path;
use std::sync::Arc;

use booknest_client::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use booknest_client::testing::FakeBackend;
use booknest_client::{ClientConfig, ClientState};

/// A client wired to a fake backend.
pub struct TestContext {
    pub state: ClientState,
    pub backend: Arc<FakeBackend>,
    /// The raw storage under the store, for asserting on scoped keys.
    pub storage: Arc<dyn KeyValueStorage>,
}

impl TestContext {
    /// In-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    /// File storage at `path`.
    #[must_use]
    pub fn with_file(path: &Path) -> Self {
        Self::with_storage(Arc::new(FileStorage::open(path)))
    }

    /// Number of entries stored under the raw `key`.
    #[must_use]
    pub fn stored_len(&self, key: &str) -> usize {
        self.storage
            .get(key)
            .and_then(|json| serde_json::from_str::<Vec<serde_json::Value>>(&json).ok())
            .map_or(0, |entries| entries.len())
    }

    /// Arbitrary storage.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn KeyValueStorage>) -> Self {
        let backend = Arc::new(FakeBackend::new());
        let state = ClientState::new(ClientConfig::default(), storage.clone(), backend.clone());
        Self {
            state,
            backend,
            storage,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
