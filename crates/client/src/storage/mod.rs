//! Key-value persistence substrate.
//!
//! [`KeyValueStorage`] is the seam between the client state store and
//! wherever bytes actually live. Values are opaque strings (JSON documents in
//! practice); the store above owns encoding and key scoping.
//!
//! # Implementations
//!
//! - [`MemoryStorage`] - process-local map, optional byte quota
//! - [`FileStorage`] - single JSON file, rewritten atomically on every write

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors raised by a storage backend on write.
///
/// Reads never fail: a missing or unreadable slot is simply absent.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The in-memory map could not be encoded to disk.
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A write would exceed the configured capacity.
    #[error("storage quota exceeded writing {key} ({needed} bytes, {limit} allowed)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
}

/// A synchronous string key-value store.
///
/// Implementations must be safe to share across threads; every method takes
/// `&self` and synchronizes internally.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deletion cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Vec<String>;
}
