//! BookNest client library.
//!
//! Client-side state and services for the BookNest bookstore: a per-user
//! scoped state store with change notification, the session lifecycle, cart,
//! wishlist and order history, checkout, the admin back-office and a REST
//! client for the backend.
//!
//! # Architecture
//!
//! - [`storage`] - key-value substrate (memory or JSON file)
//! - [`store`] - typed, user-scoped collections over storage; publishes on [`bus`]
//! - [`api`] - backend ports and their `reqwest` implementation
//! - [`services`] - cart, wishlist, auth, checkout, admin, newsletter
//! - [`state`] - [`ClientState`], the handle front ends hold
//!
//! Services only mutate persisted state through [`ClientStore`], so every
//! write is scoped to the current session and announced exactly once.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod bus;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use state::ClientState;
pub use store::{ClientStore, Collection};
