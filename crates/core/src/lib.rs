//! BookNest Core - Shared types library.
//!
//! This crate provides common types used across all BookNest components:
//! - `client` - Client state store, session lifecycle, checkout and REST API client
//! - `cli` - Command-line front end over the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, quantities, money, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
