//! Core types for BookNest.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod quantity;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use quantity::{Quantity, QuantityError};
pub use status::*;
