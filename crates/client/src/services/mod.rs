//! Client services.
//!
//! Each service wraps the shared [`ClientStore`](crate::store::ClientStore)
//! and, where it talks to the backend, the API ports it needs.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod contact;
pub mod newsletter;
pub mod orders;
pub mod validation;
pub mod wishlist;

pub use admin::AdminService;
pub use auth::AuthService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::{CheckoutOutcome, CheckoutService, MirrorStatus};
pub use contact::ContactService;
pub use newsletter::{NewsletterService, SignupOutcome};
pub use orders::OrderHistory;
pub use wishlist::WishlistService;
