//! Domain models persisted in the client state store or exchanged with the API.

pub mod book;
pub mod cart;
pub mod order;
pub mod session;

pub use book::{Book, BookDraft};
pub use cart::{CartSummary, LineItem};
pub use order::{
    Order, OrderCustomer, PaymentCard, PaymentSummary, RemoteAddress, RemoteOrder,
    RemoteOrderItem, ShippingAddress,
};
pub use session::{Session, keys};

/// An entity with a stable identity inside a persisted collection.
///
/// Collections hold at most one entry per key; the store's upsert and remove
/// helpers match on it.
pub trait Keyed {
    /// Identity type.
    type Key: PartialEq + ?Sized;

    /// This entry's identity.
    fn key(&self) -> &Self::Key;
}
