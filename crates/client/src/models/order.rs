//! Order types.
//!
//! [`Order`] is the client's immutable record of a completed checkout, kept in
//! the scoped `orders` collection. [`RemoteOrder`] is the server's copy as the
//! admin back-office sees it; its shape is looser because older orders were
//! written by several client versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booknest_core::{BookId, Money, OrderId, OrderStatus, UserId};

use super::{Keyed, LineItem};

/// Where an order ships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl ShippingAddress {
    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// What the order remembers about payment. Never the full card number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    #[serde(rename = "cardLast4")]
    pub card_last4: String,
    #[serde(rename = "razorpay_payment_id")]
    pub reference: String,
}

/// Card details entered at checkout.
///
/// Only the last four digits outlive the checkout call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PaymentCard {
    pub name: String,
    pub number: String,
    pub expiry: String,
    pub cvc: String,
}

impl PaymentCard {
    /// Digits of the card number, separators dropped.
    #[must_use]
    pub fn digits(&self) -> String {
        self.number.chars().filter(char::is_ascii_digit).collect()
    }

    /// Last four digits of the card number.
    #[must_use]
    pub fn last4(&self) -> String {
        let digits = self.digits();
        let start = digits.len().saturating_sub(4);
        digits.get(start..).unwrap_or_default().to_string()
    }
}

impl std::fmt::Debug for PaymentCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCard")
            .field("name", &self.name)
            .field("number", &format_args!("**** {}", self.last4()))
            .field("expiry", &self.expiry)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub items: Vec<LineItem>,
    pub shipping: ShippingAddress,
    pub payment: PaymentSummary,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    pub total: Money,
    pub status: OrderStatus,
    #[serde(rename = "date", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Keyed for Order {
    type Key = OrderId;

    fn key(&self) -> &OrderId {
        &self.id
    }
}

/// Customer block on a server-side order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One item on a server-side order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOrderItem {
    #[serde(default, rename = "_id", alias = "id")]
    pub book_id: Option<BookId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: Money,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

impl RemoteOrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        Money::new(self.price.amount() * rust_decimal::Decimal::from(self.quantity))
    }
}

/// City (and whatever else) on a server-side shipping address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAddress {
    #[serde(default)]
    pub city: Option<String>,
}

/// An order as stored by the backend (`GET /orders`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrder {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    /// Human-facing order number, when the backend assigned one.
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    #[serde(default)]
    pub items: Vec<RemoteOrderItem>,
    #[serde(default, alias = "shipping")]
    pub shipping_address: Option<RemoteAddress>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default, alias = "date")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RemoteOrder {
    /// Display number: the assigned order number, else the document id.
    #[must_use]
    pub fn display_id(&self) -> &str {
        self.order_id.as_deref().unwrap_or_else(|| self.id.as_str())
    }

    /// Status, treating a missing one as pending.
    #[must_use]
    pub fn status_or_pending(&self) -> OrderStatus {
        self.status.unwrap_or(OrderStatus::Pending)
    }

    /// Sum of price × quantity over the items.
    #[must_use]
    pub fn items_total(&self) -> Money {
        self.items.iter().map(RemoteOrderItem::line_total).sum()
    }
}
