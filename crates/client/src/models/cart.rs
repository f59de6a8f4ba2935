//! Cart line items and pricing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use booknest_core::{BookId, Money, Quantity};

use super::{Book, Keyed};

/// Subtotals strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_cents(5000);

/// Flat shipping charge below the threshold.
pub const FLAT_SHIPPING: Money = Money::from_cents(599);

/// Sales tax rate applied to the subtotal (7%).
pub const TAX_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

/// A book in the cart.
///
/// Persisted flattened, so the stored JSON is the catalog entry with an
/// extra `quantity` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub book: Book,
    pub quantity: Quantity,
}

impl LineItem {
    #[must_use]
    pub const fn new(book: Book, quantity: Quantity) -> Self {
        Self { book, quantity }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.book.price * self.quantity
    }
}

impl Keyed for LineItem {
    type Key = BookId;

    fn key(&self) -> &BookId {
        &self.book.id
    }
}

/// Totals shown on the cart and checkout pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Distinct books in the cart (the navigation badge count).
    pub line_count: usize,
    /// Total copies across all lines.
    pub item_count: u64,
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl CartSummary {
    /// Price a set of lines.
    ///
    /// An empty cart costs nothing, shipping included.
    #[must_use]
    pub fn for_items(items: &[LineItem]) -> Self {
        let subtotal: Money = items.iter().map(LineItem::line_total).sum();
        let shipping = if items.is_empty() || subtotal > FREE_SHIPPING_THRESHOLD {
            Money::ZERO
        } else {
            FLAT_SHIPPING
        };
        let tax = subtotal.scale(TAX_RATE);

        Self {
            line_count: items.len(),
            item_count: items.iter().map(|i| u64::from(i.quantity.get())).sum(),
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::book;

    #[test]
    fn test_persisted_shape_is_flat() {
        let line = LineItem::new(book("b1901", 1499), Quantity::new(2).unwrap());
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["_id"], "b1901");
        assert_eq!(value["quantity"], 2);

        let back: LineItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, line);
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let json = r#"{"_id":"b1","name":"x","price":1,"quantity":0}"#;
        assert!(serde_json::from_str::<LineItem>(json).is_err());
    }

    #[test]
    fn test_summary_below_free_shipping() {
        let items = [LineItem::new(book("b1", 1499), Quantity::new(2).unwrap())];
        let summary = CartSummary::for_items(&items);

        assert_eq!(summary.subtotal, Money::from_cents(2998));
        assert_eq!(summary.shipping, FLAT_SHIPPING);
        assert_eq!(summary.tax, Money::from_cents(210));
        assert_eq!(summary.total, Money::from_cents(2998 + 599 + 210));
        assert_eq!(summary.line_count, 1);
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn test_summary_free_shipping_strictly_above_threshold() {
        let exactly = [LineItem::new(book("b1", 5000), Quantity::ONE)];
        assert_eq!(CartSummary::for_items(&exactly).shipping, FLAT_SHIPPING);

        let above = [LineItem::new(book("b1", 5001), Quantity::ONE)];
        assert_eq!(CartSummary::for_items(&above).shipping, Money::ZERO);
    }

    #[test]
    fn test_summary_empty_cart() {
        let summary = CartSummary::for_items(&[]);
        assert_eq!(summary.total, Money::ZERO);
        assert_eq!(summary.line_count, 0);
    }
}
