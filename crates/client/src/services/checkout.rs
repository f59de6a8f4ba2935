//! Checkout.
//!
//! Validates the forms, runs the payment handshake, records the order
//! locally, takes the purchased lines out of the cart, and mirrors the order to the backend for
//! signed-in users. The local record is authoritative: a failed mirror is
//! reported on the outcome, not as an error.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use booknest_core::{OrderId, OrderStatus, Quantity};

use super::validation::{validate_card, validate_shipping};
use crate::api::{OrdersApi, PaymentApi, PaymentVerification};
use crate::error::{ClientError, Result, ValidationError};
use crate::models::session::keys;
use crate::models::{CartSummary, LineItem, Order, PaymentCard, PaymentSummary, ShippingAddress};
use crate::store::{ClientStore, Collection};

/// Whether the backend received a copy of the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    Mirrored,
    /// Guest checkout; nothing to mirror to.
    Skipped,
    /// The order is saved locally but the backend call failed.
    Failed(String),
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub mirror: MirrorStatus,
}

/// Places orders from the current cart.
#[derive(Clone)]
pub struct CheckoutService {
    store: ClientStore,
    payments: Arc<dyn PaymentApi>,
    orders: Arc<dyn OrdersApi>,
}

impl fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutService").finish_non_exhaustive()
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        store: ClientStore,
        payments: Arc<dyn PaymentApi>,
        orders: Arc<dyn OrdersApi>,
    ) -> Self {
        Self {
            store,
            payments,
            orders,
        }
    }

    /// Pay for the cart and record the order.
    ///
    /// # Errors
    ///
    /// - `Validation` for bad shipping or card fields, or an empty cart;
    ///   nothing is stored or sent
    /// - `PaymentFailed` when the gateway declines
    /// - `NetworkUnavailable` when the payment endpoints are unreachable
    /// - `Storage` if the order cannot be saved
    #[instrument(skip_all)]
    pub async fn place_order(
        &self,
        shipping: ShippingAddress,
        card: &PaymentCard,
    ) -> Result<CheckoutOutcome> {
        validate_shipping(&shipping)?;
        validate_card(card)?;

        let session = self.store.current_session();
        let items: Vec<LineItem> = self
            .store
            .read_collection(Collection::Cart, session.as_ref());
        if items.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        let summary = CartSummary::for_items(&items);

        let reference = self.pay(&summary).await?;

        let order = Order {
            id: OrderId::generate(),
            user_id: session.as_ref().map(|s| s.id.clone()),
            items,
            shipping,
            payment: PaymentSummary {
                card_last4: card.last4(),
                reference,
            },
            subtotal: summary.subtotal,
            shipping_cost: summary.shipping,
            tax: summary.tax,
            total: summary.total,
            status: OrderStatus::Processing,
            created_at: Utc::now(),
        };

        self.store.transaction(|tx| {
            tx.append_order(session.as_ref(), order.clone())?;
            // A logout or account switch during payment owns the cart now.
            if tx.current_session() != session {
                return Ok(());
            }
            let mut cart: Vec<LineItem> = tx.read_collection(Collection::Cart, session.as_ref());
            if settle_cart(&mut cart, &order.items) {
                tx.write_collection(Collection::Cart, session.as_ref(), &cart)?;
            }
            Ok(())
        })?;
        info!(order_id = %order.id, total = %order.total, "Order placed");

        let mirror = match &session {
            Some(session) => {
                let token = self
                    .store
                    .read_value::<String>(keys::TOKEN)
                    .or_else(|| session.token.clone());
                match self.orders.create_order(&order, token.as_deref()).await {
                    Ok(()) => MirrorStatus::Mirrored,
                    Err(e) => {
                        warn!(order_id = %order.id, error = %e, "Order saved locally but failed to sync");
                        MirrorStatus::Failed(e.to_string())
                    }
                }
            }
            None => MirrorStatus::Skipped,
        };

        Ok(CheckoutOutcome { order, mirror })
    }

    /// Run the gateway handshake; returns the payment reference.
    async fn pay(&self, summary: &CartSummary) -> Result<String> {
        let intent = self.payments.create_payment(summary.total).await?;
        let gateway_order = match intent.order {
            Some(order) if intent.success => order,
            _ => {
                return Err(ClientError::PaymentFailed(
                    "Failed to create payment order".to_string(),
                ));
            }
        };

        let verification = PaymentVerification::for_order(&gateway_order.id, Utc::now());
        if !self.payments.verify_payment(&verification).await? {
            return Err(ClientError::PaymentFailed(
                "Payment verification failed".to_string(),
            ));
        }
        Ok(verification.razorpay_payment_id)
    }
}

/// Take the ordered copies out of `cart`, leaving lines added or topped up
/// while the payment was in flight. Returns whether anything changed.
fn settle_cart(cart: &mut Vec<LineItem>, ordered: &[LineItem]) -> bool {
    let before = cart.clone();
    cart.retain_mut(|line| {
        let Some(bought) = ordered.iter().find(|o| o.book.id == line.book.id) else {
            return true;
        };
        match Quantity::new(line.quantity.get().saturating_sub(bought.quantity.get())) {
            Ok(rest) => {
                line.quantity = rest;
                true
            }
            Err(_) => false,
        }
    });
    *cart != before
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use booknest_core::Money;

    use super::*;
    use crate::api::{ApiError, PaymentIntent};
    use crate::services::CartService;
    use crate::storage::{KeyValueStorage, MemoryStorage};
    use crate::testing::{FakeBackend, book, card, counter, log_in, shipping};

    fn checkout(backend: &Arc<FakeBackend>) -> (ClientStore, CheckoutService) {
        let store = ClientStore::in_memory();
        let service = CheckoutService::new(store.clone(), backend.clone(), backend.clone());
        (store, service)
    }

    fn fill_cart(store: &ClientStore) {
        let session = store.current_session();
        store
            .upsert_line_item(
                Collection::Cart,
                session.as_ref(),
                LineItem::new(book("b1", 1499), Quantity::new(2).unwrap()),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_checkout_moves_cart_into_orders() {
        let backend = Arc::new(FakeBackend::new());
        let (store, service) = checkout(&backend);
        let session = log_in(&store, "u42");
        fill_cart(&store);
        let (count, handler) = counter();
        let _sub = store.subscribe(handler);

        let outcome = service.place_order(shipping(), &card()).await.unwrap();

        assert_eq!(outcome.mirror, MirrorStatus::Mirrored);
        assert_eq!(outcome.order.status, OrderStatus::Processing);
        assert_eq!(outcome.order.total, Money::from_cents(2998 + 599 + 210));
        assert_eq!(outcome.order.payment.card_last4, "1111");
        assert!(outcome.order.payment.reference.starts_with("pay_"));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let orders: Vec<Order> = store.read_collection(Collection::Orders, Some(&session));
        assert_eq!(orders, vec![outcome.order]);
        assert!(
            store
                .read_collection::<LineItem>(Collection::Cart, Some(&session))
                .is_empty()
        );
        assert_eq!(backend.calls("create_order"), 1);
    }

    /// Gateway that runs `during` against the store while the payment is
    /// being created.
    struct MidFlight {
        inner: Arc<FakeBackend>,
        store: ClientStore,
        during: fn(&ClientStore),
    }

    #[async_trait]
    impl PaymentApi for MidFlight {
        async fn create_payment(&self, amount: Money) -> std::result::Result<PaymentIntent, ApiError> {
            (self.during)(&self.store);
            self.inner.create_payment(amount).await
        }

        async fn verify_payment(
            &self,
            verification: &PaymentVerification,
        ) -> std::result::Result<bool, ApiError> {
            self.inner.verify_payment(verification).await
        }
    }

    fn checkout_with(
        backend: &Arc<FakeBackend>,
        during: fn(&ClientStore),
    ) -> (Arc<MemoryStorage>, ClientStore, CheckoutService) {
        let storage = Arc::new(MemoryStorage::new());
        let store = ClientStore::new(storage.clone());
        let payments = Arc::new(MidFlight {
            inner: backend.clone(),
            store: store.clone(),
            during,
        });
        let service = CheckoutService::new(store.clone(), payments, backend.clone());
        (storage, store, service)
    }

    #[tokio::test]
    async fn test_books_added_during_payment_stay_in_cart() {
        let backend = Arc::new(FakeBackend::new());
        let (_, store, service) = checkout_with(&backend, |store| {
            let cart = CartService::new(store.clone());
            cart.add(book("late", 500), Quantity::new(1).unwrap()).unwrap();
            cart.add(book("b1", 1499), Quantity::new(1).unwrap()).unwrap();
        });
        let session = log_in(&store, "u42");
        fill_cart(&store);

        let outcome = service.place_order(shipping(), &card()).await.unwrap();

        let ordered: Vec<_> = outcome.order.items.iter().map(|l| l.book.id.as_str()).collect();
        assert_eq!(ordered, ["b1"]);
        assert_eq!(outcome.order.items.first().unwrap().quantity.get(), 2);

        let cart: Vec<LineItem> = store.read_collection(Collection::Cart, Some(&session));
        let left: Vec<_> = cart.iter().map(|l| (l.book.id.as_str(), l.quantity.get())).collect();
        assert_eq!(left, [("b1", 1), ("late", 1)]);
    }

    #[tokio::test]
    async fn test_logout_during_payment_leaves_cart_cleared() {
        let backend = Arc::new(FakeBackend::new());
        let (storage, store, service) = checkout_with(&backend, |store| {
            let session = store.current_session();
            store
                .transaction(|tx| {
                    tx.remove(keys::USER)?;
                    tx.remove(&crate::store::scoped_key(Collection::Cart, session.as_ref()))
                })
                .unwrap();
        });
        let session = log_in(&store, "u42");
        fill_cart(&store);

        let outcome = service.place_order(shipping(), &card()).await.unwrap();

        assert_eq!(outcome.order.user_id, Some(session.id.clone()));
        let orders: Vec<Order> = store.read_collection(Collection::Orders, Some(&session));
        assert_eq!(orders.len(), 1);
        assert!(storage.get("cart_u42").is_none());
        assert!(store.read_collection::<LineItem>(Collection::Cart, None).is_empty());
    }

    #[tokio::test]
    async fn test_guest_checkout_skips_mirror() {
        let backend = Arc::new(FakeBackend::new());
        let (store, service) = checkout(&backend);
        fill_cart(&store);

        let outcome = service.place_order(shipping(), &card()).await.unwrap();
        assert_eq!(outcome.mirror, MirrorStatus::Skipped);
        assert_eq!(backend.calls("create_order"), 0);
        assert_eq!(store.read_collection::<Order>(Collection::Orders, None).len(), 1);
    }

    #[tokio::test]
    async fn test_mirror_failure_is_not_an_error() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail_mirror();
        let (store, service) = checkout(&backend);
        let session = log_in(&store, "u42");
        fill_cart(&store);

        let outcome = service.place_order(shipping(), &card()).await.unwrap();
        assert!(matches!(outcome.mirror, MirrorStatus::Failed(_)));
        assert_eq!(
            store
                .read_collection::<Order>(Collection::Orders, Some(&session))
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let backend = Arc::new(FakeBackend::new());
        let (_, service) = checkout(&backend);

        let err = service.place_order(shipping(), &card()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::EmptyCart)));
        assert_eq!(backend.calls("create_payment"), 0);
    }

    #[tokio::test]
    async fn test_invalid_form_touches_nothing() {
        let backend = Arc::new(FakeBackend::new());
        let (store, service) = checkout(&backend);
        fill_cart(&store);
        let mut address = shipping();
        address.city.clear();

        let err = service.place_order(address, &card()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::MissingField("City"))));
        assert_eq!(store.read_collection::<LineItem>(Collection::Cart, None).len(), 1);
        assert_eq!(backend.calls("create_payment"), 0);
    }

    #[tokio::test]
    async fn test_declined_payment_keeps_cart() {
        let backend = Arc::new(FakeBackend::new());
        backend.decline_payments();
        let (store, service) = checkout(&backend);
        fill_cart(&store);

        let err = service.place_order(shipping(), &card()).await.unwrap_err();
        assert!(matches!(err, ClientError::PaymentFailed(_)));
        assert_eq!(store.read_collection::<LineItem>(Collection::Cart, None).len(), 1);
        assert!(store.read_collection::<Order>(Collection::Orders, None).is_empty());
    }

    #[tokio::test]
    async fn test_payment_network_failure() {
        let backend = Arc::new(FakeBackend::new());
        backend.go_offline();
        let (store, service) = checkout(&backend);
        fill_cart(&store);

        let err = service.place_order(shipping(), &card()).await.unwrap_err();
        assert!(matches!(err, ClientError::NetworkUnavailable(_)));
    }
}
