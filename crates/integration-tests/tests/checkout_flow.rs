//! Checkout from cart to order history.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use booknest_client::ClientError;
use booknest_client::services::MirrorStatus;
use booknest_client::testing::{book, card, counter, log_in, shipping};
use booknest_core::{OrderStatus, Quantity};
use booknest_integration_tests::TestContext;

#[tokio::test]
async fn checkout_moves_cart_into_orders() {
    let ctx = TestContext::new();
    log_in(ctx.state.store(), "u42");
    ctx.state.cart().add(book("b1", 1500), Quantity::new(2).unwrap()).unwrap();
    ctx.state.cart().add(book("b2", 2500), Quantity::ONE).unwrap();

    let (count, handler) = counter();
    let _sub = ctx.state.store().subscribe(handler);
    let outcome = ctx.state.checkout().place_order(shipping(), &card()).await.unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.stored_len("cart_u42"), 0);
    assert_eq!(ctx.stored_len("orders_u42"), 1);
    assert_eq!(outcome.order.items.len(), 2);
    assert_eq!(outcome.order.status, OrderStatus::Processing);
    assert_eq!(outcome.order.payment.card_last4, "1111");
    assert_eq!(outcome.mirror, MirrorStatus::Mirrored);
    assert_eq!(ctx.backend.created_orders().len(), 1);
    let history: Vec<_> = ctx.state.orders().list().into_iter().map(|o| o.id).collect();
    assert_eq!(history, vec![outcome.order.id]);
}

#[tokio::test]
async fn declined_payment_leaves_cart_alone() {
    let ctx = TestContext::new();
    log_in(ctx.state.store(), "u42");
    ctx.state.cart().add(book("b1", 1500), Quantity::ONE).unwrap();
    ctx.backend.decline_payments();

    let err = ctx
        .state
        .checkout()
        .place_order(shipping(), &card())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::PaymentFailed(_)));
    assert_eq!(ctx.stored_len("cart_u42"), 1);
    assert_eq!(ctx.stored_len("orders_u42"), 0);
}

#[tokio::test]
async fn guest_checkout_skips_the_mirror() {
    let ctx = TestContext::new();
    ctx.state.cart().add(book("b1", 1500), Quantity::ONE).unwrap();

    let outcome = ctx.state.checkout().place_order(shipping(), &card()).await.unwrap();

    assert_eq!(outcome.mirror, MirrorStatus::Skipped);
    assert_eq!(ctx.stored_len("orders"), 1);
    assert_eq!(ctx.backend.calls("create_order"), 0);
}

#[tokio::test]
async fn failed_mirror_still_saves_locally() {
    let ctx = TestContext::new();
    log_in(ctx.state.store(), "u42");
    ctx.state.cart().add(book("b1", 1500), Quantity::ONE).unwrap();
    ctx.backend.fail_mirror();

    let outcome = ctx.state.checkout().place_order(shipping(), &card()).await.unwrap();

    assert!(matches!(outcome.mirror, MirrorStatus::Failed(_)));
    assert_eq!(ctx.stored_len("orders_u42"), 1);
    assert_eq!(ctx.stored_len("cart_u42"), 0);
}
