//! Login, logout and the admin override through `ClientState`.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use secrecy::SecretString;

use booknest_client::ClientError;
use booknest_client::testing::{book, counter, remote_user};
use booknest_core::{Quantity, Role};
use booknest_integration_tests::TestContext;

fn password() -> SecretString {
    SecretString::from("hunter22")
}

#[tokio::test]
async fn logout_clears_cart_and_wishlist_but_keeps_orders() {
    let ctx = TestContext::new();
    ctx.backend
        .set_login_user(remote_user("u42", "Ada Lovelace", "ada@booknest.dev"), Some("tok"));
    let auth = ctx.state.auth();
    auth.login("ada@booknest.dev", &password()).await.unwrap();

    ctx.state.cart().add(book("b1", 500), Quantity::ONE).unwrap();
    ctx.state.wishlist().add(book("b2", 700)).unwrap();
    ctx.state
        .orders()
        .append(booknest_client::testing::order("o1"))
        .unwrap();
    assert_eq!(ctx.stored_len("cart_u42"), 1);
    let orders_before = ctx.state.orders().list();

    let (count, handler) = counter();
    let _sub = ctx.state.store().subscribe(handler);
    auth.logout().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(auth.current().is_none());
    assert!(ctx.storage.get("cart_u42").is_none());
    assert!(ctx.storage.get("wishlist_u42").is_none());
    assert!(ctx.storage.get("token").is_none());
    assert_eq!(ctx.stored_len("orders_u42"), 1);

    auth.login("ada@booknest.dev", &password()).await.unwrap();
    assert_eq!(ctx.state.orders().list(), orders_before);
    assert!(ctx.state.cart().items().is_empty());
    assert!(ctx.state.wishlist().items().is_empty());
}

#[tokio::test]
async fn guest_cart_is_separate_from_user_cart() {
    let ctx = TestContext::new();
    ctx.state.cart().add(book("b1", 500), Quantity::ONE).unwrap();

    ctx.backend
        .set_login_user(remote_user("u42", "Ada Lovelace", "ada@booknest.dev"), None);
    ctx.state
        .auth()
        .login("ada@booknest.dev", &password())
        .await
        .unwrap();

    assert!(ctx.state.cart().items().is_empty());
    assert_eq!(ctx.stored_len("cart"), 1);
}

#[tokio::test]
async fn admin_area_needs_role_or_override() {
    let ctx = TestContext::new();
    ctx.backend
        .set_login_user(remote_user("u7", "Sam", "sam@booknest.dev"), None);
    let auth = ctx.state.auth();
    auth.login("sam@booknest.dev", &password()).await.unwrap();

    let err = ctx.state.admin().dashboard().await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden));

    auth.set_admin_override(true).unwrap();
    let stats = ctx.state.admin().dashboard().await.unwrap();
    assert_eq!(stats.monthly_sales.len(), 12);
    assert_eq!(auth.current().unwrap().role, Role::User);
}

#[tokio::test]
async fn offline_login_fails_without_fallback() {
    let ctx = TestContext::new();
    ctx.backend.go_offline();

    let err = ctx
        .state
        .auth()
        .login("ada@booknest.dev", &password())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NetworkUnavailable(_)));
    assert!(ctx.storage.get("user").is_none());
}
