//! State surviving a reopen of the JSON file.

#![allow(clippy::unwrap_used)]

use booknest_client::testing::{book, log_in};
use booknest_core::{BookId, Quantity};
use booknest_integration_tests::TestContext;

#[test]
fn session_and_cart_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let ctx = TestContext::with_file(&path);
        log_in(ctx.state.store(), "u42");
        ctx.state.cart().add(book("b1", 999), Quantity::new(3).unwrap()).unwrap();
        ctx.state.wishlist().add(book("b2", 450)).unwrap();
    }

    let ctx = TestContext::with_file(&path);
    let session = ctx.state.store().current_session().unwrap();
    assert_eq!(session.id.as_str(), "u42");

    let items = ctx.state.cart().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().unwrap().quantity.get(), 3);
    assert!(ctx.state.wishlist().contains(&BookId::new("b2")));
}

#[test]
fn corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json").unwrap();

    let ctx = TestContext::with_file(&path);
    assert!(ctx.state.store().current_session().is_none());

    ctx.state.cart().add(book("b1", 999), Quantity::ONE).unwrap();
    let reopened = TestContext::with_file(&path);
    assert_eq!(reopened.state.cart().count(), 1);
}
