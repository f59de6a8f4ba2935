//! Catalog, cart, wishlist, checkout, newsletter and contact commands.

use std::error::Error;

use clap::{Args, Subcommand};

use booknest_client::ClientState;
use booknest_client::models::{PaymentCard, ShippingAddress};
use booknest_client::services::{MirrorStatus, SignupOutcome};
use booknest_core::{BookId, Quantity};

use crate::output;

#[derive(Subcommand)]
pub enum BooksAction {
    /// List the catalog
    List,
    /// Search by name, author or category
    Search { term: String },
    /// Show one book
    Show { id: String },
}

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart and its totals
    List,
    /// Add a catalog book
    Add {
        id: String,
        #[arg(short, long, default_value = "1", value_parser = parse_quantity)]
        quantity: Quantity,
    },
    /// Set a line's quantity
    Set {
        id: String,
        #[arg(value_parser = parse_quantity)]
        quantity: Quantity,
    },
    /// Add one copy
    Increment { id: String },
    /// Remove one copy (never below one)
    Decrement { id: String },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Show the wishlist
    List,
    /// Add a catalog book
    Add { id: String },
    /// Remove a book
    Remove { id: String },
    /// Add if absent, remove if present
    Toggle { id: String },
    /// Copy a wishlisted book into the cart
    Move { id: String },
    /// Empty the wishlist
    Clear,
}

/// Shipping and card details for checkout.
#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    #[arg(long)]
    zip: String,
    #[arg(long)]
    card_name: String,
    #[arg(long)]
    card_number: String,
    /// MM/YY
    #[arg(long)]
    card_expiry: String,
    #[arg(long)]
    card_cvc: String,
}

fn parse_quantity(s: &str) -> Result<Quantity, String> {
    let n: u32 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    Quantity::new(n).map_err(|e| e.to_string())
}

pub async fn books(state: &ClientState, action: BooksAction) -> Result<(), Box<dyn Error>> {
    let catalog = state.catalog();
    match action {
        BooksAction::List => output::json(&catalog.list().await?)?,
        BooksAction::Search { term } => output::json(&catalog.search(&term).await?)?,
        BooksAction::Show { id } => output::json(&catalog.get(&BookId::new(id)).await?)?,
    }
    Ok(())
}

pub async fn cart(state: &ClientState, action: CartAction) -> Result<(), Box<dyn Error>> {
    let cart = state.cart();
    match action {
        CartAction::List => {
            for line in cart.items() {
                output::line(format_args!(
                    "{} x{} @ {} = {}",
                    line.book.name,
                    line.quantity,
                    line.book.price,
                    line.line_total()
                ));
            }
            output::json(&cart.summary())?;
        }
        CartAction::Add { id, quantity } => {
            let book = state.catalog().get(&BookId::new(id)).await?;
            let name = book.name.clone();
            let total = cart.add(book, quantity)?;
            output::line(format_args!("{name} in cart (x{total})"));
        }
        CartAction::Set { id, quantity } => {
            report(cart.set_quantity(&BookId::new(&id), quantity)?, &id);
        }
        CartAction::Increment { id } => {
            report(cart.increment(&BookId::new(&id))?.is_some(), &id);
        }
        CartAction::Decrement { id } => {
            report(cart.decrement(&BookId::new(&id))?.is_some(), &id);
        }
        CartAction::Remove { id } => report(cart.remove(&BookId::new(&id))?, &id),
        CartAction::Clear => {
            cart.clear()?;
            output::line("Cart cleared");
        }
    }
    Ok(())
}

fn report(found: bool, id: &str) {
    if found {
        output::line("Updated");
    } else {
        output::line(format_args!("{id} is not in the cart"));
    }
}

pub async fn wishlist(state: &ClientState, action: WishlistAction) -> Result<(), Box<dyn Error>> {
    let wishlist = state.wishlist();
    match action {
        WishlistAction::List => output::json(&wishlist.items())?,
        WishlistAction::Add { id } => {
            let book = state.catalog().get(&BookId::new(id)).await?;
            wishlist.add(book)?;
            output::line("Added to wishlist");
        }
        WishlistAction::Remove { id } => {
            if wishlist.remove(&BookId::new(id))? {
                output::line("Removed from wishlist");
            }
        }
        WishlistAction::Toggle { id } => {
            let book = state.catalog().get(&BookId::new(id)).await?;
            if wishlist.toggle(book)? {
                output::line("Added to wishlist");
            } else {
                output::line("Removed from wishlist");
            }
        }
        WishlistAction::Move { id } => {
            wishlist.move_to_cart(&BookId::new(id))?;
            output::line("Moved to cart");
        }
        WishlistAction::Clear => {
            wishlist.clear()?;
            output::line("Wishlist cleared");
        }
    }
    Ok(())
}

pub fn orders(state: &ClientState) -> Result<(), Box<dyn Error>> {
    output::json(&state.orders().list())?;
    Ok(())
}

pub async fn checkout(state: &ClientState, args: CheckoutArgs) -> Result<(), Box<dyn Error>> {
    let shipping = ShippingAddress {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        address: args.address,
        city: args.city,
        state: args.state,
        zip_code: args.zip,
    };
    let card = PaymentCard {
        name: args.card_name,
        number: args.card_number,
        expiry: args.card_expiry,
        cvc: args.card_cvc,
    };

    let outcome = state.checkout().place_order(shipping, &card).await?;
    output::line(format_args!(
        "Order {} placed: {} charged to card ending {}",
        outcome.order.id, outcome.order.total, outcome.order.payment.card_last4
    ));
    if let MirrorStatus::Failed(reason) = outcome.mirror {
        output::line(format_args!(
            "Saved locally; the server copy will be missing ({reason})"
        ));
    }
    Ok(())
}

pub async fn subscribe(state: &ClientState, email: &str) -> Result<(), Box<dyn Error>> {
    match state.newsletter().subscribe(email).await? {
        SignupOutcome::Subscribed => output::line("Subscribed. Welcome aboard!"),
        SignupOutcome::AlreadySubscribed => output::line("You're already subscribed"),
    }
    Ok(())
}

pub async fn contact(
    state: &ClientState,
    name: &str,
    email: &str,
    subject: &str,
    message: &str,
) -> Result<(), Box<dyn Error>> {
    let reply = state.contact().send(name, email, subject, message).await?;
    output::line(reply);
    Ok(())
}
