//! Back-office commands.
//!
//! Every command needs an admin session (or the admin override set with
//! `admin verify`); the client refuses before contacting the backend.

use std::error::Error;

use clap::{Args, Subcommand};

use booknest_client::ClientState;
use booknest_client::models::BookDraft;
use booknest_client::services::admin::{DateWindow, OrderFilter, SubscriberFilter, subscribers_csv};
use booknest_core::{BookId, Money, OrderId, OrderStatus, SubscriberId};

use crate::output;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Headline numbers, top sellers and monthly sales
    Dashboard,
    /// Set or clear the admin override for this profile
    Verify {
        #[arg(long)]
        off: bool,
    },
    /// Manage the catalog
    Books {
        #[command(subcommand)]
        action: BookAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Manage newsletter subscribers
    Subscribers {
        #[command(subcommand)]
        action: SubscriberAction,
    },
}

#[derive(Subcommand)]
pub enum BookAction {
    List {
        #[arg(short, long, default_value = "")]
        search: String,
    },
    Create(DraftArgs),
    Update {
        id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    Delete { id: String },
}

#[derive(Args)]
pub struct DraftArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    author: String,
    #[arg(long, value_parser = parse_money)]
    price: Money,
    /// Defaults to the price
    #[arg(long, value_parser = parse_money)]
    original_price: Option<Money>,
    #[arg(long)]
    category: String,
    #[arg(long)]
    image: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    rating: Option<f32>,
    /// Percent
    #[arg(long)]
    discount: Option<u8>,
}

impl From<DraftArgs> for BookDraft {
    fn from(args: DraftArgs) -> Self {
        Self {
            name: args.name,
            author: args.author,
            price: args.price,
            original_price: args.original_price,
            category: args.category,
            image: args.image,
            description: args.description,
            rating: args.rating,
            discount: args.discount,
        }
    }
}

#[derive(Subcommand)]
pub enum OrderAction {
    List {
        #[arg(long)]
        status: Option<OrderStatus>,
        /// today, week, month or all
        #[arg(long, default_value = "all")]
        window: DateWindow,
        #[arg(short, long, default_value = "")]
        search: String,
    },
    Status { id: String, status: OrderStatus },
}

#[derive(Subcommand)]
pub enum SubscriberAction {
    List {
        #[arg(long, default_value = "all")]
        window: DateWindow,
        #[arg(short, long, default_value = "")]
        search: String,
        /// Print CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },
    Delete { id: String },
}

fn parse_money(s: &str) -> Result<Money, String> {
    serde_json::from_str(s.trim()).map_err(|_| format!("invalid amount: {s}"))
}

pub async fn run(state: &ClientState, action: AdminAction) -> Result<(), Box<dyn Error>> {
    let admin = state.admin();
    match action {
        AdminAction::Dashboard => output::json(&admin.dashboard().await?)?,
        AdminAction::Verify { off } => {
            state.auth().set_admin_override(!off)?;
            output::line(if off { "Admin override cleared" } else { "Admin override set" });
        }
        AdminAction::Books { action } => match action {
            BookAction::List { search } => output::json(&admin.search_books(&search).await?)?,
            BookAction::Create(draft) => output::json(&admin.create_book(draft.into()).await?)?,
            BookAction::Update { id, draft } => {
                output::json(&admin.update_book(&BookId::new(id), draft.into()).await?)?;
            }
            BookAction::Delete { id } => {
                admin.delete_book(&BookId::new(id)).await?;
                output::line("Book deleted");
            }
        },
        AdminAction::Orders { action } => match action {
            OrderAction::List {
                status,
                window,
                search,
            } => {
                let filter = OrderFilter {
                    status,
                    window,
                    search,
                };
                output::json(&admin.filter_orders(&filter).await?)?;
            }
            OrderAction::Status { id, status } => {
                admin.update_order_status(&OrderId::new(id), status).await?;
                output::line(format_args!("Order marked {status}"));
            }
        },
        AdminAction::Subscribers { action } => match action {
            SubscriberAction::List {
                window,
                search,
                csv,
            } => {
                let subscribers = admin
                    .filter_subscribers(&SubscriberFilter { window, search })
                    .await?;
                if csv {
                    output::line(subscribers_csv(&subscribers).trim_end());
                } else {
                    output::json(&subscribers)?;
                }
            }
            SubscriberAction::Delete { id } => {
                admin.delete_subscriber(&SubscriberId::new(id)).await?;
                output::line("Subscriber deleted");
            }
        },
    }
    Ok(())
}
