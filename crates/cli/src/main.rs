//! BookNest CLI - shop and manage the bookstore from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (state persists in BOOKNEST_STATE_PATH); the password is read
//! # from BOOKNEST_PASSWORD or stdin when -p is omitted
//! booknest login -e ada@booknest.dev
//!
//! # Add a book to the cart and check out
//! booknest cart add 64f1c2 --quantity 2
//! booknest checkout --first-name Ada --last-name Lovelace ...
//!
//! # Admin dashboard
//! booknest admin dashboard
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami`, `password` - session lifecycle
//! - `books` - browse the catalog
//! - `cart`, `wishlist`, `orders`, `checkout` - shopping
//! - `subscribe` - newsletter sign-up
//! - `contact` - message the store
//! - `admin` - back-office (admin sessions only)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use booknest_client::{ClientConfig, ClientState};

mod commands;
mod output;

use commands::account::{PASSWORD_ENV, PasswordAction};
use commands::admin::AdminAction;
use commands::shop::{BooksAction, CartAction, CheckoutArgs, WishlistAction};

#[derive(Parser)]
#[command(name = "booknest")]
#[command(author, version, about = "BookNest bookstore client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[allow(clippy::large_enum_variant)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
        /// Repeat the password
        #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
        confirm: Option<String>,
    },
    /// Sign out and clear this user's cart and wishlist
    Logout,
    /// Show the current session
    Whoami,
    /// Password recovery and changes
    Password {
        #[command(subcommand)]
        action: PasswordAction,
    },
    /// Browse the catalog
    Books {
        #[command(subcommand)]
        action: BooksAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// List this user's orders
    Orders,
    /// Pay for the cart
    Checkout(CheckoutArgs),
    /// Subscribe to the newsletter
    Subscribe { email: String },
    /// Send a message to the store
    Contact {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        subject: String,
        message: String,
    },
    /// Back-office
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let state = ClientState::open(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&state, &email, password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            confirm,
        } => commands::account::register(&state, &name, &email, password, confirm).await?,
        Commands::Logout => commands::account::logout(&state)?,
        Commands::Whoami => commands::account::whoami(&state),
        Commands::Password { action } => commands::account::password(&state, action).await?,
        Commands::Books { action } => commands::shop::books(&state, action).await?,
        Commands::Cart { action } => commands::shop::cart(&state, action).await?,
        Commands::Wishlist { action } => commands::shop::wishlist(&state, action).await?,
        Commands::Orders => commands::shop::orders(&state)?,
        Commands::Checkout(args) => commands::shop::checkout(&state, args).await?,
        Commands::Subscribe { email } => commands::shop::subscribe(&state, &email).await?,
        Commands::Contact {
            name,
            email,
            subject,
            message,
        } => commands::shop::contact(&state, &name, &email, &subject, &message).await?,
        Commands::Admin { action } => commands::admin::run(&state, action).await?,
    }
    Ok(())
}
