//! GreenBasket CLI - storefront shell over the client SDK.
//!
//! # Usage
//!
//! ```bash
//! # Sign in
//! gb-cli login -e asha@example.com -p <password>
//!
//! # Browse
//! gb-cli catalog categories
//! gb-cli catalog products -c 3
//!
//! # Cart and checkout
//! gb-cli cart add -p 17
//! gb-cli cart show
//! gb-cli checkout --place
//!
//! # Notifications
//! gb-cli notifications list
//! gb-cli notifications read-all
//! ```
//!
//! # Commands
//!
//! - `login` / `otp` / `logout` / `whoami` - session management
//! - `catalog` - categories and products
//! - `cart` - local cart operations
//! - `checkout` - reconcile the cart with the server, optionally place the order
//! - `orders` - order history and tracking
//! - `notifications` - notification feed

#![cfg_attr(not(test), forbid(unsafe_code))]
// User-facing CLI output goes to stdout/stderr by design of the binary
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use std::sync::Arc;

use clap::{Parser, Subcommand};

use greenbasket_client::api::ApiClient;
use greenbasket_client::cart::Cart;
use greenbasket_client::config::ClientConfig;
use greenbasket_client::session::store::{FileStore, SessionStore};
use greenbasket_client::session::{LogoutReason, SessionEvent, SessionManager};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "gb-cli")]
#[command(author, version, about = "GreenBasket storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Sign in with a phone number and one-time passcode
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
    /// Sign out and revoke the refresh token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Reconcile the cart with the server and optionally place the order
    Checkout {
        /// Place the order after a successful reconciliation
        #[arg(long)]
        place: bool,
    },
    /// Order history and tracking
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Notification feed
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
}

#[derive(Subcommand)]
enum OtpAction {
    /// Request a one-time passcode
    Request {
        /// Phone number
        #[arg(short, long)]
        phone: String,
    },
    /// Verify a one-time passcode
    Verify {
        /// Phone number
        #[arg(short, long)]
        phone: String,

        /// The passcode received
        #[arg(short, long)]
        code: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List all categories
    Categories,
    /// List products in a category
    Products {
        /// Category ID
        #[arg(short, long)]
        category: i32,
    },
    /// Show one product
    Product {
        /// Product ID
        #[arg(short, long)]
        id: i32,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(short, long)]
        product: i32,
    },
    /// Remove one unit of a product
    Remove {
        /// Product ID
        #[arg(short, long)]
        product: i32,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List past orders
    List,
    /// Show one order's tracking status
    Status {
        /// Order ID
        #[arg(short, long)]
        id: i32,
    },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// List notifications
    List,
    /// Mark one notification read
    Read {
        /// Notification ID
        #[arg(short, long)]
        id: i32,
    },
    /// Mark every notification read
    ReadAll,
    /// Delete one notification
    Delete {
        /// Notification ID
        #[arg(short, long)]
        id: i32,
    },
    /// Delete every notification
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing; default to warnings so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let store: Arc<dyn SessionStore> = Arc::new(FileStore::open(&config.session_dir)?);

    let session = SessionManager::new(Arc::clone(&store));
    session.restore_on_startup();

    let client = ApiClient::new(&config, session.clone());
    let cart = Cart::load(store);

    let ctx = Context {
        client,
        session: session.clone(),
        cart,
    };

    // Watch for a forced logout triggered while the command runs
    let events = session.subscribe();

    let outcome = dispatch(&ctx, cli.command).await;

    if let SessionEvent::LoggedOut { reason } = &*events.borrow()
        && *reason != LogoutReason::UserRequest
    {
        eprintln!("Session ended ({reason}). Please sign in again.");
    }

    outcome
}

async fn dispatch(ctx: &Context, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Login { email, password } => commands::auth::login(ctx, &email, &password).await,
        Commands::Otp { action } => match action {
            OtpAction::Request { phone } => commands::auth::otp_request(ctx, &phone).await,
            OtpAction::Verify { phone, code } => {
                commands::auth::otp_verify(ctx, &phone, &code).await
            }
        },
        Commands::Logout => commands::auth::logout(ctx).await,
        Commands::Whoami => commands::auth::whoami(ctx),
        Commands::Catalog { action } => match action {
            CatalogAction::Categories => commands::catalog::categories(ctx).await,
            CatalogAction::Products { category } => {
                commands::catalog::products(ctx, category).await
            }
            CatalogAction::Product { id } => commands::catalog::product(ctx, id).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(ctx),
            CartAction::Add { product } => commands::cart::add(ctx, product).await,
            CartAction::Remove { product } => commands::cart::remove(ctx, product),
            CartAction::Clear => commands::cart::clear(ctx),
        },
        Commands::Checkout { place } => commands::cart::checkout(ctx, place).await,
        Commands::Orders { action } => match action {
            OrderAction::List => commands::orders::list(ctx).await,
            OrderAction::Status { id } => commands::orders::status(ctx, id).await,
        },
        Commands::Notifications { action } => match action {
            NotificationAction::List => commands::notifications::list(ctx).await,
            NotificationAction::Read { id } => commands::notifications::read(ctx, id).await,
            NotificationAction::ReadAll => commands::notifications::read_all(ctx).await,
            NotificationAction::Delete { id } => commands::notifications::delete(ctx, id).await,
            NotificationAction::Clear => commands::notifications::clear(ctx).await,
        },
    }
}
