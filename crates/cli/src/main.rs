//! Sprout CLI - storefront client from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in and persist the session
//! sprout auth login -u alice -p secret
//!
//! # Browse the catalog
//! sprout products --section boys --page 1
//! sprout product classic-denim-overalls
//!
//! # Work with the cart
//! sprout cart show
//! sprout cart add --stock 42 --quantity 2
//!
//! # Favorites
//! sprout favorites toggle 17
//! ```
//!
//! Configuration comes from the environment (`SPROUT_API_URL`,
//! `SPROUT_STORAGE_PATH`, `SPROUT_HTTP_TIMEOUT_SECS`), with `.env`
//! support via dotenvy.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Command output goes to stdout on purpose; diagnostics go through tracing.
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use sprout_client::{ShopConfig, Storefront};

mod commands;

#[derive(Parser)]
#[command(name = "sprout")]
#[command(author, version, about = "Sprout storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authentication and profile
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Inspect and mutate the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the favorites collection
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// List products
    Products {
        /// Restrict to a section (`boys`, `girls`)
        #[arg(short, long)]
        section: Option<String>,

        /// Filter by category id
        #[arg(short, long)]
        category: Option<i32>,

        /// Page number
        #[arg(short, long)]
        page: Option<u32>,

        /// Free-text search (bypasses the cache)
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a single product by slug
    Product {
        /// Product slug
        slug: String,
    },
    /// List categories
    Categories {
        /// Restrict to a section (`boys`, `girls`)
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in and persist the session tokens
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Register a new account
    Register {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// First name
        #[arg(long)]
        first_name: Option<String>,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Delivery address
        #[arg(long)]
        address: Option<String>,
    },
    /// Discard the persisted session
    Logout,
    /// Show the current profile
    Whoami,
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart's lines and totals
    Show,
    /// Add a product stock to the cart
    Add {
        /// Product stock id
        #[arg(short, long)]
        stock: i32,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        /// Cart line id
        #[arg(short, long)]
        item: i32,

        /// New quantity
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove {
        /// Cart line id
        #[arg(short, long)]
        item: i32,
    },
    /// Merge the anonymous cart into the authenticated one
    Merge,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Print the favorites collection
    List,
    /// Flip a product's favorite state
    Toggle {
        /// Product id
        product: i32,
    },
    /// Replace the local collection with the remote list
    Sync,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List the current user's orders
    List,
    /// Show a single order
    Show {
        /// Order id
        order: i32,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ShopConfig::from_env()?;
    let shop = Storefront::new(&config)?;
    shop.initialize().await;

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { username, password } => {
                commands::auth::login(&shop, &username, &password).await?;
            }
            AuthAction::Register {
                username,
                email,
                password,
                first_name,
                phone,
                address,
            } => {
                commands::auth::register(
                    &shop, &username, &email, &password, first_name, phone, address,
                )
                .await?;
            }
            AuthAction::Logout => commands::auth::logout(&shop),
            AuthAction::Whoami => commands::auth::whoami(&shop).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&shop),
            CartAction::Add { stock, quantity } => {
                commands::cart::add(&shop, stock, quantity).await?;
            }
            CartAction::Update { item, quantity } => {
                commands::cart::update(&shop, item, quantity).await;
            }
            CartAction::Remove { item } => commands::cart::remove(&shop, item).await,
            CartAction::Merge => commands::cart::merge(&shop).await?,
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::List => commands::favorites::list(&shop),
            FavoritesAction::Toggle { product } => {
                commands::favorites::toggle(&shop, product).await;
            }
            FavoritesAction::Sync => commands::favorites::sync(&shop).await,
        },
        Commands::Products {
            section,
            category,
            page,
            search,
        } => {
            commands::catalog::products(&shop, section.as_deref(), category, page, search).await?;
        }
        Commands::Product { slug } => commands::catalog::product(&shop, &slug).await?,
        Commands::Categories { section } => {
            commands::catalog::categories(&shop, section.as_deref()).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&shop).await?,
            OrdersAction::Show { order } => commands::orders::show(&shop, order).await?,
        },
    }
    Ok(())
}
