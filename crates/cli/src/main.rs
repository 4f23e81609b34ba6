//! Stealth Commerce CLI - drive the storefront client against a backend.
//!
//! # Usage
//!
//! ```bash
//! # Check the configured backend answers
//! stealth ping
//!
//! # Browse products
//! stealth products list --category footwear --search trail
//! stealth products categories
//!
//! # Log in (the session is kept in STEALTH_SESSION_DIR)
//! stealth login -e ada@example.com -p secret
//! stealth whoami
//!
//! # Order history
//! stealth orders history --all
//! stealth orders place --item 64f1c2=2 --street "1 Main St" --city Springfield --state IL --zip 62701
//! ```
//!
//! Configuration is read from the environment (and `.env`); see
//! `stealth_client::config`. Set `RUST_LOG=stealth_client=debug` to see
//! request and response bodies.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "stealth")]
#[command(author, version, about = "Stealth Commerce storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Ping,
    /// Show the landing page categories and hero card
    Home,
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Create an account and log in as it
    Register(RegisterArgs),
    /// Log in and remember the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Place orders and browse order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, optionally filtered
    List {
        /// Only products in this category (case-insensitive)
        #[arg(short, long)]
        category: Option<String>,

        /// Only products whose name, description or category contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List the distinct product categories
    Categories,
    /// Create a product
    Create(ProductArgs),
    /// Delete a product by id
    Delete {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Show the logged-in user's orders
    History {
        /// Load pages up to and including this one
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Load every page
        #[arg(short, long, conflicts_with = "page")]
        all: bool,
    },
    /// Show one order from the history
    Show {
        /// Order id
        id: String,
    },
    /// Place an order for the given products
    Place {
        /// Product and quantity as `<product-id>=<quantity>`; repeatable
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        #[command(flatten)]
        address: AddressArgs,
    },
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: String,
    /// Unit price, e.g. 19.99
    #[arg(long)]
    price: String,
    #[arg(long)]
    category: String,
    /// Units in stock
    #[arg(long)]
    stock: String,
    #[arg(long)]
    image_url: String,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(short, long)]
    email: String,
    #[arg(short, long)]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[command(flatten)]
    address: AddressArgs,
}

#[derive(Args)]
struct AddressArgs {
    #[arg(long, default_value = "")]
    street: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    zip: String,
}

impl From<AddressArgs> for stealth_client::models::Address {
    fn from(args: AddressArgs) -> Self {
        Self::new(args.street, args.city, args.state, args.zip)
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load .env before reading SENTRY_DSN
    let _ = dotenvy::dotenv();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        commands::report_failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Ping => commands::system::ping().await?,
        Commands::Home => commands::system::home().await?,
        Commands::Products { action } => match action {
            ProductsAction::List { category, search } => {
                commands::products::list(category.as_deref(), search.as_deref()).await?;
            }
            ProductsAction::Categories => commands::products::categories().await?,
            ProductsAction::Create(args) => {
                let form = stealth_client::ProductForm {
                    name: args.name,
                    description: args.description,
                    price: args.price,
                    category: args.category,
                    stock: args.stock,
                    image_url: args.image_url,
                };
                commands::products::create(&form).await?;
            }
            ProductsAction::Delete { id } => commands::products::delete(&id).await?,
        },
        Commands::Register(args) => {
            commands::account::register(
                &args.email,
                args.password,
                args.first_name,
                args.last_name,
                args.address.into(),
            )
            .await?;
        }
        Commands::Login { email, password } => commands::account::login(&email, password).await?,
        Commands::Logout => commands::account::logout()?,
        Commands::Whoami => commands::account::whoami()?,
        Commands::Orders { action } => match action {
            OrdersAction::History { page, all } => {
                let pages = if all { None } else { Some(page) };
                commands::orders::history(pages).await?;
            }
            OrdersAction::Show { id } => commands::orders::show(&id).await?,
            OrdersAction::Place { items, address } => {
                commands::orders::place(&items, &address.into()).await?;
            }
        },
    }
    Ok(())
}
