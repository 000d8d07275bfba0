//! Toppers CLI - browse the catalog and run admin actions from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Search the catalog
//! toppers products list --search safari --material Papel --material Biscuit
//!
//! # Values offered by the filters
//! toppers products filters
//!
//! # Bookmark a product
//! toppers favorites toggle 6f1c...
//!
//! # Sign in, then manage categories
//! toppers admin login -e admin@toppers.example -p '...'
//! toppers categories create -n Casamento -i 💍
//! ```
//!
//! # Commands
//!
//! - `products` - list, filter options, create/update/delete, image upload
//! - `categories` - list, create/update/delete, icon upload
//! - `favorites` - list, toggle, clear
//! - `admin` - login/logout, current session, dashboard counts, password hashing
//!
//! Output is JSON on stdout; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::admin::AdminAction;
use commands::categories::CategoryAction;
use commands::favorites::FavoriteAction;
use commands::products::ProductAction;

#[derive(Parser)]
#[command(name = "toppers")]
#[command(author, version, about = "Toppers catalog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Browse and manage categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage favorite products
    Favorites {
        #[command(subcommand)]
        action: FavoriteAction,
    },
    /// Admin session and dashboard
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
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

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "toppers_cli=info,toppers_catalog=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Products { action } => commands::products::run(action).await?,
        Commands::Categories { action } => commands::categories::run(action).await?,
        Commands::Favorites { action } => commands::favorites::run(action).await?,
        Commands::Admin { action } => commands::admin::run(action).await?,
    }
    Ok(())
}
