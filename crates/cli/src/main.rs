//! Pocket Cart CLI - Inspect and edit a persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! pocket-cart show
//!
//! # Add a product (or one more unit of it)
//! pocket-cart add --id A --title Shirt --image-url https://img/a.png --price 10
//!
//! # Change quantities
//! pocket-cart increment A
//! pocket-cart decrement A
//!
//! # Use another storage directory or key
//! pocket-cart --storage-dir /tmp/cart --key @cart:products show
//! ```
//!
//! Defaults come from `CART_STORAGE_DIR`, `CART_STORAGE_KEY` and
//! `CART_ON_MALFORMED` (see `pocket_cart_store::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pocket_cart_store::CartConfig;

mod commands;

#[derive(Parser)]
#[command(name = "pocket-cart")]
#[command(author, version, about = "Pocket Cart CLI tools")]
struct Cli {
    /// Directory holding the persisted cart (overrides `CART_STORAGE_DIR`)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Persistence key of the cart (overrides `CART_STORAGE_KEY`)
    #[arg(long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cart entries, item count and subtotal
    Show,
    /// Add one unit of a product, appending it if new
    Add {
        /// Product id
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price, e.g. 19.99
        #[arg(long)]
        price: String,
    },
    /// Add one unit to a product already in the cart
    Increment {
        /// Product id
        id: String,
    },
    /// Remove one unit of a product, dropping it at zero
    Decrement {
        /// Product id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pocket_cart_cli=info,pocket_cart_store=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), commands::CommandError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let mut config = CartConfig::from_env()?;
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(key) = cli.key {
        config.set_storage_key(key)?;
    }

    let store = commands::cart::open(&config).await?;

    match cli.command {
        Commands::Show => {}
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => {
            commands::cart::add(&store, &id, title, image_url, &price).await?;
        }
        Commands::Increment { id } => commands::cart::increment(&store, &id).await?,
        Commands::Decrement { id } => commands::cart::decrement(&store, &id).await?,
    }

    commands::cart::print_cart(&store.products());
    Ok(())
}
