//! Cart commands.
//!
//! Each command opens a file-backed store, hydrates it, applies at most one
//! change and waits for it to reach disk, so a failed write fails the command.

use std::fmt::Write as _;
use std::sync::Arc;

use pocket_cart_core::{CartItem, Price, ProductId, Snapshot};
use pocket_cart_store::{CartConfig, CartStore, FileBackend};
use tracing::info;

use super::CommandError;

/// Open and hydrate the cart described by `config`.
///
/// # Errors
///
/// Returns an error if the persisted cart cannot be read or parsed.
pub async fn open(config: &CartConfig) -> Result<Arc<CartStore>, CommandError> {
    let backend = FileBackend::new(&config.storage_dir);
    info!(path = %backend.path_for(&config.storage_key).display(), "Opening cart");
    let store = CartStore::open(Arc::new(backend), config.store_options()).await?;
    Ok(store)
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the id is empty, the price is not a valid amount or
/// the cart cannot be written.
pub async fn add(
    store: &CartStore,
    id: &str,
    title: String,
    image_url: String,
    price: &str,
) -> Result<(), CommandError> {
    let item = CartItem {
        id: ProductId::parse(id)?,
        title,
        image_url,
        price: Price::parse(price)?,
    };

    match store.add_to_cart(item).await {
        Some(change) => {
            store.flush().await?;
            info!(?change, "Added to cart");
        }
        None => info!("Cart unchanged"),
    }
    Ok(())
}

/// Add one unit to a product already in the cart.
///
/// # Errors
///
/// Returns an error if the id is empty or the cart cannot be written.
pub async fn increment(store: &CartStore, id: &str) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    match store.increment(&id).await {
        Some(change) => {
            store.flush().await?;
            info!(?change, "Incremented");
        }
        None => info!(product_id = %id, "Product not in cart"),
    }
    Ok(())
}

/// Remove one unit of a product.
///
/// # Errors
///
/// Returns an error if the id is empty or the cart cannot be written.
pub async fn decrement(store: &CartStore, id: &str) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    match store.decrement(&id).await {
        Some(change) => {
            store.flush().await?;
            info!(?change, "Decremented");
        }
        None => info!(product_id = %id, "Product not in cart"),
    }
    Ok(())
}

/// Print the cart table to stdout.
#[allow(clippy::print_stdout)]
pub fn print_cart(cart: &Snapshot) {
    print!("{}", render(cart));
}

/// Render the cart as a plain-text table.
fn render(cart: &Snapshot) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for (position, entry) in cart.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {:<12} {:<24} x{:<4} {:>10} {:>10}",
            position + 1,
            entry.id.as_str(),
            entry.title,
            entry.quantity.get(),
            entry.price.display(),
            entry.line_total().display()
        );
    }
    let _ = writeln!(
        out,
        "Items: {}  Subtotal: {}",
        cart.total_quantity(),
        cart.subtotal()
    );
    out
}
