//! Favorites commands. Favorites live in the local data directory.

use clap::Subcommand;
use tracing::info;

use toppers_catalog::showcase;
use toppers_core::ProductId;

use super::{CommandResult, Context};
use crate::output;

#[derive(Subcommand)]
pub enum FavoriteAction {
    /// List favorite products
    List,
    /// Add a product to favorites, or remove it if already there
    Toggle {
        /// Product ID
        id: String,
    },
    /// Remove every favorite
    Clear,
}

pub async fn run(action: FavoriteAction) -> CommandResult {
    let ctx = Context::from_env()?;
    let mut favorites = ctx.favorites()?;

    match action {
        FavoriteAction::List => {
            let products = ctx.client.transformed_products().await?;
            output::json(&showcase::favorites_of(products.as_slice(), favorites.ids()))
        }
        FavoriteAction::Toggle { id } => {
            let id = ProductId::new(id);
            let added = favorites.toggle(&id)?;
            info!(product_id = %id, added, count = favorites.len(), "Favorites updated");
            output::json(&added)
        }
        FavoriteAction::Clear => {
            let removed = favorites.len();
            favorites.clear()?;
            info!(removed, "Favorites cleared");
            Ok(())
        }
    }
}
