//! Category commands.
//!
//! # Usage
//!
//! ```bash
//! toppers categories list
//! toppers categories products <id>
//! toppers categories create -n Casamento -i 💍
//! toppers categories update <id> -n Casamentos -i https://cdn.example/aliancas.png
//! toppers categories delete <id>
//! toppers categories upload-icon ./aliancas.png --category <id>
//! ```

use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;
use tracing::{info, warn};

use toppers_catalog::models::{Category, NewCategory};
use toppers_catalog::query::ImageOwner;
use toppers_catalog::showcase::{self, CAROUSEL_LIMIT};
use toppers_core::CategoryId;

use super::{CommandResult, Context, read_image};
use crate::output;

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories by name
    List,
    /// Products shown in a category's carousel
    Products {
        /// Category ID
        id: String,

        /// Maximum number of products
        #[arg(short, long, default_value_t = CAROUSEL_LIMIT)]
        limit: usize,
    },
    /// Create a category (admin)
    Create {
        #[arg(short, long)]
        name: String,

        /// Emoji or image URL
        #[arg(short, long)]
        icon: String,
    },
    /// Replace a category's name and icon (admin)
    Update {
        /// Category ID
        id: String,

        #[arg(short, long)]
        name: String,

        /// Emoji or image URL
        #[arg(short, long)]
        icon: String,
    },
    /// Delete a category and every product in it (admin)
    Delete {
        /// Category ID
        id: String,
    },
    /// Upload an icon image and print its URL (admin)
    UploadIcon {
        /// Image file
        path: PathBuf,

        /// Owning category; omitted for a category not created yet
        #[arg(long)]
        category: Option<String>,
    },
}

/// A category with its icon already classified.
#[derive(Serialize)]
struct CategoryView<'a> {
    #[serde(flatten)]
    category: &'a Category,
    icon_is_image: bool,
}

impl<'a> From<&'a Category> for CategoryView<'a> {
    fn from(category: &'a Category) -> Self {
        Self {
            icon_is_image: category.icon().is_image(),
            category,
        }
    }
}

pub async fn run(action: CategoryAction) -> CommandResult {
    let ctx = Context::from_env()?;

    match action {
        CategoryAction::List => {
            let categories = ctx.client.categories().await?;
            let views: Vec<CategoryView<'_>> = categories.iter().map(CategoryView::from).collect();
            output::json(&views)
        }
        CategoryAction::Products { id, limit } => {
            let products = ctx.client.transformed_products().await?;
            let id = CategoryId::new(id);
            output::json(&showcase::in_category(products.as_slice(), &id, limit))
        }
        CategoryAction::Create { name, icon } => {
            ctx.require_admin()?;
            let category = NewCategory { name, icon }.trimmed();
            category.validate()?;

            let created = ctx.client.create_category(&category).await?;
            output::json(&CategoryView::from(&created))
        }
        CategoryAction::Update { id, name, icon } => {
            ctx.require_admin()?;
            let update = NewCategory { name, icon }.trimmed();
            update.validate()?;

            let updated = ctx.client.update_category(&CategoryId::new(id), &update).await?;
            output::json(&CategoryView::from(&updated))
        }
        CategoryAction::Delete { id } => {
            ctx.require_admin()?;
            let id = CategoryId::new(id);

            let affected = ctx
                .client
                .products()
                .await?
                .iter()
                .filter(|p| p.category_id == id)
                .count();
            if affected > 0 {
                warn!(products = affected, "Deleting category also deletes its products");
            }

            ctx.client.delete_category(&id).await?;
            info!(category_id = %id, "Category deleted");
            Ok(())
        }
        CategoryAction::UploadIcon { path, category } => {
            ctx.require_admin()?;
            let upload = read_image(&path).await?;
            let owner = ImageOwner::from(category.map(CategoryId::new).as_ref());
            let url = ctx.client.upload_category_image(upload, owner).await?;
            output::json(&url)
        }
    }
}
