//! Product commands.
//!
//! # Usage
//!
//! ```bash
//! toppers products list --search topo --category all --occasion Casamento
//! toppers products list --favorites
//! toppers products filters
//! toppers products create -n "Topo Safari" -d "Topo com animais da selva" \
//!     -c <category-uuid> --material Papel --occasion Aniversário --theme Safari \
//!     --image ./safari.png
//! toppers products update <id> --featured true
//! toppers products delete <id>
//! ```

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use toppers_catalog::models::{NewProduct, ProductUpdate};
use toppers_catalog::options::FilterOptions;
use toppers_catalog::query::ImageOwner;
use toppers_catalog::search::{CategorySelection, FilterDimension, ProductFilter};
use toppers_catalog::showcase;
use toppers_core::{CategoryId, ProductId};

use super::{CommandResult, Context, read_image};
use crate::output;

#[derive(Subcommand)]
pub enum ProductAction {
    /// List products matching the filters
    List(ListArgs),
    /// Featured and most recent products
    Home,
    /// Show the values offered by the material, occasion and theme filters
    Filters,
    /// Create a product (admin)
    Create(CreateArgs),
    /// Update a product (admin)
    Update(UpdateArgs),
    /// Delete a product (admin)
    Delete {
        /// Product ID
        id: String,
    },
    /// Upload a product image and print its URL (admin)
    UploadImage {
        /// Image file
        path: PathBuf,

        /// Owning product; omitted for a product not created yet
        #[arg(long)]
        product: Option<String>,
    },
}

#[derive(Args)]
pub struct ListArgs {
    /// Case-insensitive text matched against name and description
    #[arg(short, long, default_value = "")]
    search: String,

    /// Category ID, or `all`
    #[arg(short, long, default_value = CategorySelection::ALL_SENTINEL)]
    category: String,

    /// Accepted material (repeatable)
    #[arg(long)]
    material: Vec<String>,

    /// Accepted occasion (repeatable)
    #[arg(long)]
    occasion: Vec<String>,

    /// Accepted theme (repeatable)
    #[arg(long)]
    theme: Vec<String>,

    /// Only featured products
    #[arg(long)]
    featured: bool,

    /// Only favorite products
    #[arg(long)]
    favorites: bool,
}

impl ListArgs {
    fn filter(&self) -> ProductFilter {
        let category: CategorySelection = self.category.parse().unwrap_or_default();
        let mut filter = ProductFilter::default()
            .with_search(self.search.as_str())
            .with_category(category);

        for (dimension, values) in [
            (FilterDimension::Material, &self.material),
            (FilterDimension::Occasion, &self.occasion),
            (FilterDimension::Theme, &self.theme),
        ] {
            for value in values {
                filter = filter.with_value(dimension, value.as_str());
            }
        }
        filter
    }
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(short, long)]
    name: String,

    #[arg(short, long)]
    description: String,

    /// Category ID
    #[arg(short, long)]
    category: String,

    #[arg(long)]
    material: String,

    #[arg(long)]
    occasion: String,

    #[arg(long)]
    theme: String,

    /// Show on the home page
    #[arg(long)]
    featured: bool,

    /// Image uploaded once the product exists
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Product ID
    id: String,

    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    /// Category ID
    #[arg(short, long)]
    category: Option<String>,

    #[arg(long)]
    material: Option<String>,

    #[arg(long)]
    occasion: Option<String>,

    #[arg(long)]
    theme: Option<String>,

    #[arg(long)]
    featured: Option<bool>,

    /// Replacement image
    #[arg(long)]
    image: Option<PathBuf>,
}

pub async fn run(action: ProductAction) -> CommandResult {
    let ctx = Context::from_env()?;

    match action {
        ProductAction::List(args) => list(&ctx, &args).await,
        ProductAction::Home => home(&ctx).await,
        ProductAction::Filters => {
            let products = ctx.client.products().await?;
            output::json(&FilterOptions::derive(products.as_slice()))
        }
        ProductAction::Create(args) => create(&ctx, args).await,
        ProductAction::Update(args) => update(&ctx, args).await,
        ProductAction::Delete { id } => {
            ctx.require_admin()?;
            let id = ProductId::new(id);
            ctx.client.delete_product(&id).await?;

            // Drop a dangling bookmark from this machine
            ctx.favorites()?.remove(&id)?;
            info!(product_id = %id, "Product deleted");
            Ok(())
        }
        ProductAction::UploadImage { path, product } => {
            ctx.require_admin()?;
            let upload = read_image(&path).await?;
            let owner = ImageOwner::from(product.map(ProductId::new).as_ref());
            let url = ctx.client.upload_product_image(upload, owner).await?;
            output::json(&url)
        }
    }
}

async fn list(ctx: &Context, args: &ListArgs) -> CommandResult {
    let products = ctx.client.transformed_products().await?;
    let mut matched = args.filter().apply(products.as_slice());

    if args.featured {
        matched.retain(|p| p.featured);
    }
    if args.favorites {
        let favorites = ctx.favorites()?;
        matched.retain(|p| favorites.contains(&p.id));
    }

    info!(total = products.len(), matched = matched.len(), "Products listed");
    output::json(&matched)
}

async fn create(ctx: &Context, args: CreateArgs) -> CommandResult {
    ctx.require_admin()?;

    let product = NewProduct {
        name: args.name,
        description: args.description,
        category_id: CategoryId::new(args.category),
        material: args.material,
        occasion: args.occasion,
        theme: args.theme,
        image_url: None,
        featured: args.featured,
    };
    product.validate()?;

    let mut created = ctx.client.create_product(&product).await?;

    // Uploading after the insert leaves no orphaned image if the insert fails
    if let Some(path) = args.image {
        let upload = read_image(&path).await?;
        let url = ctx.client.upload_product_image(upload, &created.id).await?;
        let update = ProductUpdate {
            image_url: Some(url),
            ..ProductUpdate::default()
        };
        created = ctx.client.update_product(&created.id, update).await?;
    }

    output::json(&created)
}

async fn update(ctx: &Context, args: UpdateArgs) -> CommandResult {
    ctx.require_admin()?;

    let id = ProductId::new(args.id);
    let mut update = ProductUpdate {
        name: args.name,
        description: args.description,
        category_id: args.category.map(CategoryId::new),
        material: args.material,
        occasion: args.occasion,
        theme: args.theme,
        image_url: None,
        featured: args.featured,
        updated_at: None,
    };
    if update.is_empty() && args.image.is_none() {
        return Err("Nothing to update".into());
    }
    update.validate()?;

    if let Some(path) = args.image {
        let upload = read_image(&path).await?;
        update.image_url = Some(ctx.client.upload_product_image(upload, &id).await?);
    }

    let updated = ctx.client.update_product(&id, update).await?;
    output::json(&updated)
}

#[derive(Serialize)]
struct Home<'a, T> {
    featured: Vec<&'a T>,
    recent: Vec<&'a T>,
}

/// Home page sections: featured products and the most recent ones.
async fn home(ctx: &Context) -> CommandResult {
    let products = ctx.client.transformed_products().await?;

    output::json(&Home {
        featured: showcase::featured(products.as_slice()),
        recent: showcase::recent(products.as_slice(), showcase::RECENT_LIMIT),
    })
}
