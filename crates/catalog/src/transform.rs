//! Display projection of product rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use toppers_core::{CategoryId, ProductId};

use crate::models::Product;

/// Image shown for products that have none.
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// A product flattened for display. Derived on read, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformedProduct {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Category display name; empty when the join did not resolve.
    pub category: String,
    pub category_id: CategoryId,
    pub material: String,
    pub occasion: String,
    pub theme: String,
    /// Never empty: falls back to the placeholder.
    pub image_url: String,
    /// Gallery images. Always exactly the one `image_url` for now.
    pub images: Vec<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Project one product row.
#[must_use]
pub fn transform_product(product: &Product, placeholder: &str) -> TransformedProduct {
    let image_url = product
        .image_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or(placeholder)
        .to_owned();

    TransformedProduct {
        id: product.id.clone(),
        name: product.name.clone(),
        description: product.description.clone(),
        category: product
            .category
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default(),
        category_id: product.category_id.clone(),
        material: product.material.clone(),
        occasion: product.occasion.clone(),
        theme: product.theme.clone(),
        images: vec![image_url.clone()],
        image_url,
        featured: product.featured,
        created_at: product.created_at,
    }
}

/// Project a list of product rows, keeping their order.
#[must_use]
pub fn transform_products(products: &[Product], placeholder: &str) -> Vec<TransformedProduct> {
    products
        .iter()
        .map(|p| transform_product(p, placeholder))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::CategorySummary;

    fn row(image_url: Option<&str>, category: Option<&str>) -> Product {
        let created_at = "2024-06-15T12:00:00Z".parse().unwrap();
        Product {
            id: ProductId::new("p1"),
            name: "Topo Safari".to_owned(),
            description: "Topo com animais da selva".to_owned(),
            category_id: CategoryId::new("c1"),
            material: "Papel".to_owned(),
            occasion: "Aniversário".to_owned(),
            theme: "Safari".to_owned(),
            image_url: image_url.map(str::to_owned),
            featured: false,
            created_at,
            updated_at: created_at,
            category: category.map(|name| CategorySummary {
                name: name.to_owned(),
                icon: "🦁".to_owned(),
            }),
        }
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        for image in [None, Some("")] {
            let view = transform_product(&row(image, Some("Infantil")), DEFAULT_PLACEHOLDER_IMAGE);
            assert_eq!(view.image_url, DEFAULT_PLACEHOLDER_IMAGE);
            assert_eq!(view.images, vec![DEFAULT_PLACEHOLDER_IMAGE.to_owned()]);
        }
    }

    #[test]
    fn test_stored_image_is_kept() {
        let view = transform_product(
            &row(Some("https://cdn.example/safari.jpg"), Some("Infantil")),
            DEFAULT_PLACEHOLDER_IMAGE,
        );
        assert_eq!(view.image_url, "https://cdn.example/safari.jpg");
        assert_eq!(view.images.len(), 1);
        assert_eq!(view.category, "Infantil");
    }

    #[test]
    fn test_missing_join_gives_empty_category() {
        let view = transform_product(&row(None, None), "/custom.png");
        assert_eq!(view.category, "");
        assert_eq!(view.category_id, CategoryId::new("c1"));
        assert_eq!(view.image_url, "/custom.png");
    }
}
