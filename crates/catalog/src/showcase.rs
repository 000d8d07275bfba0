//! Fixed selections over the loaded catalog: home page sections, the
//! per-category carousel, the favorites page and the admin dashboard counts.

use serde::Serialize;

use toppers_core::{CategoryId, ProductId};

use crate::search::Searchable;

/// Products per category carousel.
pub const CAROUSEL_LIMIT: usize = 20;

/// Products in the home page "recent" section.
pub const RECENT_LIMIT: usize = 6;

/// Featured products, in input order.
#[must_use]
pub fn featured<T: Searchable>(products: &[T]) -> Vec<&T> {
    products.iter().filter(|p| p.featured()).collect()
}

/// The newest `n` products by creation time.
#[must_use]
pub fn recent<T: Searchable>(products: &[T], n: usize) -> Vec<&T> {
    let mut newest: Vec<&T> = products.iter().collect();
    newest.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    newest.truncate(n);
    newest
}

/// Up to `limit` products of one category, in input order.
#[must_use]
pub fn in_category<'a, T: Searchable>(
    products: &'a [T],
    category_id: &CategoryId,
    limit: usize,
) -> Vec<&'a T> {
    products
        .iter()
        .filter(|p| p.category_id() == category_id)
        .take(limit)
        .collect()
}

/// Catalog entries whose id is in `favorites`, in catalog order.
///
/// Favorites pointing at products that no longer exist are skipped.
#[must_use]
pub fn favorites_of<'a, T: Searchable>(
    products: &'a [T],
    favorites: &[ProductId],
) -> Vec<&'a T> {
    products
        .iter()
        .filter(|p| favorites.contains(p.id()))
        .collect()
}

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub products: usize,
    pub categories: usize,
    pub favorites: usize,
    pub featured: usize,
}

impl CatalogStats {
    /// Count a loaded catalog. `favorites` counts only ids still in the catalog.
    #[must_use]
    pub fn compute<T: Searchable>(
        products: &[T],
        categories: usize,
        favorites: &[ProductId],
    ) -> Self {
        Self {
            products: products.len(),
            categories,
            favorites: favorites_of(products, favorites).len(),
            featured: featured(products).len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Product;

    fn product(id: &str, category: &str, day: u32, featured: bool) -> Product {
        let created_at = format!("2024-06-{day:02}T12:00:00Z").parse().unwrap();
        Product {
            id: ProductId::new(id),
            name: format!("Topo {id}"),
            description: "Topo de bolo personalizado".to_owned(),
            category_id: CategoryId::new(category),
            material: "Papel".to_owned(),
            occasion: "Aniversário".to_owned(),
            theme: "Safari".to_owned(),
            image_url: None,
            featured,
            created_at,
            updated_at: created_at,
            category: None,
        }
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("p1", "c1", 3, true),
            product("p2", "c2", 9, false),
            product("p3", "c1", 1, true),
            product("p4", "c1", 5, false),
        ]
    }

    #[test]
    fn test_featured_keeps_order() {
        assert_eq!(ids(&featured(&catalog())), vec!["p1", "p3"]);
    }

    #[test]
    fn test_recent_sorts_by_creation() {
        let products = catalog();
        assert_eq!(ids(&recent(&products, 2)), vec!["p2", "p4"]);
        assert_eq!(recent(&products, RECENT_LIMIT).len(), 4);
        assert!(recent(&products, 0).is_empty());
    }

    #[test]
    fn test_in_category_limit() {
        let products = catalog();
        let c1 = CategoryId::new("c1");
        assert_eq!(
            ids(&in_category(&products, &c1, CAROUSEL_LIMIT)),
            vec!["p1", "p3", "p4"]
        );
        assert_eq!(ids(&in_category(&products, &c1, 1)), vec!["p1"]);
    }

    #[test]
    fn test_favorites_and_stats() {
        let products = catalog();
        let favorites = vec![
            ProductId::new("p4"),
            ProductId::new("gone"),
            ProductId::new("p2"),
        ];
        assert_eq!(ids(&favorites_of(&products, &favorites)), vec!["p2", "p4"]);

        let stats = CatalogStats::compute(&products, 2, &favorites);
        assert_eq!(
            stats,
            CatalogStats {
                products: 4,
                categories: 2,
                favorites: 2,
                featured: 2,
            }
        );
    }
}
