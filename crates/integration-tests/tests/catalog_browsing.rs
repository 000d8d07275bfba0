//! Integration tests for browsing the loaded catalog.
//!
//! These tests run the display projection, the filter engine, the filter
//! options and the showcase selections over products read through the
//! query layer.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use toppers_catalog::backend::MemoryStore;
use toppers_catalog::options::{FilterOptions, FilterOptionsMemo};
use toppers_catalog::search::{CategorySelection, FilterDimension, ProductFilter, Searchable};
use toppers_catalog::showcase::{self, CAROUSEL_LIMIT, CatalogStats, RECENT_LIMIT};
use toppers_catalog::transform::DEFAULT_PLACEHOLDER_IMAGE;
use toppers_integration_tests::{client_for, seed_catalog};

fn names<T: Searchable>(products: &[&T]) -> Vec<String> {
    products.iter().map(|p| p.name().to_owned()).collect()
}

#[tokio::test]
async fn test_search_term_matches_both_products() {
    let memory = MemoryStore::new();
    seed_catalog(&memory).await;
    let client = client_for(memory, 0);
    let products = client.transformed_products().await.unwrap();

    let filter = ProductFilter::default()
        .with_search("a")
        .with_category("all".parse().unwrap());
    assert_eq!(names(&filter.apply(products.as_slice())), vec!["Topo B", "Topo A"]);
}

#[tokio::test]
async fn test_material_filter_selects_biscuit() {
    let memory = MemoryStore::new();
    seed_catalog(&memory).await;
    let client = client_for(memory, 0);
    let products = client.transformed_products().await.unwrap();

    let filter = ProductFilter::default().with_value(FilterDimension::Material, "Biscuit");
    assert_eq!(names(&filter.apply(products.as_slice())), vec!["Topo B"]);
}

#[tokio::test]
async fn test_category_filter_uses_identifier() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let client = client_for(memory, 0);
    let products = client.transformed_products().await.unwrap();

    let by_id = ProductFilter::default()
        .with_category(CategorySelection::Only(catalog.infantil.id.clone()));
    assert_eq!(names(&by_id.apply(products.as_slice())), vec!["Topo A"]);

    // A display name never matches
    let by_name = ProductFilter::default().with_category("Infantil".parse().unwrap());
    assert!(by_name.apply(products.as_slice()).is_empty());
}

#[tokio::test]
async fn test_filter_output_is_subset_and_stable() {
    let memory = MemoryStore::new();
    seed_catalog(&memory).await;
    let client = client_for(memory, 0);
    let products = client.transformed_products().await.unwrap();

    let filters = [
        ProductFilter::default(),
        ProductFilter::default().with_search("NOIVINHOS"),
        ProductFilter::default()
            .with_value(FilterDimension::Occasion, "Aniversário")
            .with_value(FilterDimension::Occasion, "Casamento")
            .with_value(FilterDimension::Theme, "Romântico"),
        ProductFilter::default().with_search("inexistente"),
    ];

    for filter in filters {
        let first = filter.apply(products.as_slice());
        let second = filter.apply(products.as_slice());
        assert_eq!(first, second);
        assert!(first.iter().all(|p| products.iter().any(|q| q.id == p.id)));
    }
}

#[tokio::test]
async fn test_transform_fills_placeholder_and_category() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let client = client_for(memory, 0);
    let products = client.transformed_products().await.unwrap();

    let topo_a = products.iter().find(|p| p.id == catalog.topo_a.id).unwrap();
    assert_eq!(topo_a.image_url, DEFAULT_PLACEHOLDER_IMAGE);
    assert_eq!(topo_a.images.len(), 1);
    assert_eq!(topo_a.category, "Infantil");

    let topo_b = products.iter().find(|p| p.id == catalog.topo_b.id).unwrap();
    assert_eq!(topo_b.image_url, "https://cdn.toppers.example/topo-b.jpg");
}

#[tokio::test]
async fn test_filter_options_memoized_on_cached_list() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let client = client_for(memory, 0);
    let mut memo = FilterOptionsMemo::default();

    let products = client.products().await.unwrap();
    let options = memo.get(&products).clone();
    assert_eq!(options.materials, vec!["Acrílico", "Biscuit"]);
    assert_eq!(options.occasions, vec!["Aniversário", "Casamento"]);
    assert_eq!(options.themes, vec!["Romântico", "Super-Heróis"]);

    // Served from the cache: same list, no recomputation needed
    let cached = client.products().await.unwrap();
    assert!(memo.is_current(&cached));

    client.delete_category(&catalog.casamento.id).await.unwrap();
    let refreshed = client.products().await.unwrap();
    assert!(!memo.is_current(&refreshed));
    assert_eq!(memo.get(&refreshed).materials, vec!["Acrílico"]);
    assert!(Arc::ptr_eq(&refreshed, &client.products().await.unwrap()));
}

#[tokio::test]
async fn test_empty_catalog() {
    let client = client_for(MemoryStore::new(), 0);
    let products = client.transformed_products().await.unwrap();

    assert!(FilterOptions::derive(products.as_slice()).is_empty());
    assert!(ProductFilter::default().apply(products.as_slice()).is_empty());
    assert_eq!(
        CatalogStats::compute(products.as_slice(), 0, &[]),
        CatalogStats::default()
    );
}

#[tokio::test]
async fn test_showcase_sections() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let client = client_for(memory, 0);
    let products = client.transformed_products().await.unwrap();
    let categories = client.categories().await.unwrap();

    assert_eq!(names(&showcase::featured(products.as_slice())), vec!["Topo A"]);
    assert_eq!(
        names(&showcase::recent(products.as_slice(), RECENT_LIMIT)),
        vec!["Topo B", "Topo A"]
    );
    assert_eq!(
        names(&showcase::in_category(
            products.as_slice(),
            &catalog.casamento.id,
            CAROUSEL_LIMIT
        )),
        vec!["Topo B"]
    );

    let favorites = vec![catalog.topo_a.id.clone()];
    let stats = CatalogStats::compute(products.as_slice(), categories.len(), &favorites);
    assert_eq!(
        stats,
        CatalogStats {
            products: 2,
            categories: 2,
            favorites: 1,
            featured: 1,
        }
    );

    let icons: Vec<bool> = categories.iter().map(|c| c.icon().is_image()).collect();
    assert_eq!(icons, vec![true, false]);
}
