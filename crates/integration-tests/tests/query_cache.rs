//! Integration tests for the entity query layer.
//!
//! These tests verify read caching, invalidation after writes, the cascade
//! from category deletion, and the retry policy split between reads and
//! writes.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use toppers_catalog::backend::{MemoryStore, RemoteError};
use toppers_catalog::error::{CatalogError, ReadOperation, WriteAction};
use toppers_catalog::models::{ImageUpload, NewCategory, NewProduct, ProductUpdate};
use toppers_catalog::query::ImageOwner;
use toppers_core::ProductId;
use toppers_integration_tests::{FlakyStore, client_for, seed_catalog};

fn new_product(catalog: &toppers_integration_tests::SeededCatalog, name: &str) -> NewProduct {
    NewProduct {
        name: name.to_owned(),
        description: "Topo de bolo personalizado".to_owned(),
        category_id: catalog.infantil.id.clone(),
        material: "Papel".to_owned(),
        occasion: "Aniversário".to_owned(),
        theme: "Safari".to_owned(),
        image_url: None,
        featured: false,
    }
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn test_repeated_reads_hit_cache() {
    let memory = MemoryStore::new();
    seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 3);

    let first = client.products().await.unwrap();
    let second = client.products().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.product_reads(), 1);

    client.categories().await.unwrap();
    client.categories().await.unwrap();
    assert_eq!(store.category_reads(), 1);
}

#[tokio::test]
async fn test_products_ordered_newest_first_with_join() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let client = client_for(memory, 0);

    let products = client.products().await.unwrap();
    let ids: Vec<&ProductId> = products.iter().map(|p| &p.id).collect();
    assert_eq!(ids, vec![&catalog.topo_b.id, &catalog.topo_a.id]);
    assert_eq!(products[0].category.as_ref().unwrap().name, "Casamento");

    let categories = client.categories().await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Casamento", "Infantil"]);
}

#[tokio::test]
async fn test_product_mutations_invalidate_products_only() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 3);

    client.products().await.unwrap();
    client.categories().await.unwrap();

    let created = client
        .create_product(&new_product(&catalog, "Topo C"))
        .await
        .unwrap();
    let products = client.products().await.unwrap();
    assert_eq!(store.product_reads(), 2);
    assert_eq!(products.len(), 3);
    assert_eq!(products[0].id, created.id);

    client.categories().await.unwrap();
    assert_eq!(store.category_reads(), 1);

    client
        .update_product(
            &created.id,
            ProductUpdate {
                name: Some("Topo C2".to_owned()),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(client.products().await.unwrap()[0].name, "Topo C2");

    client.delete_product(&created.id).await.unwrap();
    assert_eq!(client.products().await.unwrap().len(), 2);
    assert_eq!(store.product_reads(), 4);
}

#[tokio::test]
async fn test_category_rename_refreshes_joined_name() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let client = client_for(memory, 0);

    let before = client.transformed_products().await.unwrap();
    assert!(before.iter().any(|p| p.category == "Infantil"));

    client
        .update_category(
            &catalog.infantil.id,
            &NewCategory {
                name: "  Festa Infantil ".to_owned(),
                icon: "🎈".to_owned(),
            },
        )
        .await
        .unwrap();

    let after = client.transformed_products().await.unwrap();
    assert!(after.iter().any(|p| p.category == "Festa Infantil"));
    let categories = client.categories().await.unwrap();
    assert!(categories.iter().any(|c| c.name == "Festa Infantil"));
}

#[tokio::test]
async fn test_category_delete_cascades_and_invalidates_products() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 3);

    assert_eq!(client.products().await.unwrap().len(), 2);
    assert_eq!(client.categories().await.unwrap().len(), 2);

    client.delete_category(&catalog.casamento.id).await.unwrap();

    let products = client.products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, catalog.topo_a.id);
    assert_eq!(client.categories().await.unwrap().len(), 1);
    assert_eq!(store.product_reads(), 2);
    assert_eq!(store.category_reads(), 2);
}

#[tokio::test]
async fn test_read_overlapping_delete_is_not_cached() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 0);

    store.hold_next_product_read();
    let reader = tokio::spawn({
        let client = client.clone();
        async move { client.products().await.unwrap().len() }
    });

    store.product_read_fetched().await;
    client.delete_product(&catalog.topo_a.id).await.unwrap();
    store.release_products();

    // The overlapping read still answers with its own snapshot
    assert_eq!(reader.await.unwrap(), 2);

    let products = client.products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, catalog.topo_b.id);
    assert_eq!(store.product_reads(), 2);
}

#[tokio::test]
async fn test_transformed_read_overlapping_invalidate_all_refetches() {
    let memory = MemoryStore::new();
    seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 0);

    store.hold_next_product_read();
    let reader = tokio::spawn({
        let client = client.clone();
        async move { client.transformed_products().await.unwrap().len() }
    });

    store.product_read_fetched().await;
    client.invalidate_all().await;
    store.release_products();
    assert_eq!(reader.await.unwrap(), 2);

    client.transformed_products().await.unwrap();
    assert_eq!(store.product_reads(), 2);
}

// =============================================================================
// Retry Policy
// =============================================================================

#[tokio::test]
async fn test_read_recovers_within_retries() {
    let memory = MemoryStore::new();
    seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 3);

    store.fail_reads(2);
    let products = client.products().await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(store.product_reads(), 3);
}

#[tokio::test]
async fn test_read_fails_after_three_retries() {
    let store = FlakyStore::new(MemoryStore::new());
    let client = client_for(store.clone(), 3);

    store.fail_reads(10);
    let err = client.categories().await.unwrap_err();

    // One attempt plus three retries
    assert_eq!(store.category_reads(), 4);
    assert!(err.is_read());
    assert!(matches!(
        err,
        CatalogError::Read {
            operation: ReadOperation::Categories,
            source: RemoteError::Status { status: 503, .. },
        }
    ));
    assert_eq!(err.user_message(), "Could not load categories");
}

#[tokio::test]
async fn test_failed_read_is_not_cached() {
    let memory = MemoryStore::new();
    seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 0);

    store.fail_reads(1);
    assert!(client.products().await.is_err());
    assert_eq!(client.products().await.unwrap().len(), 2);
    assert_eq!(store.product_reads(), 2);
}

#[tokio::test]
async fn test_writes_are_never_retried() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 3);

    store.fail_writes(1);
    let err = client
        .create_product(&new_product(&catalog, "Topo C"))
        .await
        .unwrap_err();

    assert_eq!(store.writes(), 1);
    assert!(matches!(
        err,
        CatalogError::Write {
            action: WriteAction::CreateProduct,
            ..
        }
    ));
    assert_eq!(err.user_message(), "Failed to create product");
    assert_eq!(client.products().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_write_keeps_cache() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let store = FlakyStore::new(memory);
    let client = client_for(store.clone(), 3);

    client.products().await.unwrap();
    store.fail_writes(1);
    assert!(client.delete_product(&catalog.topo_a.id).await.is_err());

    client.products().await.unwrap();
    assert_eq!(store.product_reads(), 1);
}

// =============================================================================
// Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_then_attach_image() {
    let memory = MemoryStore::new();
    let catalog = seed_catalog(&memory).await;
    let client = client_for(memory.clone(), 0);

    let url = client
        .upload_product_image(
            ImageUpload {
                file_name: "super-herois.webp".to_owned(),
                content_type: "image/webp".to_owned(),
                bytes: vec![1, 2, 3],
            },
            &catalog.topo_a.id,
        )
        .await
        .unwrap();

    let prefix = format!("memory://objects/product-images/{}-", catalog.topo_a.id);
    assert!(url.starts_with(&prefix));
    let key = url.trim_start_matches("memory://objects/product-images/");
    let object = memory
        .object(toppers_catalog::backend::Bucket::ProductImages, key)
        .unwrap()
        .unwrap();
    assert_eq!(object.content_type, "image/webp");

    let updated = client
        .update_product(
            &catalog.topo_a.id,
            ProductUpdate {
                image_url: Some(url.clone()),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.image_url.as_deref(), Some(url.as_str()));

    let views = client.transformed_products().await.unwrap();
    let view = views.iter().find(|p| p.id == catalog.topo_a.id).unwrap();
    assert_eq!(view.images, vec![url]);
}

#[tokio::test]
async fn test_pending_owner_upload_and_failure() {
    let store = FlakyStore::new(MemoryStore::new());
    let client = client_for(store.clone(), 3);
    let upload = ImageUpload {
        file_name: "icone.png".to_owned(),
        content_type: "image/png".to_owned(),
        bytes: vec![0x89],
    };

    let url = client
        .upload_category_image(upload.clone(), ImageOwner::Pending)
        .await
        .unwrap();
    assert!(url.starts_with("memory://objects/category-images/"));
    assert!(url.ends_with(".png"));

    store.fail_writes(1);
    let err = client
        .upload_category_image(upload, ImageOwner::Pending)
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Failed to upload category image");
    assert_eq!(store.writes(), 2);
}
