//! Integration tests for the Toppers catalog.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p toppers-integration-tests
//! ```
//!
//! Everything runs against the in-process backend; no network or hosted
//! project is needed.
//!
//! # Test Categories
//!
//! - `query_cache` - caching, invalidation and retry policy
//! - `catalog_browsing` - filtering, filter options and showcase views
//! - `local_state` - favorites and admin session on disk

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use toppers_catalog::CatalogClient;
use toppers_catalog::auth::hash_password;
use toppers_catalog::backend::{Bucket, MemoryStore, RemoteError, RemoteStore};
use toppers_catalog::config::QueryOptions;
use toppers_catalog::models::{
    AdminCredential, AdminUser, Category, CategoryUpdate, NewCategory, NewProduct, Product,
    ProductUpdate,
};
use toppers_catalog::transform::DEFAULT_PLACEHOLDER_IMAGE;
use toppers_core::{AdminUserId, CategoryId, Email, ProductId};

// =============================================================================
// Backends
// =============================================================================

#[derive(Debug, Default)]
struct FlakyState {
    read_failures: AtomicU32,
    write_failures: AtomicU32,
    product_reads: AtomicUsize,
    category_reads: AtomicUsize,
    admin_reads: AtomicUsize,
    writes: AtomicUsize,
    hold_products: AtomicBool,
    products_fetched: Notify,
    products_released: Notify,
}

/// [`MemoryStore`] wrapper that fails on demand and counts calls.
///
/// Clones share the counters, so a test can keep one handle while the client
/// owns another.
#[derive(Clone)]
pub struct FlakyStore {
    inner: MemoryStore,
    state: Arc<FlakyState>,
}

impl FlakyStore {
    #[must_use]
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            state: Arc::default(),
        }
    }

    /// Fail the next `n` reads, whichever table they target.
    pub fn fail_reads(&self, n: u32) {
        self.state.read_failures.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` writes and uploads.
    pub fn fail_writes(&self, n: u32) {
        self.state.write_failures.store(n, Ordering::SeqCst);
    }

    /// Hold the next product read open after it has taken its snapshot,
    /// until [`FlakyStore::release_products`] is called.
    pub fn hold_next_product_read(&self) {
        self.state.hold_products.store(true, Ordering::SeqCst);
    }

    /// Wait until a held product read has fetched its rows.
    pub async fn product_read_fetched(&self) {
        self.state.products_fetched.notified().await;
    }

    /// Let a held product read return.
    pub fn release_products(&self) {
        self.state.products_released.notify_one();
    }

    #[must_use]
    pub fn product_reads(&self) -> usize {
        self.state.product_reads.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn category_reads(&self) -> usize {
        self.state.category_reads.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn admin_reads(&self) -> usize {
        self.state.admin_reads.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.writes.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> Result<(), RemoteError> {
        let failed = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(RemoteError::Status {
                status: 503,
                body: "injected failure".to_owned(),
            })
        } else {
            Ok(())
        }
    }

    fn read(&self, counter: &AtomicUsize) -> Result<(), RemoteError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Self::take_failure(&self.state.read_failures)
    }

    fn write(&self) -> Result<(), RemoteError> {
        self.state.writes.fetch_add(1, Ordering::SeqCst);
        Self::take_failure(&self.state.write_failures)
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn select_products(&self) -> Result<Vec<Product>, RemoteError> {
        self.read(&self.state.product_reads)?;
        let products = self.inner.select_products().await?;
        if self.state.hold_products.swap(false, Ordering::SeqCst) {
            self.state.products_fetched.notify_one();
            self.state.products_released.notified().await;
        }
        Ok(products)
    }

    async fn select_categories(&self) -> Result<Vec<Category>, RemoteError> {
        self.read(&self.state.category_reads)?;
        self.inner.select_categories().await
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RemoteError> {
        self.write()?;
        self.inner.insert_product(product).await
    }

    async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RemoteError> {
        self.write()?;
        self.inner.update_product(id, update).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), RemoteError> {
        self.write()?;
        self.inner.delete_product(id).await
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, RemoteError> {
        self.write()?;
        self.inner.insert_category(category).await
    }

    async fn update_category(
        &self,
        id: &CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, RemoteError> {
        self.write()?;
        self.inner.update_category(id, update).await
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<(), RemoteError> {
        self.write()?;
        self.inner.delete_category(id).await
    }

    async fn find_admin_user(&self, email: &Email) -> Result<Option<AdminCredential>, RemoteError> {
        self.read(&self.state.admin_reads)?;
        self.inner.find_admin_user(email).await
    }

    async fn upload_object(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        self.write()?;
        self.inner
            .upload_object(bucket, key, bytes, content_type)
            .await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Query options with `retries` read retries and a 1ms delay.
#[must_use]
pub fn fast_options(retries: u32) -> QueryOptions {
    QueryOptions {
        read_retries: retries,
        retry_delay: Duration::from_millis(1),
        ..QueryOptions::default()
    }
}

/// A client over `store` with fast retries.
#[must_use]
pub fn client_for(store: impl RemoteStore + 'static, retries: u32) -> CatalogClient {
    CatalogClient::new(store, fast_options(retries), DEFAULT_PLACEHOLDER_IMAGE)
}

/// Rows created by [`seed_catalog`].
pub struct SeededCatalog {
    pub infantil: Category,
    pub casamento: Category,
    pub topo_a: Product,
    pub topo_b: Product,
}

/// Two categories and two products:
///
/// - "Topo A": Acrílico / Aniversário / Super-Heróis, in Infantil, featured
/// - "Topo B": Biscuit / Casamento / Romântico, in Casamento, with an image
pub async fn seed_catalog(store: &MemoryStore) -> SeededCatalog {
    let infantil = store
        .insert_category(&NewCategory {
            name: "Infantil".to_owned(),
            icon: "🎈".to_owned(),
        })
        .await
        .unwrap();
    let casamento = store
        .insert_category(&NewCategory {
            name: "Casamento".to_owned(),
            icon: "https://cdn.toppers.example/icons/aliancas.png".to_owned(),
        })
        .await
        .unwrap();

    let topo_a = store
        .insert_product(&NewProduct {
            name: "Topo A".to_owned(),
            description: "Topo de bolo em camadas".to_owned(),
            category_id: infantil.id.clone(),
            material: "Acrílico".to_owned(),
            occasion: "Aniversário".to_owned(),
            theme: "Super-Heróis".to_owned(),
            image_url: None,
            featured: true,
        })
        .await
        .unwrap();
    let topo_b = store
        .insert_product(&NewProduct {
            name: "Topo B".to_owned(),
            description: "Noivinhos modelados à mão".to_owned(),
            category_id: casamento.id.clone(),
            material: "Biscuit".to_owned(),
            occasion: "Casamento".to_owned(),
            theme: "Romântico".to_owned(),
            image_url: Some("https://cdn.toppers.example/topo-b.jpg".to_owned()),
            featured: false,
        })
        .await
        .unwrap();

    SeededCatalog {
        infantil,
        casamento,
        topo_a,
        topo_b,
    }
}

/// Seed an admin whose password hashes to `password`.
pub fn seed_admin(store: &MemoryStore, email: &str, password: &str) -> AdminUser {
    let user = AdminUser {
        id: AdminUserId::new(uuid::Uuid::new_v4().to_string()),
        email: Email::parse(email).unwrap(),
        role: "admin".to_owned(),
        created_at: chrono::Utc::now(),
    };
    store
        .seed_admin(AdminCredential {
            user: user.clone(),
            password_hash: Some(hash_password(password).unwrap()),
        })
        .unwrap();
    user
}

// =============================================================================
// Temporary Directories
// =============================================================================

/// A unique directory under the system temp dir, removed on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    #[must_use]
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("toppers-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for TempDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
