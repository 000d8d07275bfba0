//! Entity query layer.
//!
//! Cached reads of the product and category collections, mutations that
//! invalidate those caches, and image uploads. Reads are retried with a fixed
//! delay before failing; writes fail on the first error.

mod cache;
mod upload;

pub use cache::CacheKey;
pub use upload::{ImageOwner, storage_key};

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use moka::future::Cache;
use tracing::{debug, error, info, instrument, warn};

use toppers_core::{CategoryId, Email, ProductId};

use crate::backend::{Bucket, RemoteError, RemoteStore};
use crate::config::QueryOptions;
use crate::error::{CatalogError, ReadOperation, Result, WriteAction};
use crate::models::{
    AdminCredential, Category, CategoryUpdate, ImageUpload, NewCategory, NewProduct, Product,
    ProductUpdate,
};
use crate::transform::{TransformedProduct, transform_products};

use cache::{CacheValue, Generations};

// =============================================================================
// CatalogClient
// =============================================================================

/// Cached access to the catalog entities.
///
/// Cheap to clone; clones share the cache and the backend.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    store: Arc<dyn RemoteStore>,
    cache: Cache<CacheKey, CacheValue>,
    generations: Generations,
    options: QueryOptions,
    placeholder_image: String,
}

impl CatalogClient {
    /// Create a client over `store`.
    #[must_use]
    pub fn new(
        store: impl RemoteStore + 'static,
        options: QueryOptions,
        placeholder_image: &str,
    ) -> Self {
        Self::from_shared(Arc::new(store), options, placeholder_image)
    }

    /// Create a client over an already shared store.
    #[must_use]
    pub fn from_shared(
        store: Arc<dyn RemoteStore>,
        options: QueryOptions,
        placeholder_image: &str,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(options.cache_capacity)
            .time_to_live(options.cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                store,
                cache,
                generations: Generations::default(),
                options,
                placeholder_image: placeholder_image.to_owned(),
            }),
        }
    }

    /// Image URL used for products without one.
    #[must_use]
    pub fn placeholder_image(&self) -> &str {
        &self.inner.placeholder_image
    }

    /// Run a read, retrying failures with the configured fixed delay.
    async fn read_with_retry<T, F, Fut>(&self, operation: ReadOperation, fetch: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, RemoteError>>,
    {
        let attempts = self.inner.options.read_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!(%operation, attempt, error = %e, "Read failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.inner.options.retry_delay).await;
                }
                Err(e) => {
                    error!(%operation, attempts, error = %e, "Read failed");
                    return Err(CatalogError::Read {
                        operation,
                        source: e,
                    });
                }
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All products with their category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Read` once every retry has failed.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        debug!("Cache miss for products");
        let generation = self.inner.generations.current(CacheKey::Products);
        let store = &self.inner.store;
        let products = Arc::new(
            self.read_with_retry(ReadOperation::Products, move || store.select_products())
                .await?,
        );

        self.store_if_current(
            CacheKey::Products,
            generation,
            CacheValue::Products(Arc::clone(&products)),
        )
        .await;

        Ok(products)
    }

    /// All products projected for display, newest first.
    ///
    /// The projection is cached alongside the rows and dropped with them.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Read` once every retry has failed.
    #[instrument(skip(self))]
    pub async fn transformed_products(&self) -> Result<Arc<Vec<TransformedProduct>>> {
        if let Some(CacheValue::TransformedProducts(products)) =
            self.inner.cache.get(&CacheKey::TransformedProducts).await
        {
            debug!("Cache hit for transformed products");
            return Ok(products);
        }

        let generation = self.inner.generations.current(CacheKey::TransformedProducts);
        let rows = self.products().await?;
        let products = Arc::new(transform_products(&rows, &self.inner.placeholder_image));

        self.store_if_current(
            CacheKey::TransformedProducts,
            generation,
            CacheValue::TransformedProducts(Arc::clone(&products)),
        )
        .await;

        Ok(products)
    }

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Read` once every retry has failed.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        debug!("Cache miss for categories");
        let generation = self.inner.generations.current(CacheKey::Categories);
        let store = &self.inner.store;
        let categories = Arc::new(
            self.read_with_retry(ReadOperation::Categories, move || store.select_categories())
                .await?,
        );

        self.store_if_current(
            CacheKey::Categories,
            generation,
            CacheValue::Categories(Arc::clone(&categories)),
        )
        .await;

        Ok(categories)
    }

    /// Look up the admin credential row for `email`.
    ///
    /// Not cached and tried once: a login answers immediately.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Read` if the lookup fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn find_admin_user(&self, email: &Email) -> Result<Option<AdminCredential>> {
        self.inner
            .store
            .find_admin_user(email)
            .await
            .map_err(|e| {
                error!(error = %e, "Admin user lookup failed");
                CatalogError::Read {
                    operation: ReadOperation::AdminUser,
                    source: e,
                }
            })
    }

    // =========================================================================
    // Cache Invalidation
    // =========================================================================

    /// Drop one cached read so the next call fetches again.
    ///
    /// Reads already in flight still return their result to their caller but
    /// do not cache it.
    pub async fn invalidate(&self, key: CacheKey) {
        self.inner.generations.bump(key);
        self.inner.cache.invalidate(&key).await;
    }

    /// Cache a fetched value unless `key` was invalidated since `generation`.
    async fn store_if_current(&self, key: CacheKey, generation: u64, value: CacheValue) {
        let generations = &self.inner.generations;
        if generations.current(key) != generation {
            debug!(?key, "Invalidated during fetch, not caching");
            return;
        }

        self.inner.cache.insert(key, value).await;

        // An invalidation may land between the check and the insert
        if generations.current(key) != generation {
            debug!(?key, "Invalidated during insert, dropping entry");
            self.inner.cache.invalidate(&key).await;
        }
    }

    async fn invalidate_products(&self) {
        for key in CacheKey::PRODUCT_KEYS {
            self.invalidate(key).await;
        }
    }

    /// Drop every cached read.
    pub async fn invalidate_all(&self) {
        for key in CacheKey::ALL {
            self.inner.generations.bump(key);
        }
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Product Mutations
    // =========================================================================

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Write` if the backend rejects the insert.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        let created = self
            .inner
            .store
            .insert_product(product)
            .await
            .map_err(|e| write_error(WriteAction::CreateProduct, e))?;

        self.invalidate_products().await;
        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    /// Apply a partial update, stamping `updated_at` with the current time.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Write` if the backend rejects the update.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update_product(&self, id: &ProductId, update: ProductUpdate) -> Result<Product> {
        let update = ProductUpdate {
            updated_at: Some(Utc::now()),
            ..update
        };

        let updated = self
            .inner
            .store
            .update_product(id, &update)
            .await
            .map_err(|e| write_error(WriteAction::UpdateProduct, e))?;

        self.invalidate_products().await;
        info!("Product updated");
        Ok(updated)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Write` if the backend rejects the delete.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<()> {
        self.inner
            .store
            .delete_product(id)
            .await
            .map_err(|e| write_error(WriteAction::DeleteProduct, e))?;

        self.invalidate_products().await;
        info!("Product deleted");
        Ok(())
    }

    // =========================================================================
    // Category Mutations
    // =========================================================================

    /// Insert a category. Name and icon are trimmed first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Write` if the backend rejects the insert.
    #[instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let created = self
            .inner
            .store
            .insert_category(&category.trimmed())
            .await
            .map_err(|e| write_error(WriteAction::CreateCategory, e))?;

        self.invalidate(CacheKey::Categories).await;
        info!(category_id = %created.id, "Category created");
        Ok(created)
    }

    /// Replace a category's name and icon, trimmed first.
    ///
    /// Products embed the category name, so their cache is dropped too.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Write` if the backend rejects the update.
    #[instrument(skip(self, update), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: &CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category> {
        let updated = self
            .inner
            .store
            .update_category(id, &update.trimmed())
            .await
            .map_err(|e| write_error(WriteAction::UpdateCategory, e))?;

        self.invalidate(CacheKey::Categories).await;
        self.invalidate_products().await;
        info!("Category updated");
        Ok(updated)
    }

    /// Delete a category and, through the backend cascade, its products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Write` if the backend rejects the delete.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: &CategoryId) -> Result<()> {
        self.inner
            .store
            .delete_category(id)
            .await
            .map_err(|e| write_error(WriteAction::DeleteCategory, e))?;

        self.invalidate(CacheKey::Categories).await;
        self.invalidate_products().await;
        info!("Category deleted");
        Ok(())
    }

    // =========================================================================
    // Image Uploads
    // =========================================================================

    /// Upload a product image and return its public URL.
    ///
    /// Nothing is cleaned up if the product write that follows fails.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Write` if the upload fails.
    pub async fn upload_product_image(
        &self,
        upload: ImageUpload,
        owner: impl Into<ImageOwner>,
    ) -> Result<String> {
        self.upload(
            Bucket::ProductImages,
            WriteAction::UploadProductImage,
            upload,
            &owner.into(),
        )
        .await
    }

    /// Upload a category icon image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Write` if the upload fails.
    pub async fn upload_category_image(
        &self,
        upload: ImageUpload,
        owner: impl Into<ImageOwner>,
    ) -> Result<String> {
        self.upload(
            Bucket::CategoryImages,
            WriteAction::UploadCategoryImage,
            upload,
            &owner.into(),
        )
        .await
    }

    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    async fn upload(
        &self,
        bucket: Bucket,
        action: WriteAction,
        upload: ImageUpload,
        owner: &ImageOwner,
    ) -> Result<String> {
        let key = storage_key(owner, &upload.file_name, Utc::now());

        let url = self
            .inner
            .store
            .upload_object(bucket, &key, upload.bytes, &upload.content_type)
            .await
            .map_err(|e| write_error(action, e))?;

        info!(%bucket, %key, "Image uploaded");
        Ok(url)
    }
}

fn write_error(action: WriteAction, source: RemoteError) -> CatalogError {
    error!(%action, error = %source, "Write failed");
    CatalogError::Write { action, source }
}
