//! In-process backend.
//!
//! Mirrors the hosted backend's observable behavior: generated UUID ids,
//! server-side timestamps, the category join on product reads, read
//! ordering, foreign-key checks on product writes and the cascading delete
//! from categories to products.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use toppers_core::{CategoryId, Email, ProductId};

use super::{Bucket, RemoteError, RemoteStore};
use crate::models::{
    AdminCredential, Category, CategorySummary, CategoryUpdate, NewCategory, NewProduct, Product,
    ProductUpdate,
};

/// Base used to build public URLs for stored objects.
const DEFAULT_PUBLIC_BASE: &str = "memory://objects";

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Tables held by a [`MemoryStore`].
#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    categories: Vec<Category>,
    admins: Vec<AdminCredential>,
    objects: HashMap<(Bucket, String), StoredObject>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps so ordering by creation time is stable.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn category_exists(&self, id: &CategoryId) -> bool {
        self.categories.iter().any(|c| &c.id == id)
    }

    fn joined(&self, product: &Product) -> Product {
        let mut product = product.clone();
        product.category = self
            .categories
            .iter()
            .find(|c| c.id == product.category_id)
            .map(|c| CategorySummary {
                name: c.name.clone(),
                icon: c.icon.clone(),
            });
        product
    }
}

/// Backend kept entirely in memory. Clones share the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    public_base: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            public_base: DEFAULT_PUBLIC_BASE.to_owned(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RemoteError> {
        self.tables
            .read()
            .map_err(|_| RemoteError::Storage("lock poisoned: read".to_owned()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RemoteError> {
        self.tables
            .write()
            .map_err(|_| RemoteError::Storage("lock poisoned: write".to_owned()))
    }

    /// Insert a category row as-is.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Storage` if the table lock is poisoned.
    pub fn seed_category(&self, category: Category) -> Result<(), RemoteError> {
        self.write()?.categories.push(category);
        Ok(())
    }

    /// Insert a product row as-is. The category join is resolved on read.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Storage` if the table lock is poisoned.
    pub fn seed_product(&self, mut product: Product) -> Result<(), RemoteError> {
        product.category = None;
        self.write()?.products.push(product);
        Ok(())
    }

    /// Insert an admin user row.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Storage` if the table lock is poisoned.
    pub fn seed_admin(&self, admin: AdminCredential) -> Result<(), RemoteError> {
        self.write()?.admins.push(admin);
        Ok(())
    }

    /// Fetch a stored object.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Storage` if the table lock is poisoned.
    pub fn object(&self, bucket: Bucket, key: &str) -> Result<Option<StoredObject>, RemoteError> {
        Ok(self.read()?.objects.get(&(bucket, key.to_owned())).cloned())
    }

    /// Number of stored objects across all buckets.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Storage` if the table lock is poisoned.
    pub fn object_count(&self) -> Result<usize, RemoteError> {
        Ok(self.read()?.objects.len())
    }
}

fn foreign_key_violation(id: &CategoryId) -> RemoteError {
    RemoteError::Status {
        status: 409,
        body: format!("insert or update on table \"products\" violates foreign key: category {id}"),
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select_products(&self) -> Result<Vec<Product>, RemoteError> {
        let tables = self.read()?;
        let mut products: Vec<Product> = tables.products.iter().map(|p| tables.joined(p)).collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn select_categories(&self) -> Result<Vec<Category>, RemoteError> {
        let mut categories = self.read()?.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RemoteError> {
        let mut tables = self.write()?;
        if !tables.category_exists(&product.category_id) {
            return Err(foreign_key_violation(&product.category_id));
        }

        let now = tables.next_timestamp();
        let row = Product {
            id: ProductId::new(Uuid::new_v4().to_string()),
            name: product.name.clone(),
            description: product.description.clone(),
            category_id: product.category_id.clone(),
            material: product.material.clone(),
            occasion: product.occasion.clone(),
            theme: product.theme.clone(),
            image_url: product.image_url.clone(),
            featured: product.featured,
            created_at: now,
            updated_at: now,
            category: None,
        };
        tables.products.push(row.clone());
        Ok(row)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RemoteError> {
        let mut tables = self.write()?;
        if let Some(category_id) = &update.category_id
            && !tables.category_exists(category_id)
        {
            return Err(foreign_key_violation(category_id));
        }

        let now = tables.next_timestamp();
        let row = tables
            .products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("product {id}")))?;

        if let Some(name) = &update.name {
            row.name.clone_from(name);
        }
        if let Some(description) = &update.description {
            row.description.clone_from(description);
        }
        if let Some(category_id) = &update.category_id {
            row.category_id = category_id.clone();
        }
        if let Some(material) = &update.material {
            row.material.clone_from(material);
        }
        if let Some(occasion) = &update.occasion {
            row.occasion.clone_from(occasion);
        }
        if let Some(theme) = &update.theme {
            row.theme.clone_from(theme);
        }
        if let Some(image_url) = &update.image_url {
            row.image_url = Some(image_url.clone());
        }
        if let Some(featured) = update.featured {
            row.featured = featured;
        }
        row.updated_at = update.updated_at.unwrap_or(now);

        Ok(row.clone())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), RemoteError> {
        // Deleting a missing row is not an error, same as the hosted API
        self.write()?.products.retain(|p| &p.id != id);
        Ok(())
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, RemoteError> {
        let mut tables = self.write()?;
        let row = Category {
            id: CategoryId::new(Uuid::new_v4().to_string()),
            name: category.name.clone(),
            icon: category.icon.clone(),
            created_at: tables.next_timestamp(),
        };
        tables.categories.push(row.clone());
        Ok(row)
    }

    async fn update_category(
        &self,
        id: &CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, RemoteError> {
        let mut tables = self.write()?;
        let row = tables
            .categories
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("category {id}")))?;
        row.name.clone_from(&update.name);
        row.icon.clone_from(&update.icon);
        Ok(row.clone())
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<(), RemoteError> {
        let mut tables = self.write()?;
        tables.categories.retain(|c| &c.id != id);
        tables.products.retain(|p| &p.category_id != id);
        Ok(())
    }

    async fn find_admin_user(&self, email: &Email) -> Result<Option<AdminCredential>, RemoteError> {
        Ok(self
            .read()?
            .admins
            .iter()
            .find(|a| &a.user.email == email)
            .cloned())
    }

    async fn upload_object(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        let mut tables = self.write()?;
        let slot = (bucket, key.to_owned());
        if tables.objects.contains_key(&slot) {
            return Err(RemoteError::Status {
                status: 409,
                body: format!("object {bucket}/{key} already exists"),
            });
        }
        tables.objects.insert(
            slot,
            StoredObject {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(format!("{}/{bucket}/{key}", self.public_base))
    }
}
