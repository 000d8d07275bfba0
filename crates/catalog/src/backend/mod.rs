//! Remote data client seam.
//!
//! The catalog only needs a minimal contract from its backend: list rows of
//! the two entity tables (products joined with their category), insert,
//! update and delete rows by id, look up an admin user by email, and store
//! binary objects behind a public URL.
//!
//! # Implementations
//!
//! - [`RestStore`] - hosted PostgREST-style API over `reqwest`
//! - [`MemoryStore`] - in-process tables, used by tests and demos

mod memory;
mod rest;

pub use memory::{MemoryStore, StoredObject};
pub use rest::RestStore;

use core::fmt;

use async_trait::async_trait;
use thiserror::Error;

use toppers_core::{CategoryId, Email, ProductId};

use crate::models::{
    AdminCredential, Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductUpdate,
};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Row not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Local failure inside the store implementation.
    #[error("store error: {0}")]
    Storage(String),
}

/// Object storage buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    ProductImages,
    CategoryImages,
}

impl Bucket {
    /// Bucket name on the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductImages => "product-images",
            Self::CategoryImages => "category-images",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row CRUD plus object storage, as offered by the hosted backend.
///
/// Read ordering is part of the contract: products newest first by
/// `created_at`, categories by name ascending.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All products with their `categories(name, icon)` relation joined.
    async fn select_products(&self) -> Result<Vec<Product>, RemoteError>;

    /// All categories.
    async fn select_categories(&self) -> Result<Vec<Category>, RemoteError>;

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, RemoteError>;

    async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RemoteError>;

    async fn delete_product(&self, id: &ProductId) -> Result<(), RemoteError>;

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, RemoteError>;

    async fn update_category(
        &self,
        id: &CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, RemoteError>;

    /// Delete a category. The backend cascades the delete to its products.
    async fn delete_category(&self, id: &CategoryId) -> Result<(), RemoteError>;

    /// Look up an admin user row by email.
    async fn find_admin_user(&self, email: &Email) -> Result<Option<AdminCredential>, RemoteError>;

    /// Store an object and return its public URL.
    async fn upload_object(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError>;
}
