//! Cache types for catalog reads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::{Category, Product};
use crate::transform::TransformedProduct;

/// One cache entry per read operation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    TransformedProducts,
    Categories,
}

impl CacheKey {
    pub const ALL: [Self; 3] = [Self::Products, Self::TransformedProducts, Self::Categories];

    /// Keys holding product data, dropped together on any product change.
    pub const PRODUCT_KEYS: [Self; 2] = [Self::Products, Self::TransformedProducts];
}

/// Cached value types.
///
/// Lists are shared behind `Arc` so every hit hands out the same allocation
/// until the entry is invalidated.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    TransformedProducts(Arc<Vec<TransformedProduct>>),
    Categories(Arc<Vec<Category>>),
}

/// Invalidation counters, one per key.
///
/// A read notes the generation before fetching and only keeps its result
/// while the generation is unchanged, so a fetch that overlaps a mutation
/// never repopulates the cache with pre-mutation data.
#[derive(Debug, Default)]
pub struct Generations {
    products: AtomicU64,
    transformed_products: AtomicU64,
    categories: AtomicU64,
}

impl Generations {
    const fn counter(&self, key: CacheKey) -> &AtomicU64 {
        match key {
            CacheKey::Products => &self.products,
            CacheKey::TransformedProducts => &self.transformed_products,
            CacheKey::Categories => &self.categories,
        }
    }

    #[must_use]
    pub fn current(&self, key: CacheKey) -> u64 {
        self.counter(key).load(Ordering::SeqCst)
    }

    pub fn bump(&self, key: CacheKey) {
        self.counter(key).fetch_add(1, Ordering::SeqCst);
    }
}
