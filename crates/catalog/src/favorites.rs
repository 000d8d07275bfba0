//! Favorite products, persisted to local storage.
//!
//! The set is read once when the store is loaded and written back in full
//! after every change. Unreadable stored data is discarded and the set
//! starts empty.

use std::collections::HashSet;

use tracing::{debug, warn};

use toppers_core::ProductId;

use crate::storage::{LocalStorage, StorageError};

/// Storage key holding the JSON array of favorite product ids.
pub const FAVORITES_KEY: &str = "cake-toppers-favorites";

/// The favorites set, in the order ids were added.
#[derive(Debug)]
pub struct FavoritesStore<S> {
    storage: S,
    ids: Vec<ProductId>,
}

impl<S: LocalStorage> FavoritesStore<S> {
    /// Read the persisted favorites.
    ///
    /// Missing or corrupt data yields an empty set. Duplicate ids are dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the storage backend itself fails.
    pub fn load(storage: S) -> Result<Self, StorageError> {
        let ids = match storage.get(FAVORITES_KEY)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<ProductId>>(&raw) {
                Ok(ids) => dedupe(ids),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable favorites");
                    Vec::new()
                }
            },
        };

        debug!(count = ids.len(), "Favorites loaded");
        Ok(Self { storage, ids })
    }

    fn persist(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.ids)?;
        self.storage.set(FAVORITES_KEY, &raw)
    }

    /// Whether `id` is a favorite.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.ids.contains(id)
    }

    /// Favorite ids, oldest first.
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add `id` if absent, remove it if present, then persist.
    ///
    /// Returns whether `id` is a favorite afterwards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new set cannot be written. The in-memory
    /// set keeps the change.
    pub fn toggle(&mut self, id: &ProductId) -> Result<bool, StorageError> {
        let added = if let Some(pos) = self.ids.iter().position(|f| f == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.clone());
            true
        };

        self.persist()?;
        debug!(product_id = %id, added, "Favorite toggled");
        Ok(added)
    }

    /// Remove `id` if present, then persist.
    ///
    /// Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new set cannot be written.
    pub fn remove(&mut self, id: &ProductId) -> Result<bool, StorageError> {
        let before = self.ids.len();
        self.ids.retain(|f| f != id);
        let removed = self.ids.len() != before;
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Remove every favorite, then persist the empty set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the empty set cannot be written.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.ids.clear();
        self.persist()
    }
}

fn dedupe(ids: Vec<ProductId>) -> Vec<ProductId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
