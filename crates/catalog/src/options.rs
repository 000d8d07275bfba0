//! Distinct filter values derived from the loaded products.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::search::{FilterDimension, Searchable};

/// Values offered by the material, occasion and theme filters.
///
/// Each list is deduplicated and sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub materials: Vec<String>,
    pub occasions: Vec<String>,
    pub themes: Vec<String>,
}

impl FilterOptions {
    /// Collect the options offered by a product list.
    #[must_use]
    pub fn derive<T: Searchable>(products: &[T]) -> Self {
        let collect = |dimension: FilterDimension| -> Vec<String> {
            products
                .iter()
                .map(|p| dimension.value_of(p))
                .collect::<BTreeSet<&str>>()
                .into_iter()
                .map(str::to_owned)
                .collect()
        };

        Self {
            materials: collect(FilterDimension::Material),
            occasions: collect(FilterDimension::Occasion),
            themes: collect(FilterDimension::Theme),
        }
    }

    /// Options of one dimension.
    #[must_use]
    pub fn values(&self, dimension: FilterDimension) -> &[String] {
        match dimension {
            FilterDimension::Material => &self.materials,
            FilterDimension::Occasion => &self.occasions,
            FilterDimension::Theme => &self.themes,
        }
    }

    /// Whether no dimension offers a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty() && self.occasions.is_empty() && self.themes.is_empty()
    }
}

/// Recomputes [`FilterOptions`] only when the product list changes.
///
/// The list is identified by its `Arc` allocation, the same handle the query
/// cache returns, so repeated reads served from the cache reuse the result.
#[derive(Debug)]
pub struct FilterOptionsMemo<T> {
    last: Option<(Arc<Vec<T>>, FilterOptions)>,
}

impl<T> Default for FilterOptionsMemo<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: Searchable> FilterOptionsMemo<T> {
    /// Options for `products`, derived again only for a new list.
    pub fn get(&mut self, products: &Arc<Vec<T>>) -> &FilterOptions {
        let stale = self
            .last
            .as_ref()
            .is_none_or(|(source, _)| !Arc::ptr_eq(source, products));

        if stale {
            self.last = None;
        }

        let (_, options) = self
            .last
            .get_or_insert_with(|| (Arc::clone(products), FilterOptions::derive(products)));
        options
    }

    /// Whether `products` is the list the cached options came from.
    #[must_use]
    pub fn is_current(&self, products: &Arc<Vec<T>>) -> bool {
        self.last
            .as_ref()
            .is_some_and(|(source, _)| Arc::ptr_eq(source, products))
    }
}
