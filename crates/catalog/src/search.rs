//! Client-side search and multi-select filtering.
//!
//! Filtering runs over the list already loaded in memory. A product matches
//! when every active criterion matches:
//!
//! - the lower-cased search term is a substring of the lower-cased name or
//!   description (an empty term matches everything)
//! - the selected category is [`CategorySelection::All`] or equals the
//!   product's category id
//! - for each of material, occasion and theme, the selected set is empty or
//!   contains the product's single value for that dimension

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use toppers_core::{CategoryId, ProductId};

use crate::models::Product;
use crate::transform::TransformedProduct;

/// Anything that can be searched and filtered like a product.
pub trait Searchable {
    fn id(&self) -> &ProductId;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn category_id(&self) -> &CategoryId;
    fn material(&self) -> &str;
    fn occasion(&self) -> &str;
    fn theme(&self) -> &str;
    fn featured(&self) -> bool;
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_searchable {
    ($ty:ty) => {
        impl Searchable for $ty {
            fn id(&self) -> &ProductId {
                &self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn description(&self) -> &str {
                &self.description
            }
            fn category_id(&self) -> &CategoryId {
                &self.category_id
            }
            fn material(&self) -> &str {
                &self.material
            }
            fn occasion(&self) -> &str {
                &self.occasion
            }
            fn theme(&self) -> &str {
                &self.theme
            }
            fn featured(&self) -> bool {
                self.featured
            }
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

impl_searchable!(Product);
impl_searchable!(TransformedProduct);

/// The three multi-select filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    Material,
    Occasion,
    Theme,
}

impl FilterDimension {
    /// All dimensions, in display order.
    pub const ALL: [Self; 3] = [Self::Material, Self::Occasion, Self::Theme];

    /// The product's value for this dimension.
    #[must_use]
    pub fn value_of<T: Searchable + ?Sized>(self, product: &T) -> &str {
        match self {
            Self::Material => product.material(),
            Self::Occasion => product.occasion(),
            Self::Theme => product.theme(),
        }
    }
}

/// Category part of a filter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CategorySelection {
    /// No category restriction (the `"all"` sentinel).
    #[default]
    All,
    /// Only products of this category, compared by identifier.
    Only(CategoryId),
}

impl CategorySelection {
    /// Sentinel string for [`CategorySelection::All`].
    pub const ALL_SENTINEL: &'static str = "all";

    /// Whether a product's category is selected.
    #[must_use]
    pub fn matches(&self, category_id: &CategoryId) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == category_id,
        }
    }
}

impl FromStr for CategorySelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == Self::ALL_SENTINEL {
            Ok(Self::All)
        } else {
            Ok(Self::Only(CategoryId::new(s)))
        }
    }
}

/// Current search term, category and multi-select values.
///
/// In-memory only; nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: String,
    pub category: CategorySelection,
    pub materials: BTreeSet<String>,
    pub occasions: BTreeSet<String>,
    pub themes: BTreeSet<String>,
}

impl ProductFilter {
    /// Builder: set the search term.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    /// Builder: set the category selection.
    #[must_use]
    pub fn with_category(mut self, category: CategorySelection) -> Self {
        self.category = category;
        self
    }

    /// Builder: add a value to one dimension.
    #[must_use]
    pub fn with_value(mut self, dimension: FilterDimension, value: impl Into<String>) -> Self {
        self.selected_mut(dimension).insert(value.into());
        self
    }

    /// Selected values of one dimension.
    #[must_use]
    pub const fn selected(&self, dimension: FilterDimension) -> &BTreeSet<String> {
        match dimension {
            FilterDimension::Material => &self.materials,
            FilterDimension::Occasion => &self.occasions,
            FilterDimension::Theme => &self.themes,
        }
    }

    fn selected_mut(&mut self, dimension: FilterDimension) -> &mut BTreeSet<String> {
        match dimension {
            FilterDimension::Material => &mut self.materials,
            FilterDimension::Occasion => &mut self.occasions,
            FilterDimension::Theme => &mut self.themes,
        }
    }

    /// Add the value if absent, remove it if present.
    ///
    /// Returns whether the value is selected afterwards.
    pub fn toggle(&mut self, dimension: FilterDimension, value: &str) -> bool {
        let selected = self.selected_mut(dimension);
        if selected.remove(value) {
            false
        } else {
            selected.insert(value.to_owned());
            true
        }
    }

    /// Drop every multi-select value. Search term and category are kept.
    pub fn clear_values(&mut self) {
        self.materials.clear();
        self.occasions.clear();
        self.themes.clear();
    }

    /// Reset to the match-everything selection.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of selected multi-select values across all dimensions.
    #[must_use]
    pub fn active_value_count(&self) -> usize {
        self.materials.len() + self.occasions.len() + self.themes.len()
    }

    /// Whether any criterion narrows the list.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || self.category != CategorySelection::All
            || self.active_value_count() > 0
    }

    /// Whether one product passes the filter.
    #[must_use]
    pub fn matches<T: Searchable + ?Sized>(&self, product: &T) -> bool {
        self.matches_with_term(product, &self.search.to_lowercase())
    }

    fn matches_with_term<T: Searchable + ?Sized>(&self, product: &T, term: &str) -> bool {
        let text = term.is_empty()
            || product.name().to_lowercase().contains(term)
            || product.description().to_lowercase().contains(term);

        text && self.category.matches(product.category_id())
            && FilterDimension::ALL.iter().all(|&dimension| {
                let selected = self.selected(dimension);
                selected.is_empty() || selected.contains(dimension.value_of(product))
            })
    }

    /// Products passing the filter, in input order.
    #[must_use]
    pub fn apply<'a, T: Searchable>(&self, products: &'a [T]) -> Vec<&'a T> {
        let term = self.search.to_lowercase();
        products
            .iter()
            .filter(|p| self.matches_with_term(*p, &term))
            .collect()
    }
}
