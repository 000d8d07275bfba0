//! Toppers Catalog - client-side data layer.
//!
//! Everything the storefront and the admin console need between the hosted
//! backend and the screen:
//!
//! - [`query`] - cached product/category reads with retry, mutations that
//!   invalidate the cache, and image uploads
//! - [`transform`] - flattened display projection of product rows
//! - [`options`] - distinct filter values derived from the loaded products
//! - [`search`] - in-memory search and multi-select filtering
//! - [`favorites`] / [`session`] - state persisted to local storage
//!
//! # Example
//!
//! ```rust,ignore
//! use toppers_catalog::{CatalogClient, backend::RestStore, search::ProductFilter};
//!
//! let store = RestStore::new(&config.backend);
//! let client = CatalogClient::new(store, config.query.clone(), &config.placeholder_image);
//!
//! let products = client.transformed_products().await?;
//! let filter = ProductFilter::default().with_search("topo");
//! for product in filter.apply(&products) {
//!     tracing::info!(name = %product.name, "match");
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod options;
pub mod query;
pub mod search;
pub mod session;
pub mod showcase;
pub mod storage;
pub mod transform;
pub mod validation;

pub use error::{CatalogError, ReadOperation, WriteAction};
pub use query::CatalogClient;
