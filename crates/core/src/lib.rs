//! Toppers Core - Shared domain types.
//!
//! Types used by every Toppers component:
//! - `catalog` - Client-side data layer (queries, filtering, favorites, session)
//! - `cli` - Command-line front end for browsing and administering the catalog
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email addresses and category icons

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
