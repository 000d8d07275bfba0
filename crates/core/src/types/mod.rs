//! Core types for the Toppers catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod icon;
pub mod id;

pub use email::{Email, EmailError};
pub use icon::CategoryIcon;
pub use id::*;
