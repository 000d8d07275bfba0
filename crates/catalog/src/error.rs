//! Catalog error taxonomy.
//!
//! Remote failures are split by direction: a failed read is reported after
//! its retries are exhausted, a failed write immediately. Both carry the
//! remote detail for logs, while [`CatalogError::user_message`] returns the
//! generic text shown to users.

use core::fmt;

use thiserror::Error;

use crate::backend::RemoteError;
use crate::storage::StorageError;
use crate::validation::ValidationErrors;

/// Read operations issued against the hosted backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOperation {
    Products,
    Categories,
    AdminUser,
}

impl ReadOperation {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::AdminUser => "admin user",
        }
    }
}

impl fmt::Display for ReadOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write operations issued against the hosted backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    UploadProductImage,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    UploadCategoryImage,
}

impl WriteAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::CreateProduct => "create product",
            Self::UpdateProduct => "update product",
            Self::DeleteProduct => "delete product",
            Self::UploadProductImage => "upload product image",
            Self::CreateCategory => "create category",
            Self::UpdateCategory => "update category",
            Self::DeleteCategory => "delete category",
            Self::UploadCategoryImage => "upload category image",
        }
    }
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the catalog data layer.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A read kept failing after every retry.
    #[error("failed to load {operation}: {source}")]
    Read {
        operation: ReadOperation,
        #[source]
        source: RemoteError,
    },

    /// A write failed. Writes are never retried.
    #[error("failed to {action}: {source}")]
    Write {
        action: WriteAction,
        #[source]
        source: RemoteError,
    },

    /// Input rejected before reaching the backend.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// An admin-only action was attempted without an active session.
    #[error("admin session required")]
    Unauthorized,

    /// Local storage could not be written.
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CatalogError {
    /// Generic message for display. Remote details are never included.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Read { operation, .. } => format!("Could not load {operation}"),
            Self::Write { action, .. } => format!("Failed to {action}"),
            Self::Validation(errors) => errors.to_string(),
            Self::Unauthorized => "Please sign in as an administrator".to_owned(),
            Self::Storage(_) => "Could not save local data".to_owned(),
        }
    }

    /// Whether this error came from a read.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    /// Whether this error came from a write.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

/// Result type alias for `CatalogError`.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_remote_detail() {
        let err = CatalogError::Write {
            action: WriteAction::DeleteCategory,
            source: RemoteError::Status {
                status: 500,
                body: "internal: relation \"categories\" is locked".to_owned(),
            },
        };
        assert_eq!(err.user_message(), "Failed to delete category");
        assert!(err.to_string().contains("locked"));
        assert!(err.is_write());

        let err = CatalogError::Read {
            operation: ReadOperation::Products,
            source: RemoteError::NotFound("products".to_owned()),
        };
        assert_eq!(err.user_message(), "Could not load products");
        assert!(err.is_read());
    }
}
